use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Registry and scheduling constants
// =============================================================================

/// Default base URL of the version registry service
pub const DEFAULT_REGISTRY_URL: &str = "http://api.package.coreservice.io:8080";

/// Timeout for registry fetches in seconds
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Timeout for artifact downloads in seconds (10 minutes)
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// Default auto-update interval in seconds (1 day)
pub const DEFAULT_AUTO_UPDATE_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Polling tick of the auto-update loop in seconds; also the lower bound
pub const AUTO_UPDATE_POLL_SECS: u64 = 3;

/// Interval between background cache sweeps in seconds (2 minutes)
pub const CACHE_REFRESH_INTERVAL_SECS: u64 = 120;

/// Delay between starting each fetch of a sweep to avoid rate limiting (10ms)
pub const FETCH_STAGGER_DELAY_MS: u64 = 10;

/// Top-level client configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub registry: RegistryConfig,
    pub cache: CacheConfig,
    pub auto_update: AutoUpdateConfig,
    pub download: DownloadConfig,
}

/// Version registry endpoint configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REGISTRY_URL.to_string(),
            timeout_secs: FETCH_TIMEOUT_SECS,
        }
    }
}

/// Version cache configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Background sweep interval in seconds
    pub refresh_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: CACHE_REFRESH_INTERVAL_SECS,
        }
    }
}

impl CacheConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// Auto-update loop configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoUpdateConfig {
    pub interval_secs: u64,
    pub poll_interval_secs: u64,
    /// Adopt the refresh interval suggested by the registry on every check
    pub sync_interval_from_registry: bool,
}

impl Default for AutoUpdateConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_AUTO_UPDATE_INTERVAL_SECS,
            poll_interval_secs: AUTO_UPDATE_POLL_SECS,
            sync_interval_from_registry: false,
        }
    }
}

impl AutoUpdateConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Poll interval, never shorter than [`AUTO_UPDATE_POLL_SECS`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(AUTO_UPDATE_POLL_SECS))
    }
}

/// Artifact download configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DownloadConfig {
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Returns the path to the data directory for package-client.
/// Uses $XDG_DATA_HOME/package-client if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/package-client,
/// or ./package-client if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the directory where downloaded archives are staged before extraction.
pub fn staging_dir() -> PathBuf {
    data_dir().join("staging")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("package-client")
}
