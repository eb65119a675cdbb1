//! Package service registry API implementation

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{DEFAULT_REGISTRY_URL, FETCH_TIMEOUT_SECS, RegistryConfig};
use crate::version::error::RegistryError;
use crate::version::registry::{VersionRegistry, validate_descriptor};
use crate::version::types::VersionDescriptor;

/// Registry implementation for the package service `/api/version/<id>` endpoint
pub struct PackageServiceRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl PackageServiceRegistry {
    /// Creates a new PackageServiceRegistry with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(FETCH_TIMEOUT_SECS))
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::with_timeout(&config.url, Duration::from_secs(config.timeout_secs))
    }

    fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("package-client")
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build the version URL, appending the credential only when present
    fn version_url(&self, credential: &str, package_id: u64) -> Result<reqwest::Url, RegistryError> {
        let raw = format!("{}/api/version/{}", self.base_url, package_id);
        let mut url = reqwest::Url::parse(&raw).map_err(|e| RegistryError::InvalidUrl {
            url: raw.clone(),
            details: e.to_string(),
        })?;

        if !credential.is_empty() {
            url.query_pairs_mut().append_pair("token", credential);
        }

        Ok(url)
    }
}

impl Default for PackageServiceRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL)
    }
}

#[async_trait::async_trait]
impl VersionRegistry for PackageServiceRegistry {
    async fn fetch_version(
        &self,
        credential: &str,
        package_id: u64,
    ) -> Result<VersionDescriptor, RegistryError> {
        let url = self.version_url(credential, package_id)?;
        debug!("Fetching version of package {}", package_id);

        let response = self.client.get(url).send().await?;

        let status = response.status();

        if !status.is_success() {
            warn!(
                "package service returned status {} for package {}",
                status, package_id
            );
            return Err(RegistryError::HttpStatus {
                status,
                url: response.url().to_string(),
            });
        }

        let descriptor: VersionDescriptor = response.json().await.map_err(|e| {
            warn!("Failed to parse package service response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        validate_descriptor(descriptor, package_id)
    }
}
