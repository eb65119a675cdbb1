//! Tracing setup for applications embedding the client

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "package-client.log";

/// Returns the path of the log file inside `log_dir`.
pub fn log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

/// Install a global subscriber writing to `<log_dir>/package-client.log`.
///
/// `RUST_LOG` takes precedence over `default_filter`. Keep the returned guard
/// alive for as long as logs should be flushed.
pub fn init(log_dir: &Path, default_filter: &str) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("invalid log filter")?;

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn log_path_appends_file_name() {
        assert_eq!(
            log_path(Path::new("/var/log/app")),
            PathBuf::from("/var/log/app/package-client.log")
        );
    }

    #[test]
    fn init_creates_directory_and_rejects_second_subscriber() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("logs");

        let guard = init(&log_dir, "info").unwrap();
        assert!(log_dir.is_dir());

        assert!(init(&log_dir, "info").is_err());
        drop(guard);
    }
}
