use thiserror::Error;

use crate::version::error::RegistryError;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("update handler failed: {0:#}")]
    Handler(anyhow::Error),

    #[error("update check panicked: {0}")]
    Panicked(String),

    #[error("auto update is already running for package {0}")]
    AlreadyRunning(u64),

    #[error("no auto update is running for package {0}")]
    NotRunning(u64),
}
