use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionFormatError {
    #[error("version {input:?} must have exactly 3 components, found {found}")]
    ComponentCount { input: String, found: usize },

    #[error("version {input:?} has non-numeric component {component:?}")]
    InvalidComponent { input: String, component: String },
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid registry URL {url:?}: {details}")]
    InvalidUrl { url: String, details: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Registry rejected package {package_id}: {message}")]
    Rejected { package_id: u64, message: String },

    #[error("Invalid {field} {value:?}: {source}")]
    InvalidVersion {
        field: &'static str,
        value: String,
        #[source]
        source: VersionFormatError,
    },

    #[error("Invalid payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Cache lock poisoned")]
    LockPoisoned,
}
