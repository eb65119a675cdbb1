use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::version::error::RegistryError;

/// Response of the version registry for one package.
///
/// Missing fields decode to their zero value, so an empty body is rejected
/// by the status check rather than by deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionDescriptor {
    #[serde(rename = "meta_status")]
    pub status: i64,
    #[serde(rename = "meta_message")]
    pub message: String,
    pub version: String,
    /// Package-specific JSON document, opaque to this crate
    #[serde(rename = "content")]
    pub payload: String,
    /// Suggested auto-update interval in seconds
    #[serde(rename = "update_secs")]
    pub update_interval_secs: i64,
    pub minimum_allow_version: String,
}

impl VersionDescriptor {
    /// Deserialize the embedded payload into `T`.
    ///
    /// Does not touch the network and can be called any number of times.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, RegistryError> {
        serde_json::from_str(&self.payload).map_err(RegistryError::InvalidPayload)
    }
}

/// Standard payload shape published for installable releases
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppDetail {
    pub download_url: String,
    /// Lowercase hex SHA-256 of the release archive
    pub file_hash: String,
    pub exe_name: String,
    pub compatible: String,
}
