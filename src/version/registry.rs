//! Registry trait for fetching version descriptors from the remote service

#[cfg(test)]
use mockall::automock;
use serde::de::DeserializeOwned;

use crate::version::error::{RegistryError, VersionFormatError};
use crate::version::semver::parse_version;
use crate::version::types::VersionDescriptor;

/// Trait for fetching the current version descriptor of a package
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionRegistry: Send + Sync {
    /// Fetches the current descriptor for a package
    ///
    /// # Arguments
    /// * `credential` - Access token, omitted from the request when empty
    /// * `package_id` - Registry id of the package
    ///
    /// # Returns
    /// * `Ok(VersionDescriptor)` - A descriptor that passed [`validate_descriptor`]
    /// * `Err(RegistryError)` - If the fetch or validation fails
    async fn fetch_version(
        &self,
        credential: &str,
        package_id: u64,
    ) -> Result<VersionDescriptor, RegistryError>;
}

/// Reject descriptors the registry reported as failed or whose version fields do not parse.
pub fn validate_descriptor(
    descriptor: VersionDescriptor,
    package_id: u64,
) -> Result<VersionDescriptor, RegistryError> {
    if descriptor.status <= 0 {
        return Err(RegistryError::Rejected {
            package_id,
            message: descriptor.message,
        });
    }

    check_version_field("version", &descriptor.version)?;
    check_version_field("minimum_allow_version", &descriptor.minimum_allow_version)?;

    Ok(descriptor)
}

fn check_version_field(field: &'static str, value: &str) -> Result<(), RegistryError> {
    parse_version(value)
        .map(|_| ())
        .map_err(|source: VersionFormatError| RegistryError::InvalidVersion {
            field,
            value: value.to_string(),
            source,
        })
}

/// Fetch a package's descriptor and decode its payload into `T`.
pub async fn fetch_app_detail<T: DeserializeOwned>(
    registry: &dyn VersionRegistry,
    credential: &str,
    package_id: u64,
) -> Result<T, RegistryError> {
    registry
        .fetch_version(credential, package_id)
        .await?
        .decode_payload()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::types::AppDetail;

    fn descriptor(status: i64, version: &str, minimum: &str) -> VersionDescriptor {
        VersionDescriptor {
            status,
            message: "from registry".to_string(),
            version: version.to_string(),
            minimum_allow_version: minimum.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn validate_descriptor_accepts_well_formed_response() {
        let result = validate_descriptor(descriptor(1, "v1.2.3", "1.0.0"), 7);
        assert!(result.is_ok());
    }

    #[test]
    fn validate_descriptor_rejects_non_positive_status_with_registry_message() {
        let result = validate_descriptor(descriptor(0, "1.2.3", "1.0.0"), 7);

        match result {
            Err(RegistryError::Rejected {
                package_id,
                message,
            }) => {
                assert_eq!(package_id, 7);
                assert_eq!(message, "from registry");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn validate_descriptor_rejects_unparseable_version() {
        let result = validate_descriptor(descriptor(1, "1.2", "1.0.0"), 7);
        assert!(matches!(
            result,
            Err(RegistryError::InvalidVersion {
                field: "version",
                ..
            })
        ));
    }

    #[test]
    fn validate_descriptor_rejects_unparseable_minimum_version() {
        let result = validate_descriptor(descriptor(1, "1.2.3", ""), 7);
        assert!(matches!(
            result,
            Err(RegistryError::InvalidVersion {
                field: "minimum_allow_version",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn fetch_app_detail_decodes_payload_of_fetched_descriptor() {
        let mut registry = MockVersionRegistry::new();
        registry
            .expect_fetch_version()
            .withf(|credential, package_id| credential == "token" && *package_id == 3)
            .times(1)
            .returning(|_, _| {
                Ok(VersionDescriptor {
                    status: 1,
                    version: "1.0.0".to_string(),
                    minimum_allow_version: "1.0.0".to_string(),
                    payload: r#"{"download_url":"http://example.com/a.tar.gz","exe_name":"app"}"#
                        .to_string(),
                    ..Default::default()
                })
            });

        let detail: AppDetail = fetch_app_detail(&registry, "token", 3).await.unwrap();

        assert_eq!(detail.download_url, "http://example.com/a.tar.gz");
        assert_eq!(detail.exe_name, "app");
    }
}
