//! Ready-made update handler for releases published as [`AppDetail`] payloads.

use std::path::PathBuf;

use anyhow::{Context, bail};

use crate::artifact::{
    ExtractOptions, download_client, download_verified_to, extract_archive_file,
};
use crate::config::{DownloadConfig, staging_dir};
use crate::update::controller::UpdateController;
use crate::update::handler::UpdateHandler;
use crate::version::types::{AppDetail, VersionDescriptor};

/// Downloads the release archive named in the payload, verifies it and
/// unpacks it into the install directory.
///
/// Archives are staged as `<staging_dir>/<file_hash>.tar.gz` and removed
/// after extraction.
pub struct ReleaseInstaller {
    client: reqwest::Client,
    install_dir: PathBuf,
    staging_dir: PathBuf,
    strip_top_level: bool,
}

impl ReleaseInstaller {
    pub fn new(install_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        Self::from_config(install_dir, &DownloadConfig::default())
    }

    pub fn from_config(
        install_dir: impl Into<PathBuf>,
        config: &DownloadConfig,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: download_client(config.timeout())?,
            install_dir: install_dir.into(),
            staging_dir: staging_dir(),
            strip_top_level: false,
        })
    }

    pub fn with_staging_dir(mut self, staging_dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = staging_dir.into();
        self
    }

    /// Drop the archive's top-level wrapper directory when extracting
    pub fn strip_top_level(mut self, strip: bool) -> Self {
        self.strip_top_level = strip;
        self
    }
}

#[async_trait::async_trait]
impl UpdateHandler for ReleaseInstaller {
    async fn apply(
        &self,
        controller: &UpdateController,
        descriptor: &VersionDescriptor,
    ) -> anyhow::Result<()> {
        let detail: AppDetail = descriptor
            .decode_payload()
            .context("failed to decode release payload")?;

        let valid_hash = detail.file_hash.len() == 64
            && detail.file_hash.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid_hash {
            bail!("release payload has invalid file_hash {:?}", detail.file_hash);
        }

        let archive_path = self
            .staging_dir
            .join(format!("{}.tar.gz", detail.file_hash.to_ascii_lowercase()));

        controller.log(&format!(
            "downloading version {} from {}",
            descriptor.version, detail.download_url
        ));
        download_verified_to(
            &self.client,
            &detail.download_url,
            &detail.file_hash,
            &archive_path,
        )
        .await?;

        controller.log(&format!("extracting into {}", self.install_dir.display()));
        let install_dir = self.install_dir.clone();
        let options = ExtractOptions {
            strip_top_level: self.strip_top_level,
            delete_archive: true,
        };
        tokio::task::spawn_blocking(move || {
            extract_archive_file(&archive_path, &install_dir, &options)
        })
        .await
        .context("extraction task failed")??;

        controller.log(&format!("installed version {}", descriptor.version));
        Ok(())
    }
}
