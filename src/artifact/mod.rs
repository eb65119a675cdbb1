//! Release artifact pipeline: digest, verified download and archive extraction.
//!
//! Release archives are gzip-compressed tar streams whose SHA-256 digest is
//! published by the registry as a lowercase hex string.

mod archive;
mod digest;
mod download;

use std::path::Path;

use thiserror::Error;

pub use archive::{ExtractOptions, extract_archive, extract_archive_file};
pub use digest::{digest, hex_digest, verify_digest};
pub use download::{download_client, download_verified, download_verified_to};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{context}: {source}")]
    Network {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("download of {url} failed with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("digest mismatch: expected {expected}, got {actual}")]
    Integrity { expected: String, actual: String },
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {details}")]
    ArchiveFormat {
        context: &'static str,
        details: String,
    },
}

impl ArtifactError {
    fn network(context: &'static str, source: reqwest::Error) -> Self {
        Self::Network { context, source }
    }

    fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    fn io_with_path(context: &'static str, path: &Path, source: &std::io::Error) -> Self {
        Self::io(
            context,
            std::io::Error::new(source.kind(), format!("{}: {source}", path.display())),
        )
    }

    fn archive(context: &'static str, details: impl ToString) -> Self {
        Self::ArchiveFormat {
            context,
            details: details.to_string(),
        }
    }
}
