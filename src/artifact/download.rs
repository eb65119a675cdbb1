use std::path::Path;
use std::time::Duration;

use tracing::info;

use super::ArtifactError;
use super::digest::verify_digest;

/// HTTP client for artifact downloads with an overall request timeout.
pub fn download_client(timeout: Duration) -> Result<reqwest::Client, ArtifactError> {
    reqwest::Client::builder()
        .user_agent("package-client")
        .timeout(timeout)
        .build()
        .map_err(|error| ArtifactError::network("failed to create HTTP client", error))
}

/// Download `url` and verify the body against `expected_hex_digest`.
///
/// Only `200 OK` counts as success. The body is returned only when its
/// SHA-256 matches.
pub async fn download_verified(
    client: &reqwest::Client,
    url: &str,
    expected_hex_digest: &str,
) -> Result<Vec<u8>, ArtifactError> {
    info!("Downloading artifact from {url}");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| ArtifactError::network("download request failed", error))?;

    if response.status() != reqwest::StatusCode::OK {
        return Err(ArtifactError::HttpStatus {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|error| ArtifactError::network("failed to read download body", error))?;

    verify_digest(&body, expected_hex_digest)?;
    info!("Download complete: {} bytes, digest verified", body.len());

    Ok(body.to_vec())
}

/// Like [`download_verified`], then write the verified bytes to `dest`.
///
/// Nothing is written when the download or verification fails.
pub async fn download_verified_to(
    client: &reqwest::Client,
    url: &str,
    expected_hex_digest: &str,
    dest: &Path,
) -> Result<Vec<u8>, ArtifactError> {
    let bytes = download_verified(client, url, expected_hex_digest).await?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|error| {
            ArtifactError::io_with_path("failed to create download directory", parent, &error)
        })?;
    }

    tokio::fs::write(dest, &bytes).await.map_err(|error| {
        ArtifactError::io_with_path("failed to write download file", dest, &error)
    })?;

    Ok(bytes)
}
