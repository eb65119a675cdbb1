use std::io::Read;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::EntryType;
use tracing::{debug, warn};

use super::ArtifactError;

/// Extraction settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Drop the first path component of every entry (a wrapper directory
    /// such as `app-1.2.0/`). Entries that consist only of that component
    /// are skipped.
    pub strip_top_level: bool,
    /// Remove the archive file after a successful extraction. Only applies to
    /// [`extract_archive_file`]; a failed removal is logged, not returned.
    pub delete_archive: bool,
}

/// Extract a gzip-compressed tar archive held in memory into `dest`.
///
/// `dest` is created if missing. Directories are created, files are fully
/// overwritten and given the permission bits recorded in the archive
/// (setuid, setgid and sticky are dropped). Entries are processed in archive
/// order.
pub fn extract_archive(
    archive: &[u8],
    dest: &Path,
    options: &ExtractOptions,
) -> Result<(), ArtifactError> {
    std::fs::create_dir_all(dest).map_err(|error| {
        ArtifactError::io_with_path("failed to create extraction directory", dest, &error)
    })?;

    let mut tar_bytes = Vec::new();
    GzDecoder::new(archive)
        .read_to_end(&mut tar_bytes)
        .map_err(|error| ArtifactError::archive("invalid gzip stream", error))?;

    let mut tar = tar::Archive::new(tar_bytes.as_slice());
    let entries = tar
        .entries()
        .map_err(|error| ArtifactError::archive("invalid tar stream", error))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|error| ArtifactError::archive("invalid tar entry", error))?;
        let entry_path = entry
            .path()
            .map_err(|error| ArtifactError::archive("invalid tar entry path", error))?
            .into_owned();

        let Some(relative) = relative_entry_path(&entry_path, options.strip_top_level)? else {
            debug!("Skipping wrapper entry {}", entry_path.display());
            continue;
        };
        let out_path = dest.join(&relative);

        match entry.header().entry_type() {
            EntryType::Directory => {
                std::fs::create_dir_all(&out_path).map_err(|error| {
                    ArtifactError::io_with_path("failed to create directory", &out_path, &error)
                })?;
            }
            EntryType::Regular | EntryType::Continuous => {
                let mode = entry
                    .header()
                    .mode()
                    .map_err(|error| ArtifactError::archive("invalid tar entry mode", error))?;
                let mut content = Vec::new();
                entry
                    .read_to_end(&mut content)
                    .map_err(|error| ArtifactError::archive("truncated tar entry", error))?;
                write_file(&out_path, &content, mode)?;
            }
            EntryType::XGlobalHeader | EntryType::XHeader => {
                debug!("Skipping pax header entry {}", entry_path.display());
            }
            other => {
                return Err(ArtifactError::archive(
                    "unsupported tar entry",
                    format!("{} has type {:?}", entry_path.display(), other),
                ));
            }
        }
    }

    debug!("Extraction complete to {}", dest.display());
    Ok(())
}

/// Read and extract an archive file, optionally deleting it afterwards.
pub fn extract_archive_file(
    archive_path: &Path,
    dest: &Path,
    options: &ExtractOptions,
) -> Result<(), ArtifactError> {
    let archive = std::fs::read(archive_path).map_err(|error| {
        ArtifactError::io_with_path("failed to read archive", archive_path, &error)
    })?;

    extract_archive(&archive, dest, options)?;

    if options.delete_archive {
        if let Err(error) = std::fs::remove_file(archive_path) {
            warn!(
                "Failed to delete archive {}: {}",
                archive_path.display(),
                error
            );
        }
    }

    Ok(())
}

/// Path of an entry relative to the destination.
///
/// Returns `None` for entries removed by `strip_top_level`. Absolute paths
/// and `..` components are rejected.
fn relative_entry_path(
    path: &Path,
    strip_top_level: bool,
) -> Result<Option<PathBuf>, ArtifactError> {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => components.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ArtifactError::archive(
                    "unsafe tar entry path",
                    path.display(),
                ));
            }
        }
    }

    let skip = usize::from(strip_top_level);
    if components.len() <= skip {
        return Ok(None);
    }

    Ok(Some(components[skip..].iter().collect()))
}

fn write_file(path: &Path, content: &[u8], mode: u32) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|error| {
            ArtifactError::io_with_path("failed to create parent directory", parent, &error)
        })?;
    }

    // A previous extraction may have left a read-only file here
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => {
            return Err(ArtifactError::io_with_path(
                "failed to replace existing file",
                path,
                &error,
            ));
        }
    }

    std::fs::write(path, content).map_err(|error| {
        ArtifactError::io_with_path("failed to write extracted file", path, &error)
    })?;

    set_mode(path, mode)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), ArtifactError> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o777)).map_err(
        |error| ArtifactError::io_with_path("failed to set file permissions", path, &error),
    )
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), ArtifactError> {
    Ok(())
}
