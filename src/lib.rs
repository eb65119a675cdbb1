//! Client-side auto-update component.
//!
//! Checks a remote version registry for new releases of a package, downloads
//! and verifies release archives, unpacks them and hands control to
//! caller-supplied update logic.
//!
//! - [`version`]: version parsing, registry client and descriptor cache
//! - [`artifact`]: digest, verified download and archive extraction
//! - [`update`]: per-package update controller and release installer
//! - [`task`]: cancellable periodic background task
//! - [`config`]: constants and serde configuration
//! - [`logging`]: tracing subscriber setup

pub mod artifact;
pub mod config;
pub mod logging;
pub mod task;
pub mod update;
pub mod version;

pub use artifact::ArtifactError;
pub use update::{UpdateController, UpdateError, UpdateHandler};
pub use version::cache::VersionCache;
pub use version::registries::PackageServiceRegistry;
pub use version::registry::VersionRegistry;
pub use version::semver::{SemanticVersion, compare_versions, parse_version};
pub use version::types::{AppDetail, VersionDescriptor};
