//! Version layer: parsing, registry access and caching
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│    Cache    │     │   Semver    │
//! │  (fetch)    │     │ (in-memory) │     │ (parse/cmp) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ▼
//! ┌─────────────────┐
//! │   Registries    │
//! │(package service)│
//! └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: In-memory descriptor cache with background refresh
//! - [`registry`]: Registry trait and descriptor validation
//! - [`registries`]: Concrete registry implementations
//! - [`error`]: Error types for parsing, registry and cache operations
//! - [`semver`]: `major.minor.patch` parsing and ordering
//! - [`types`]: Registry descriptor and standard payload types

pub mod cache;
pub mod error;
pub mod registries;
pub mod registry;
pub mod semver;
pub mod types;
