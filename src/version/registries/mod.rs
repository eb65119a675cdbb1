//! Registry implementations for fetching version descriptors

pub mod package_service;

pub use package_service::PackageServiceRegistry;
