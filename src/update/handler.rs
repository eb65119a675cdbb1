//! Caller-supplied update logic

use crate::update::controller::UpdateController;
use crate::version::types::VersionDescriptor;

/// Installs a release announced by the registry.
///
/// Called by [`UpdateController::update`] when the remote version differs
/// from the local one. Returning `Ok` makes the controller adopt
/// `descriptor.version` as its current version; an error leaves it unchanged.
#[async_trait::async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn apply(
        &self,
        controller: &UpdateController,
        descriptor: &VersionDescriptor,
    ) -> anyhow::Result<()>;
}
