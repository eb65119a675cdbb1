//! Update lifecycle: controller, handler seam and the stock release installer

pub mod controller;
pub mod error;
pub mod handler;
pub mod installer;

pub use controller::{
    LogCallback, LoopErrorCallback, UpdateController, UpdateControllerBuilder, UpdateOutcome,
    UpdatePhase,
};
pub use error::UpdateError;
pub use handler::UpdateHandler;
pub use installer::ReleaseInstaller;
