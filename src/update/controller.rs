//! Update lifecycle of a single package.
//!
//! An [`UpdateController`] checks the registry on demand ([`update`]) or from
//! a background loop ([`start_auto_update`]). Each check moves through
//! `Idle -> Checking -> (Updating) -> Idle`.
//!
//! [`update`]: UpdateController::update
//! [`start_auto_update`]: UpdateController::start_auto_update

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{
    AUTO_UPDATE_POLL_SECS, AutoUpdateConfig, DEFAULT_AUTO_UPDATE_INTERVAL_SECS,
};
use crate::task::{PeriodicTask, RestartPolicy};
use crate::update::error::UpdateError;
use crate::update::handler::UpdateHandler;
use crate::version::registry::VersionRegistry;

/// Receives human-readable lifecycle messages
pub type LogCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Receives errors of checks started by the auto-update loop
pub type LoopErrorCallback = Arc<dyn Fn(&UpdateError) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Idle,
    Checking,
    Updating,
}

/// Result of a successful [`UpdateController::update`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    UpToDate,
    Updated { from: String, to: String },
}

struct ControllerState {
    current_version: String,
    interval: Duration,
    last_check: Option<Instant>,
    last_checked_at: Option<DateTime<Utc>>,
    phase: UpdatePhase,
}

struct Inner {
    package_id: u64,
    credential: String,
    registry: Arc<dyn VersionRegistry>,
    handler: Arc<dyn UpdateHandler>,
    sync_interval_from_registry: bool,
    poll_interval: Duration,
    on_log: Option<LogCallback>,
    on_loop_error: Option<LoopErrorCallback>,
    state: Mutex<ControllerState>,
    auto_update: tokio::sync::Mutex<Option<PeriodicTask>>,
}

/// Owns the update lifecycle of one package.
///
/// Cloning is cheap and every clone drives the same controller.
#[derive(Clone)]
pub struct UpdateController {
    inner: Arc<Inner>,
}

pub struct UpdateControllerBuilder {
    package_id: u64,
    current_version: String,
    credential: String,
    interval: Duration,
    poll_interval: Duration,
    sync_interval_from_registry: bool,
    on_log: Option<LogCallback>,
    on_loop_error: Option<LoopErrorCallback>,
}

impl UpdateControllerBuilder {
    /// Registry credential; an empty string sends no token
    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = credential.into();
        self
    }

    pub fn auto_update_config(mut self, config: &AutoUpdateConfig) -> Self {
        self.interval = config.interval();
        self.poll_interval = config.poll_interval();
        self.sync_interval_from_registry = config.sync_interval_from_registry;
        self
    }

    pub fn auto_update_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn sync_interval_from_registry(mut self, enabled: bool) -> Self {
        self.sync_interval_from_registry = enabled;
        self
    }

    pub fn on_log(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_log = Some(Arc::new(callback));
        self
    }

    pub fn on_loop_error(
        mut self,
        callback: impl Fn(&UpdateError) + Send + Sync + 'static,
    ) -> Self {
        self.on_loop_error = Some(Arc::new(callback));
        self
    }

    /// Fetch the package once to make sure the registry knows it, then
    /// return the controller.
    pub async fn build(
        self,
        registry: Arc<dyn VersionRegistry>,
        handler: Arc<dyn UpdateHandler>,
    ) -> Result<UpdateController, UpdateError> {
        registry.fetch_version(&self.credential, self.package_id).await?;
        debug!("Package {} is known to the registry", self.package_id);

        Ok(UpdateController {
            inner: Arc::new(Inner {
                package_id: self.package_id,
                credential: self.credential,
                registry,
                handler,
                sync_interval_from_registry: self.sync_interval_from_registry,
                poll_interval: self.poll_interval,
                on_log: self.on_log,
                on_loop_error: self.on_loop_error,
                state: Mutex::new(ControllerState {
                    current_version: self.current_version,
                    interval: self.interval,
                    last_check: None,
                    last_checked_at: None,
                    phase: UpdatePhase::Idle,
                }),
                auto_update: tokio::sync::Mutex::new(None),
            }),
        })
    }
}

/// Resets the phase to `Idle` however a check ends
struct PhaseGuard<'a>(&'a UpdateController);

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.0.state().phase = UpdatePhase::Idle;
    }
}

impl UpdateController {
    pub fn builder(package_id: u64, current_version: impl Into<String>) -> UpdateControllerBuilder {
        UpdateControllerBuilder {
            package_id,
            current_version: current_version.into(),
            credential: String::new(),
            interval: Duration::from_secs(DEFAULT_AUTO_UPDATE_INTERVAL_SECS),
            poll_interval: Duration::from_secs(AUTO_UPDATE_POLL_SECS),
            sync_interval_from_registry: false,
            on_log: None,
            on_loop_error: None,
        }
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn package_id(&self) -> u64 {
        self.inner.package_id
    }

    pub fn credential(&self) -> &str {
        &self.inner.credential
    }

    pub fn current_version(&self) -> String {
        self.state().current_version.clone()
    }

    pub fn auto_update_interval(&self) -> Duration {
        self.state().interval
    }

    /// Applies from the next elapsed-time check of the auto-update loop
    pub fn set_auto_update_interval(&self, interval: Duration) {
        self.state().interval = interval;
    }

    pub fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        self.state().last_checked_at
    }

    pub fn phase(&self) -> UpdatePhase {
        self.state().phase
    }

    /// Report a lifecycle message to tracing and the log callback
    pub fn log(&self, message: &str) {
        info!("package {}: {}", self.inner.package_id, message);
        if let Some(callback) = &self.inner.on_log {
            callback(message);
        }
    }

    /// Check the registry and run the update handler if the remote version
    /// differs from the local one.
    ///
    /// Any difference counts, including a remote version that is older.
    pub async fn update(&self) -> Result<UpdateOutcome, UpdateError> {
        let _phase = PhaseGuard(self);
        {
            let mut state = self.state();
            state.phase = UpdatePhase::Checking;
            state.last_check = Some(Instant::now());
            state.last_checked_at = Some(Utc::now());
        }

        let descriptor = self
            .inner
            .registry
            .fetch_version(&self.inner.credential, self.inner.package_id)
            .await?;

        if self.inner.sync_interval_from_registry {
            self.state().interval = interval_from_registry(descriptor.update_interval_secs);
            self.log("sync remote update interval to local");
        } else {
            self.log("use local update interval instead of the remote one");
        }

        let local_version = self.current_version();
        if descriptor.version == local_version {
            self.log(&format!(
                "remote version same as local version: {}",
                descriptor.version
            ));
            return Ok(UpdateOutcome::UpToDate);
        }

        self.log(&format!(
            "remote version {} differs from local version {}, calling update handler",
            descriptor.version, local_version
        ));
        self.state().phase = UpdatePhase::Updating;

        match self.inner.handler.apply(self, &descriptor).await {
            Ok(()) => {
                self.state().current_version = descriptor.version.clone();
                self.log("update handler succeeded, local version updated");
                Ok(UpdateOutcome::Updated {
                    from: local_version,
                    to: descriptor.version,
                })
            }
            Err(e) => {
                self.log("update handler failed, local version unchanged");
                Err(UpdateError::Handler(e))
            }
        }
    }

    fn is_update_due(&self) -> bool {
        let state = self.state();
        match state.last_check {
            Some(last) => last.elapsed() > state.interval,
            None => true,
        }
    }

    /// Start the background loop.
    ///
    /// Every poll tick the loop checks whether the update interval has
    /// elapsed since the last check and, if so, runs [`update`](Self::update).
    /// Errors from those checks, including a panicking update handler, are
    /// reported to the log and loop-error callbacks and never end the loop.
    pub async fn start_auto_update(&self) -> Result<(), UpdateError> {
        let mut task = self.inner.auto_update.lock().await;
        if task.as_ref().is_some_and(PeriodicTask::is_running) {
            return Err(UpdateError::AlreadyRunning(self.inner.package_id));
        }

        let controller = Arc::downgrade(&self.inner);
        *task = Some(PeriodicTask::spawn(
            "auto_update",
            self.inner.poll_interval,
            RestartPolicy::Never,
            move || {
                let controller = controller.clone();
                async move {
                    if let Some(inner) = controller.upgrade() {
                        UpdateController { inner }.auto_update_tick().await;
                    }
                }
            },
        ));

        self.log("auto update started");
        Ok(())
    }

    /// Stop the background loop.
    ///
    /// Waits until the loop has acknowledged, which includes any check that
    /// is in flight. Must not be called from inside an update handler run by
    /// the loop, since that check can never finish. The loop counts as
    /// stopped as soon as this is called, so a new one may be started while
    /// the old one is still finishing its check.
    pub async fn stop_auto_update(&self) -> Result<(), UpdateError> {
        let running = self.inner.auto_update.lock().await.take();
        let Some(running) = running else {
            return Err(UpdateError::NotRunning(self.inner.package_id));
        };

        running.stop().await;
        self.log("auto update stopped");
        Ok(())
    }

    pub async fn is_auto_updating(&self) -> bool {
        self.inner
            .auto_update
            .lock()
            .await
            .as_ref()
            .is_some_and(PeriodicTask::is_running)
    }

    async fn auto_update_tick(&self) {
        if !self.is_update_due() {
            return;
        }

        let result = match AssertUnwindSafe(self.update()).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(UpdateError::Panicked(panic_message(payload.as_ref()))),
        };

        if let Err(e) = result {
            warn!(
                "Auto update of package {} failed: {}",
                self.inner.package_id, e
            );
            self.log(&format!("auto update failed: {e}"));
            if let Some(callback) = &self.inner.on_loop_error {
                callback(&e);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Negative intervals from the registry mean "check on every tick"
fn interval_from_registry(secs: i64) -> Duration {
    Duration::from_secs(u64::try_from(secs).unwrap_or(0))
}
