//! Cancellable periodic background task.
//!
//! [`PeriodicTask`] runs a job on a fixed period until stopped. Each period
//! sleeps first and then runs the job to completion, so two runs of the same
//! task never overlap. Stopping is cooperative: a run that has already started
//! is allowed to finish before [`PeriodicTask::stop`] returns.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// What to do when a run of the job panics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Let the task end
    Never,
    /// Record the fault and start the loop again
    OnPanic,
}

/// Handle to a spawned periodic task
pub struct PeriodicTask {
    name: &'static str,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    faults: Arc<AtomicU64>,
}

impl PeriodicTask {
    /// Spawn `job` on the current tokio runtime, running once per `period`.
    pub fn spawn<F, Fut>(
        name: &'static str,
        period: Duration,
        policy: RestartPolicy,
        job: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let faults = Arc::new(AtomicU64::new(0));
        let handle = tokio::spawn(supervise(
            name,
            period,
            policy,
            Arc::new(job),
            cancel.clone(),
            faults.clone(),
        ));

        info!("Started periodic task {} every {:?}", name, period);

        Self {
            name,
            cancel,
            handle,
            faults,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Number of runs that panicked so far
    pub fn faults(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    /// Signal the task to stop and wait until it has acknowledged.
    ///
    /// Waits for an in-flight run of the job to complete. Calling this from
    /// inside the job itself never returns.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.handle).await {
            error!("Periodic task {} ended abnormally: {}", self.name, e);
        }
        info!("Stopped periodic task {}", self.name);
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn supervise<F, Fut>(
    name: &'static str,
    period: Duration,
    policy: RestartPolicy,
    job: Arc<F>,
    cancel: CancellationToken,
    faults: Arc<AtomicU64>,
) where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    loop {
        let run = tokio::spawn(run_loop(period, job.clone(), cancel.clone()));

        match run.await {
            Ok(()) => return,
            Err(e) if e.is_panic() => {
                let count = faults.fetch_add(1, Ordering::Relaxed) + 1;
                error!("Periodic task {} panicked (fault #{})", name, count);
                if policy == RestartPolicy::Never || cancel.is_cancelled() {
                    return;
                }
                debug!("Restarting periodic task {}", name);
            }
            Err(e) => {
                error!("Periodic task {} was aborted: {}", name, e);
                return;
            }
        }
    }
}

async fn run_loop<F, Fut>(period: Duration, job: Arc<F>, cancel: CancellationToken)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(period) => job().await,
        }
    }
}
