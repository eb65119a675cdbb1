use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::join_all;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::FETCH_STAGGER_DELAY_MS;
use crate::task::{PeriodicTask, RestartPolicy};
use crate::version::error::CacheError;
use crate::version::registry::VersionRegistry;
use crate::version::types::VersionDescriptor;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub package_id: u64,
    pub credential: String,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub package_id: u64,
    pub credential: String,
    /// `None` until a fetch for this key has succeeded
    pub descriptor: Option<Arc<VersionDescriptor>>,
}

/// In-memory store of the last descriptor seen per (package, credential).
///
/// Entries are never evicted. Concurrent fetches of the same key are not
/// coalesced; the last successful fetch wins.
pub struct VersionCache {
    registry: Arc<dyn VersionRegistry>,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    refresh_task: Mutex<Option<PeriodicTask>>,
}

impl VersionCache {
    pub fn new(registry: Arc<dyn VersionRegistry>) -> Self {
        Self {
            registry,
            entries: Mutex::new(HashMap::new()),
            refresh_task: Mutex::new(None),
        }
    }

    /// Acquire entries lock with proper error handling
    fn lock_entries(&self) -> Result<MutexGuard<'_, HashMap<CacheKey, CacheEntry>>, CacheError> {
        self.entries.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn lock_refresh_task(&self) -> Result<MutexGuard<'_, Option<PeriodicTask>>, CacheError> {
        self.refresh_task.lock().map_err(|_| CacheError::LockPoisoned)
    }

    /// Get the descriptor for a package.
    ///
    /// With `use_cache`, a previously fetched descriptor is returned without
    /// touching the network. Otherwise, or on a miss, the registry is queried
    /// and the entry is replaced on success. Failures are returned, not cached.
    pub async fn get(
        &self,
        credential: &str,
        package_id: u64,
        use_cache: bool,
    ) -> Result<Arc<VersionDescriptor>, CacheError> {
        let key = CacheKey {
            package_id,
            credential: credential.to_string(),
        };

        {
            let mut entries = self.lock_entries()?;
            let entry = entries.entry(key.clone()).or_insert_with(|| CacheEntry {
                package_id,
                credential: credential.to_string(),
                descriptor: None,
            });

            if use_cache {
                if let Some(descriptor) = &entry.descriptor {
                    debug!("Cache hit for package {}", package_id);
                    return Ok(descriptor.clone());
                }
            }
        }

        let descriptor = Arc::new(self.registry.fetch_version(credential, package_id).await?);

        self.lock_entries()?.insert(
            key,
            CacheEntry {
                package_id,
                credential: credential.to_string(),
                descriptor: Some(descriptor.clone()),
            },
        );

        Ok(descriptor)
    }

    /// Snapshot of all known entries
    pub fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        Ok(self.lock_entries()?.values().cloned().collect())
    }

    /// Re-fetch every known key once.
    ///
    /// A failure for one key is logged and does not affect the others.
    /// Fetches are executed in parallel with staggered start times.
    pub async fn refresh_all(&self) {
        let keys: Vec<CacheKey> = match self.lock_entries() {
            Ok(entries) => entries.keys().cloned().collect(),
            Err(e) => {
                error!("Failed to read cache keys: {}", e);
                return;
            }
        };

        if keys.is_empty() {
            debug!("No cache entries to refresh");
            return;
        }

        info!("Refreshing {} cache entries", keys.len());

        let futures = keys.into_iter().enumerate().map(|(i, key)| {
            let delay = Duration::from_millis(FETCH_STAGGER_DELAY_MS * i as u64);
            async move {
                sleep(delay).await;
                if let Err(e) = self.get(&key.credential, key.package_id, false).await {
                    error!(
                        "Failed to refresh version of package {}: {}",
                        key.package_id, e
                    );
                }
            }
        });

        join_all(futures).await;
    }

    /// Start the background sweep unless it is already running.
    ///
    /// A panicking sweep is recorded in [`sweep_faults`](Self::sweep_faults)
    /// and restarted. Returns `false` when a sweep was already active.
    pub fn start_background_refresh(
        self: &Arc<Self>,
        interval: Duration,
    ) -> Result<bool, CacheError> {
        let mut task = self.lock_refresh_task()?;
        if task.as_ref().is_some_and(PeriodicTask::is_running) {
            debug!("Background refresh already running");
            return Ok(false);
        }

        let cache = Arc::downgrade(self);
        *task = Some(PeriodicTask::spawn(
            "cache_refresh",
            interval,
            RestartPolicy::OnPanic,
            move || {
                let cache = cache.clone();
                async move {
                    if let Some(cache) = cache.upgrade() {
                        cache.refresh_all().await;
                    }
                }
            },
        ));

        Ok(true)
    }

    /// Stop the background sweep, waiting for an in-flight sweep to finish.
    ///
    /// Returns `false` if no sweep was running.
    pub async fn stop_background_refresh(&self) -> Result<bool, CacheError> {
        let task = self.lock_refresh_task()?.take();
        match task {
            Some(task) => {
                task.stop().await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock_refresh_task()
            .map(|task| task.as_ref().is_some_and(PeriodicTask::is_running))
            .unwrap_or(false)
    }

    /// Number of sweeps that faulted since the background refresh was started
    pub fn sweep_faults(&self) -> u64 {
        self.lock_refresh_task()
            .map(|task| task.as_ref().map_or(0, PeriodicTask::faults))
            .unwrap_or(0)
    }
}
