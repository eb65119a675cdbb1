//! Registry test utilities

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use package_client::version::error::RegistryError;
use package_client::version::registry::VersionRegistry;
use package_client::version::types::VersionDescriptor;

/// Build a descriptor the registry would accept
pub fn descriptor(version: &str) -> VersionDescriptor {
    VersionDescriptor {
        status: 1,
        message: "ok".to_string(),
        version: version.to_string(),
        payload: "{}".to_string(),
        update_interval_secs: 60,
        minimum_allow_version: "0.0.1".to_string(),
    }
}

/// In-memory registry that serves a mutable descriptor and counts calls
pub struct CountingRegistry {
    descriptor: Mutex<VersionDescriptor>,
    calls: AtomicUsize,
    panic_on_call: Option<usize>,
}

impl CountingRegistry {
    pub fn new(descriptor: VersionDescriptor) -> Self {
        Self {
            descriptor: Mutex::new(descriptor),
            calls: AtomicUsize::new(0),
            panic_on_call: None,
        }
    }

    /// Panic on the given (1-based) call instead of answering
    pub fn panicking_on_call(mut self, call: usize) -> Self {
        self.panic_on_call = Some(call);
        self
    }

    pub fn set_version(&self, version: &str) {
        self.descriptor.lock().unwrap().version = version.to_string();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VersionRegistry for CountingRegistry {
    async fn fetch_version(
        &self,
        _credential: &str,
        _package_id: u64,
    ) -> Result<VersionDescriptor, RegistryError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.panic_on_call == Some(call) {
            panic!("registry exploded on call {call}");
        }
        Ok(self.descriptor.lock().unwrap().clone())
    }
}
