//! In-flight Request Locks
//!
//! Per-key async mutexes that serialize concurrent requests for the same log
//! or trace within one process. The second request waits for the first to
//! save, then resolves from the cache instead of calling the LLM again.
//! Entries are removed once no request holds or waits on them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock key for a request: the trace when the log has one, else the log.
pub fn request_key(project_id: &str, log_id: &str, trace_id: Option<&str>) -> String {
    match trace_id {
        Some(trace) => format!("{}/trace:{}", project_id, trace),
        None => format!("{}/log:{}", project_id, log_id),
    }
}

/// Registry of per-key locks
#[derive(Debug, Default)]
pub struct InFlightLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Held while a request for `key` is in flight
pub struct InFlightGuard {
    key: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
    waited: bool,
}

impl InFlightGuard {
    /// Whether another request held the key when this one arrived
    pub fn waited(&self) -> bool {
        self.waited
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        // The map and this guard hold the only references: nobody waits.
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) <= 2);
        self.guard.take();
    }
}

impl InFlightLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting behind any current holder.
    pub async fn acquire(&self, key: &str) -> InFlightGuard {
        let lock = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let (guard, waited) = match lock.clone().try_lock_owned() {
            Ok(guard) => (guard, false),
            Err(_) => {
                tracing::debug!(key, "orchestrator: waiting for in-flight request");
                (lock.lock_owned().await, true)
            }
        };

        InFlightGuard {
            key: key.to_string(),
            locks: self.locks.clone(),
            guard: Some(guard),
            waited,
        }
    }

    /// Keys currently tracked
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
