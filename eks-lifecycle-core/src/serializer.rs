//! Per-key mutual exclusion for conflicting sibling mutations
//!
//! Some EKS APIs mishandle concurrent create/delete calls against the same
//! parent cluster (Fargate profiles are the known case). A
//! [`MutationSerializer`] hands out one async mutex per lock key so that such
//! calls run one at a time while unrelated keys proceed in parallel.
//!
//! The registry is an ordinary value: construct one per process (or per test)
//! and share it behind an `Arc`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

/// Lock key for mutations of class `class` under parent `parent`,
/// e.g. `"my-cluster-fargate-profiles"`.
pub fn lock_key(parent: &str, class: &str) -> String {
    format!("{parent}-{class}")
}

/// Registry of named async locks, created lazily and never removed.
#[derive(Debug, Default)]
pub struct MutationSerializer {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl MutationSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.to_string()).or_default())
    }

    /// Run `fut` while holding the lock named `key`.
    ///
    /// The lock is released however `fut` ends: success, error, panic, or
    /// the returned future being dropped.
    pub async fn with_lock<F, T>(&self, key: &str, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let lock = self.lock_for(key);
        log::debug!("waiting for mutation lock {key}");
        let _guard = lock.lock().await;
        log::debug!("acquired mutation lock {key}");
        fut.await
    }

    /// Number of distinct keys seen so far.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
