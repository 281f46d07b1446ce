use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::{BackendError, BackendResult};

/// In-flight marker table keyed by repository (or clone target). A second
/// operation on the same key fails fast instead of queueing.
#[derive(Debug, Default)]
pub struct OperationLocks {
    active: Mutex<HashSet<String>>,
}

impl OperationLocks {
    pub fn new() -> Arc<Self> {
        Arc::new(OperationLocks::default())
    }

    pub fn try_begin(self: &Arc<Self>, key: &str) -> BackendResult<OperationGuard> {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !active.insert(key.to_string()) {
            return Err(BackendError::OperationInProgress(key.to_string()));
        }
        Ok(OperationGuard {
            locks: Arc::clone(self),
            key: key.to_string(),
        })
    }
}

#[derive(Debug)]
pub struct OperationGuard {
    locks: Arc<OperationLocks>,
    key: String,
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        let mut active = self
            .locks
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        active.remove(&self.key);
    }
}
