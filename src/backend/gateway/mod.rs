mod fs_ops;
mod git_ops;
mod ide_ops;
mod project_ops;
mod workspace_ops;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub use git_ops::OperationHandle;

use crate::backend::git_sync::locks::OperationLocks;
use crate::backend::workspace_store::{RecentIndex, WorkspaceContext};
use crate::error::{BackendError, BackendResult};

/// The operation surface the UI shell talks to. Owns the single open
/// workspace store plus the in-flight git operation table; every method is
/// a complete request/response cycle.
pub struct Gateway {
    ctx: Mutex<Option<WorkspaceContext>>,
    recent: RecentIndex,
    locks: Arc<OperationLocks>,
}

impl Gateway {
    pub fn new() -> Self {
        Gateway {
            ctx: Mutex::new(None),
            recent: RecentIndex::from_config_dir(),
            locks: OperationLocks::new(),
        }
    }

    /// Test and embedding hook: keeps the recent-workspaces index at an
    /// explicit file instead of the per-user config directory.
    pub fn with_recent_index(file: PathBuf) -> Self {
        Gateway {
            ctx: Mutex::new(None),
            recent: RecentIndex::at(file),
            locks: OperationLocks::new(),
        }
    }

    fn with_ctx<T>(
        &self,
        op: impl FnOnce(&WorkspaceContext) -> BackendResult<T>,
    ) -> BackendResult<T> {
        let guard = self
            .ctx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let ctx = guard.as_ref().ok_or(BackendError::WorkspaceNotOpen)?;
        op(ctx)
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Gateway::new()
    }
}
