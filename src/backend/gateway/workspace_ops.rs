use std::path::Path;

use tracing::info;

use crate::backend::common::dtos::{WorkspaceInfo, WorkspaceSettings, WorkspaceSettingsPatch};
use crate::backend::workspace_store::store::{STORE_DIR, STORE_FILE};
use crate::backend::workspace_store::WorkspaceContext;
use crate::error::BackendResult;

use super::Gateway;

impl Gateway {
    /// Opens (creating on first use) the workspace store at `path` and makes
    /// it the active workspace. Any previously open store is closed first.
    pub fn workspace_init_or_open(&self, path: &Path) -> BackendResult<WorkspaceInfo> {
        {
            let mut guard = self
                .ctx
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(old) = guard.take() {
                info!(workspace = %old.root.display(), "closing previous workspace");
            }
        }

        let ctx = WorkspaceContext::open(path)?;
        let entry = self.recent.touch(&ctx.root.display().to_string())?;
        let settings = ctx.settings()?;
        let info = WorkspaceInfo {
            path: ctx.root.display().to_string(),
            db_path: ctx.db_path.display().to_string(),
            alias: entry.alias,
            last_opened_at: entry.last_opened_at,
            settings: Some(settings),
        };

        let mut guard = self
            .ctx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(ctx);
        Ok(info)
    }

    /// Recent workspaces, most recent first. Settings are omitted; opening
    /// the workspace is what loads its store.
    pub fn workspace_list_recent(&self) -> Vec<WorkspaceInfo> {
        self.recent
            .list()
            .into_iter()
            .map(|entry| WorkspaceInfo {
                db_path: Path::new(&entry.path)
                    .join(STORE_DIR)
                    .join(STORE_FILE)
                    .display()
                    .to_string(),
                path: entry.path,
                alias: entry.alias,
                last_opened_at: entry.last_opened_at,
                settings: None,
            })
            .collect()
    }

    pub fn workspace_remove_recent(&self, path: &str) -> BackendResult<()> {
        self.recent.remove(path)
    }

    pub fn workspace_update_alias(&self, path: &str, alias: Option<String>) -> BackendResult<()> {
        self.recent.set_alias(path, alias)
    }

    pub fn workspace_settings_get(&self) -> BackendResult<WorkspaceSettings> {
        self.with_ctx(|ctx| ctx.settings())
    }

    pub fn workspace_settings_update(
        &self,
        patch: WorkspaceSettingsPatch,
    ) -> BackendResult<WorkspaceSettings> {
        self.with_ctx(|ctx| ctx.update_settings(patch))
    }
}
