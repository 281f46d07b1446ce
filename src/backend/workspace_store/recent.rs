use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::backend::common::clock::now_iso;
use crate::error::BackendResult;

const MAX_RECENT: usize = 10;
const INDEX_FILE: &str = "recent_workspaces.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub last_opened_at: String,
}

/// Process-wide most-recently-opened workspace list, persisted as JSON under
/// the per-user config directory. A corrupt or missing file reads as empty.
pub struct RecentIndex {
    file: Option<PathBuf>,
}

impl RecentIndex {
    pub fn from_config_dir() -> Self {
        let file = dirs::config_dir().map(|dir| dir.join("atelier").join(INDEX_FILE));
        RecentIndex { file }
    }

    pub fn at(file: PathBuf) -> Self {
        RecentIndex { file: Some(file) }
    }

    pub fn list(&self) -> Vec<RecentEntry> {
        let Some(file) = &self.file else {
            return Vec::new();
        };
        let Ok(raw) = fs::read_to_string(file) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "recent index unreadable, starting fresh");
                Vec::new()
            }
        }
    }

    /// Moves `path` to the front, refreshing its timestamp and preserving any
    /// alias already set for it. The list stays deduplicated and capped.
    pub fn touch(&self, path: &str) -> BackendResult<RecentEntry> {
        let mut entries = self.list();
        let alias = entries
            .iter()
            .find(|e| e.path == path)
            .and_then(|e| e.alias.clone());
        entries.retain(|e| e.path != path);
        let entry = RecentEntry {
            path: path.to_string(),
            alias,
            last_opened_at: now_iso(),
        };
        entries.insert(0, entry.clone());
        entries.truncate(MAX_RECENT);
        self.persist(&entries)?;
        Ok(entry)
    }

    pub fn set_alias(&self, path: &str, alias: Option<String>) -> BackendResult<()> {
        let mut entries = self.list();
        for entry in entries.iter_mut() {
            if entry.path == path {
                entry.alias = alias.clone();
            }
        }
        self.persist(&entries)
    }

    pub fn remove(&self, path: &str) -> BackendResult<()> {
        let mut entries = self.list();
        entries.retain(|e| e.path != path);
        self.persist(&entries)
    }

    fn persist(&self, entries: &[RecentEntry]) -> BackendResult<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries).unwrap_or_else(|_| "[]".to_string());
        fs::write(file, json)?;
        Ok(())
    }
}
