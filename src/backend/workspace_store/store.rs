use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::backend::common::clock::now_iso;
use crate::backend::common::dtos::{
    DirectoryTypeKind, WorkspaceSettings, WorkspaceSettingsPatch,
};
use crate::error::{BackendError, BackendResult};

pub(crate) const STORE_DIR: &str = ".atelier";
pub(crate) const STORE_FILE: &str = "app.db";
const SETTINGS_KEY: &str = "settings";

const MIGRATIONS: &[&str] = &[
    // v1: full initial schema
    "CREATE TABLE workspace_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    CREATE TABLE projects (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        project_path TEXT NOT NULL,
        display_json TEXT,
        ide_override_json TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE TABLE directory_types (
        id TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        name TEXT NOT NULL,
        icon TEXT,
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );
    CREATE TABLE project_directories (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL,
        dir_type_id TEXT NOT NULL,
        relative_path TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE(project_id, dir_type_id)
    );
    CREATE TABLE git_repositories (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL,
        name TEXT NOT NULL,
        path TEXT NOT NULL,
        remote_url TEXT,
        branch TEXT,
        last_sync_at TEXT,
        last_status_checked_at TEXT,
        last_status_json TEXT,
        created_at TEXT NOT NULL
    );
    CREATE INDEX idx_project_directories_project ON project_directories(project_id);
    CREATE INDEX idx_git_repositories_project ON git_repositories(project_id);",
];

/// The single open workspace store: the workspace root plus its SQLite
/// connection. Owned by the gateway; dropped when another workspace opens.
#[derive(Debug)]
pub struct WorkspaceContext {
    pub root: PathBuf,
    pub db_path: PathBuf,
    pub(crate) conn: Connection,
}

impl WorkspaceContext {
    pub fn open(root: &Path) -> BackendResult<Self> {
        if !root.is_dir() {
            return Err(BackendError::InvalidWorkspacePath(
                root.display().to_string(),
            ));
        }
        ensure_writable(root)?;

        let store_dir = root.join(STORE_DIR);
        fs::create_dir_all(&store_dir)
            .map_err(|_| BackendError::WorkspacePermissionDenied(root.display().to_string()))?;
        let db_path = store_dir.join(STORE_FILE);
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        run_migrations(&conn)?;
        let ctx = WorkspaceContext {
            root: root.to_path_buf(),
            db_path,
            conn,
        };
        ctx.seed_builtin_dir_types()?;
        info!(workspace = %ctx.root.display(), "workspace store opened");
        Ok(ctx)
    }

    pub fn settings(&self) -> BackendResult<WorkspaceSettings> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM workspace_meta WHERE key = ?1",
                [SETTINGS_KEY],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(swallow_no_rows)?;
        match raw {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| BackendError::WorkspaceCorrupt(format!("settings row: {e}"))),
            None => Ok(WorkspaceSettings::default()),
        }
    }

    pub fn update_settings(
        &self,
        patch: WorkspaceSettingsPatch,
    ) -> BackendResult<WorkspaceSettings> {
        let mut settings = self.settings()?;
        if let Some(mode) = patch.theme_mode {
            settings.theme_mode = mode;
        }
        if let Some(custom_theme_id) = patch.custom_theme_id {
            settings.custom_theme_id = custom_theme_id;
        }
        if let Some(default_ide) = patch.default_ide {
            settings.default_ide = default_ide;
        }
        let json = serde_json::to_string(&settings)
            .map_err(|e| BackendError::WorkspaceCorrupt(format!("settings encode: {e}")))?;
        self.conn.execute(
            "INSERT INTO workspace_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![SETTINGS_KEY, json],
        )?;
        Ok(settings)
    }

    fn seed_builtin_dir_types(&self) -> BackendResult<()> {
        let builtins: [(DirectoryTypeKind, &str, &str, i64); 4] = [
            (DirectoryTypeKind::Code, "Code", "code", 0),
            (DirectoryTypeKind::Docs, "Docs", "book", 1),
            (DirectoryTypeKind::UiDesign, "UI Design", "palette", 2),
            (DirectoryTypeKind::ProjectPlanning, "Planning", "calendar", 3),
        ];
        for (kind, name, icon, sort_order) in builtins {
            let exists: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM directory_types WHERE kind = ?1",
                [kind.as_str()],
                |row| row.get(0),
            )?;
            if exists == 0 {
                self.conn.execute(
                    "INSERT INTO directory_types (id, kind, name, icon, sort_order, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        uuid::Uuid::new_v4().to_string(),
                        kind.as_str(),
                        name,
                        icon,
                        sort_order,
                        now_iso()
                    ],
                )?;
            }
        }
        Ok(())
    }
}

fn ensure_writable(root: &Path) -> BackendResult<()> {
    let probe = root.join(".atelier-write-probe");
    match fs::write(&probe, b"ok") {
        Ok(_) => {
            let _ = fs::remove_file(&probe);
            Ok(())
        }
        Err(_) => Err(BackendError::WorkspacePermissionDenied(
            root.display().to_string(),
        )),
    }
}

fn run_migrations(conn: &Connection) -> BackendResult<()> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| BackendError::WorkspaceCorrupt(e.to_string()))?;
    let current = version as usize;
    if current > MIGRATIONS.len() {
        return Err(BackendError::WorkspaceCorrupt(format!(
            "store schema version {current} is newer than this build supports"
        )));
    }
    for (idx, migration) in MIGRATIONS.iter().enumerate().skip(current) {
        debug!(version = idx + 1, "applying store migration");
        conn.execute_batch(migration)
            .map_err(|e| BackendError::WorkspaceCorrupt(format!("migration {}: {e}", idx + 1)))?;
        conn.pragma_update(None, "user_version", (idx + 1) as i64)
            .map_err(|e| BackendError::WorkspaceCorrupt(e.to_string()))?;
    }
    Ok(())
}

fn swallow_no_rows<T>(err: rusqlite::Error) -> Result<Option<T>, rusqlite::Error> {
    match err {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other),
    }
}
