use std::fs;

use rusqlite::Row;
use tracing::info;

use crate::backend::common::clock::now_iso;
use crate::backend::common::dtos::{Project, ProjectCreateInput, ProjectPatch};
use crate::backend::common::paths::{is_safe_dir_name, slugify};
use crate::backend::workspace_store::WorkspaceContext;
use crate::error::{BackendError, BackendResult};

const MAX_NAME_LEN: usize = 120;

pub(crate) fn list(ctx: &WorkspaceContext) -> BackendResult<Vec<Project>> {
    let mut stmt = ctx.conn.prepare(
        "SELECT id, name, description, project_path, display_json, ide_override_json, updated_at
         FROM projects ORDER BY updated_at DESC",
    )?;
    let rows = stmt.query_map([], map_project)?;
    let mut projects = Vec::new();
    for row in rows {
        projects.push(row?);
    }
    Ok(projects)
}

pub(crate) fn get(ctx: &WorkspaceContext, project_id: &str) -> BackendResult<Project> {
    ctx.conn
        .query_row(
            "SELECT id, name, description, project_path, display_json, ide_override_json, updated_at
             FROM projects WHERE id = ?1",
            [project_id],
            map_project,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                BackendError::ProjectNotFound(project_id.to_string())
            }
            other => other.into(),
        })
}

pub(crate) fn create(ctx: &WorkspaceContext, input: ProjectCreateInput) -> BackendResult<Project> {
    let name = input.name.trim();
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(BackendError::InvalidName(format!(
            "project name must be 1..={MAX_NAME_LEN} characters"
        )));
    }

    let requested = match input.project_path {
        Some(path) => {
            if !is_safe_dir_name(&path) {
                return Err(BackendError::InvalidPath(path));
            }
            path
        }
        None => slugify(name),
    };
    let relative_path = disambiguate_dir(ctx, &requested)?;
    fs::create_dir_all(ctx.root.join(&relative_path))?;

    let now = now_iso();
    let id = uuid::Uuid::new_v4().to_string();
    ctx.conn.execute(
        "INSERT INTO projects (id, name, description, project_path, display_json, ide_override_json, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, NULL, NULL, ?5, ?5)",
        rusqlite::params![id, name, input.description, relative_path, now],
    )?;
    info!(project = %id, path = %relative_path, "project created");
    get(ctx, &id)
}

pub(crate) fn update(
    ctx: &WorkspaceContext,
    project_id: &str,
    patch: ProjectPatch,
) -> BackendResult<Project> {
    let current = get(ctx, project_id)?;

    let name = match patch.name {
        Some(name) => {
            let trimmed = name.trim().to_string();
            if trimmed.is_empty() || trimmed.len() > MAX_NAME_LEN {
                return Err(BackendError::InvalidName(format!(
                    "project name must be 1..={MAX_NAME_LEN} characters"
                )));
            }
            trimmed
        }
        None => current.name,
    };
    let description = match patch.description {
        Some(value) => value,
        None => current.description,
    };
    let display = match patch.display {
        Some(value) => value,
        None => current.display,
    };
    let ide_override = match patch.ide_override {
        Some(value) => value,
        None => current.ide_override,
    };

    let display_json = display
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| BackendError::InvalidName(format!("display encode: {e}")))?;
    let ide_override_json = ide_override
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| BackendError::InvalidIdeConfig(format!("ide override encode: {e}")))?;

    ctx.conn.execute(
        "UPDATE projects SET name = ?1, description = ?2, display_json = ?3,
         ide_override_json = ?4, updated_at = ?5 WHERE id = ?6",
        rusqlite::params![name, description, display_json, ide_override_json, now_iso(), project_id],
    )?;
    get(ctx, project_id)
}

/// Removes the metadata rows only; the project directory and any working
/// trees stay on disk.
pub(crate) fn delete(ctx: &WorkspaceContext, project_id: &str) -> BackendResult<()> {
    get(ctx, project_id)?;
    ctx.conn.execute(
        "DELETE FROM project_directories WHERE project_id = ?1",
        [project_id],
    )?;
    ctx.conn.execute(
        "DELETE FROM git_repositories WHERE project_id = ?1",
        [project_id],
    )?;
    ctx.conn
        .execute("DELETE FROM projects WHERE id = ?1", [project_id])?;
    info!(project = %project_id, "project metadata removed");
    Ok(())
}

fn disambiguate_dir(ctx: &WorkspaceContext, requested: &str) -> BackendResult<String> {
    if dir_is_free(ctx, requested)? {
        return Ok(requested.to_string());
    }
    for n in 2..100 {
        let candidate = format!("{requested}-{n}");
        if dir_is_free(ctx, &candidate)? {
            return Ok(candidate);
        }
    }
    Err(BackendError::InvalidPath(format!(
        "no free directory name derived from {requested}"
    )))
}

fn dir_is_free(ctx: &WorkspaceContext, relative: &str) -> BackendResult<bool> {
    let taken_on_disk = ctx.root.join(relative).exists();
    let taken_in_db: i64 = ctx.conn.query_row(
        "SELECT COUNT(*) FROM projects WHERE project_path = ?1",
        [relative],
        |row| row.get(0),
    )?;
    Ok(!taken_on_disk && taken_in_db == 0)
}

fn map_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    let display_json: Option<String> = row.get(4)?;
    let ide_override_json: Option<String> = row.get(5)?;
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        project_path: row.get(3)?,
        display: display_json.and_then(|json| serde_json::from_str(&json).ok()),
        ide_override: ide_override_json.and_then(|json| serde_json::from_str(&json).ok()),
        updated_at: row.get(6)?,
    })
}
