use rusqlite::Row;

use crate::backend::common::clock::now_iso;
use crate::backend::common::dtos::{
    DirTypeCreateInput, DirTypePatch, DirectoryType, DirectoryTypeKind, ProjectDirBindInput,
    ProjectDirectory,
};
use crate::backend::common::paths::resolve_under;
use crate::backend::project_catalog::projects;
use crate::backend::workspace_store::WorkspaceContext;
use crate::error::{BackendError, BackendResult};

pub(crate) fn list(ctx: &WorkspaceContext) -> BackendResult<Vec<DirectoryType>> {
    let mut stmt = ctx.conn.prepare(
        "SELECT id, kind, name, icon, sort_order, created_at
         FROM directory_types ORDER BY sort_order ASC, created_at ASC",
    )?;
    let rows = stmt.query_map([], map_dir_type)?;
    let mut types = Vec::new();
    for row in rows {
        types.push(row?);
    }
    Ok(types)
}

pub(crate) fn get(ctx: &WorkspaceContext, dir_type_id: &str) -> BackendResult<DirectoryType> {
    ctx.conn
        .query_row(
            "SELECT id, kind, name, icon, sort_order, created_at
             FROM directory_types WHERE id = ?1",
            [dir_type_id],
            map_dir_type,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                BackendError::DirTypeNotFound(dir_type_id.to_string())
            }
            other => other.into(),
        })
}

pub(crate) fn create_custom(
    ctx: &WorkspaceContext,
    input: DirTypeCreateInput,
) -> BackendResult<DirectoryType> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(BackendError::InvalidName(
            "directory type name must not be empty".to_string(),
        ));
    }
    let id = uuid::Uuid::new_v4().to_string();
    ctx.conn.execute(
        "INSERT INTO directory_types (id, kind, name, icon, sort_order, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            id,
            DirectoryTypeKind::Custom.as_str(),
            name,
            input.icon,
            input.sort_order.unwrap_or(100),
            now_iso()
        ],
    )?;
    get(ctx, &id)
}

pub(crate) fn update(
    ctx: &WorkspaceContext,
    dir_type_id: &str,
    patch: DirTypePatch,
) -> BackendResult<DirectoryType> {
    let current = get(ctx, dir_type_id)?;
    let name = match patch.name {
        Some(name) => {
            let trimmed = name.trim().to_string();
            if trimmed.is_empty() {
                return Err(BackendError::InvalidName(
                    "directory type name must not be empty".to_string(),
                ));
            }
            trimmed
        }
        None => current.name,
    };
    let icon = match patch.icon {
        Some(value) => value,
        None => current.icon,
    };
    let sort_order = patch.sort_order.unwrap_or(current.sort_order);
    ctx.conn.execute(
        "UPDATE directory_types SET name = ?1, icon = ?2, sort_order = ?3 WHERE id = ?4",
        rusqlite::params![name, icon, sort_order, dir_type_id],
    )?;
    get(ctx, dir_type_id)
}

pub(crate) fn list_project_dirs(
    ctx: &WorkspaceContext,
    project_id: &str,
) -> BackendResult<Vec<ProjectDirectory>> {
    projects::get(ctx, project_id)?;
    let mut stmt = ctx.conn.prepare(
        "SELECT id, project_id, dir_type_id, relative_path, created_at, updated_at
         FROM project_directories WHERE project_id = ?1 ORDER BY created_at ASC",
    )?;
    let rows = stmt.query_map([project_id], map_project_dir)?;
    let mut dirs = Vec::new();
    for row in rows {
        dirs.push(row?);
    }
    Ok(dirs)
}

/// Upserts the binding for `(project, dirType)`. Rebinding replaces the path
/// but keeps the original row id and creation time.
pub(crate) fn bind_project_dir(
    ctx: &WorkspaceContext,
    input: ProjectDirBindInput,
) -> BackendResult<ProjectDirectory> {
    let project = projects::get(ctx, &input.project_id)?;
    get(ctx, &input.dir_type_id)?;
    // Normalizes the path and proves it stays inside the project.
    resolve_under(&ctx.root.join(&project.project_path), &input.relative_path)?;

    let now = now_iso();
    ctx.conn.execute(
        "INSERT INTO project_directories (id, project_id, dir_type_id, relative_path, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)
         ON CONFLICT(project_id, dir_type_id) DO UPDATE SET
             relative_path = excluded.relative_path,
             updated_at = excluded.updated_at",
        rusqlite::params![
            uuid::Uuid::new_v4().to_string(),
            input.project_id,
            input.dir_type_id,
            input.relative_path,
            now
        ],
    )?;
    ctx.conn
        .query_row(
            "SELECT id, project_id, dir_type_id, relative_path, created_at, updated_at
             FROM project_directories WHERE project_id = ?1 AND dir_type_id = ?2",
            [input.project_id.as_str(), input.dir_type_id.as_str()],
            map_project_dir,
        )
        .map_err(Into::into)
}

fn map_dir_type(row: &Row<'_>) -> rusqlite::Result<DirectoryType> {
    let kind: String = row.get(1)?;
    Ok(DirectoryType {
        id: row.get(0)?,
        kind: DirectoryTypeKind::from_db(&kind),
        name: row.get(2)?,
        icon: row.get(3)?,
        sort_order: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn map_project_dir(row: &Row<'_>) -> rusqlite::Result<ProjectDirectory> {
    Ok(ProjectDirectory {
        id: row.get(0)?,
        project_id: row.get(1)?,
        dir_type_id: row.get(2)?,
        relative_path: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
