use rusqlite::Row;

use crate::backend::common::clock::now_iso;
use crate::backend::common::dtos::{GitRepoStatus, GitRepository};
use crate::backend::workspace_store::WorkspaceContext;
use crate::error::{BackendError, BackendResult};

pub(crate) fn list(
    ctx: &WorkspaceContext,
    project_id: Option<&str>,
) -> BackendResult<Vec<GitRepository>> {
    let mut repos = Vec::new();
    match project_id {
        Some(project_id) => {
            let mut stmt = ctx.conn.prepare(
                "SELECT id, project_id, name, path, remote_url, branch, last_sync_at, last_status_checked_at
                 FROM git_repositories WHERE project_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map([project_id], map_repo)?;
            for row in rows {
                repos.push(row?);
            }
        }
        None => {
            let mut stmt = ctx.conn.prepare(
                "SELECT id, project_id, name, path, remote_url, branch, last_sync_at, last_status_checked_at
                 FROM git_repositories ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map([], map_repo)?;
            for row in rows {
                repos.push(row?);
            }
        }
    }
    Ok(repos)
}

pub(crate) fn get(ctx: &WorkspaceContext, repo_id: &str) -> BackendResult<GitRepository> {
    ctx.conn
        .query_row(
            "SELECT id, project_id, name, path, remote_url, branch, last_sync_at, last_status_checked_at
             FROM git_repositories WHERE id = ?1",
            [repo_id],
            map_repo,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => BackendError::RepoNotFound(repo_id.to_string()),
            other => other.into(),
        })
}

pub(crate) fn insert(ctx: &WorkspaceContext, repo: &GitRepository) -> BackendResult<()> {
    ctx.conn.execute(
        "INSERT INTO git_repositories (id, project_id, name, path, remote_url, branch, last_sync_at, last_status_checked_at, last_status_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9)",
        rusqlite::params![
            repo.id,
            repo.project_id,
            repo.name,
            repo.path,
            repo.remote_url,
            repo.branch,
            repo.last_sync_at,
            repo.last_status_checked_at,
            now_iso()
        ],
    )?;
    Ok(())
}

pub(crate) fn set_last_sync(
    ctx: &WorkspaceContext,
    repo_id: &str,
    synced_at: &str,
) -> BackendResult<()> {
    ctx.conn.execute(
        "UPDATE git_repositories SET last_sync_at = ?1 WHERE id = ?2",
        [synced_at, repo_id],
    )?;
    Ok(())
}

pub(crate) fn cache_status(ctx: &WorkspaceContext, status: &GitRepoStatus) -> BackendResult<()> {
    let json = serde_json::to_string(status)
        .map_err(|e| BackendError::WorkspaceCorrupt(format!("status encode: {e}")))?;
    ctx.conn.execute(
        "UPDATE git_repositories SET last_status_checked_at = ?1, last_status_json = ?2,
         branch = COALESCE(?3, branch) WHERE id = ?4",
        rusqlite::params![status.last_checked_at, json, status.branch, status.repo_id],
    )?;
    Ok(())
}

pub(crate) fn cached_status(
    ctx: &WorkspaceContext,
    repo_id: &str,
) -> BackendResult<Option<GitRepoStatus>> {
    let json: Option<String> = ctx.conn.query_row(
        "SELECT last_status_json FROM git_repositories WHERE id = ?1",
        [repo_id],
        |row| row.get(0),
    )?;
    Ok(json.and_then(|raw| serde_json::from_str(&raw).ok()))
}

/// Removes the row only; the working tree stays on disk.
pub(crate) fn forget(ctx: &WorkspaceContext, repo_id: &str) -> BackendResult<()> {
    get(ctx, repo_id)?;
    ctx.conn
        .execute("DELETE FROM git_repositories WHERE id = ?1", [repo_id])?;
    Ok(())
}

fn map_repo(row: &Row<'_>) -> rusqlite::Result<GitRepository> {
    Ok(GitRepository {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        path: row.get(3)?,
        remote_url: row.get(4)?,
        branch: row.get(5)?,
        last_sync_at: row.get(6)?,
        last_status_checked_at: row.get(7)?,
    })
}
