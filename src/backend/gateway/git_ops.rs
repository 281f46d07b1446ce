use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;

use git2::Repository;
use tracing::warn;

use crate::backend::common::clock::now_iso;
use crate::backend::common::dtos::{
    GitCloneInput, GitRepoStatus, GitRepository, NetworkState, PullOutcome,
};
use crate::backend::common::paths::{is_safe_dir_name, resolve_under};
use crate::backend::git_sync::engine::{self, PullResult};
use crate::backend::git_sync::progress::{CancelToken, ProgressEvent, ProgressSink};
use crate::backend::git_sync::repos;
use crate::backend::project_catalog::projects;
use crate::error::{BackendError, BackendResult};

use super::Gateway;

/// A long git operation running on its own thread: the caller pumps
/// `events`, may flip `cancel`, and joins `outcome` for the result.
pub struct OperationHandle<T> {
    pub events: Receiver<ProgressEvent>,
    pub cancel: CancelToken,
    pub outcome: JoinHandle<BackendResult<T>>,
}

impl Gateway {
    pub fn git_repo_list(&self, project_id: Option<&str>) -> BackendResult<Vec<GitRepository>> {
        self.with_ctx(|ctx| {
            if let Some(project_id) = project_id {
                projects::get(ctx, project_id)?;
            }
            repos::list(ctx, project_id)
        })
    }

    /// Registers an existing working tree under a project. The path is
    /// relative to the project root and must already be a git repository.
    pub fn git_repo_register(
        &self,
        project_id: &str,
        relative_path: &str,
        name: Option<String>,
    ) -> BackendResult<GitRepository> {
        self.with_ctx(|ctx| {
            let project = projects::get(ctx, project_id)?;
            let project_root = ctx.root.join(&project.project_path);
            let repo_path = resolve_under(&project_root, relative_path)?;
            let repo = Repository::open(&repo_path).map_err(|_| {
                BackendError::InvalidPath(format!("{relative_path} is not a git repository"))
            })?;
            let branch = repo.head().ok().and_then(|h| h.shorthand().map(str::to_string));
            let remote_url = repo
                .find_remote("origin")
                .ok()
                .and_then(|remote| remote.url().map(str::to_string));
            let name = name.unwrap_or_else(|| {
                repo_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| relative_path.to_string())
            });

            let record = GitRepository {
                id: uuid::Uuid::new_v4().to_string(),
                project_id: project_id.to_string(),
                name,
                path: repo_path.display().to_string(),
                remote_url,
                branch,
                last_sync_at: None,
                last_status_checked_at: None,
            };
            repos::insert(ctx, &record)?;
            Ok(record)
        })
    }

    /// Initializes a brand-new repository at `<project>/<dirName>` and
    /// registers it. The target directory must not already exist.
    pub fn git_repo_init(
        &self,
        project_id: &str,
        dir_name: &str,
        name: Option<String>,
    ) -> BackendResult<GitRepository> {
        if !is_safe_dir_name(dir_name) {
            return Err(BackendError::InvalidName(dir_name.to_string()));
        }
        self.with_ctx(|ctx| {
            let project = projects::get(ctx, project_id)?;
            let target = ctx.root.join(&project.project_path).join(dir_name);
            if target.exists() {
                return Err(BackendError::TargetAlreadyExists(
                    target.display().to_string(),
                ));
            }
            Repository::init(&target)?;
            let record = GitRepository {
                id: uuid::Uuid::new_v4().to_string(),
                project_id: project_id.to_string(),
                name: name.unwrap_or_else(|| dir_name.to_string()),
                path: target.display().to_string(),
                remote_url: None,
                branch: None,
                last_sync_at: None,
                last_status_checked_at: None,
            };
            repos::insert(ctx, &record)?;
            Ok(record)
        })
    }

    /// Clones into `<project>/<targetDirName>`, blocking until the clone
    /// finishes, fails, or is cancelled. Progress streams through `sink`.
    pub fn git_repo_clone(
        &self,
        project_id: &str,
        input: GitCloneInput,
        sink: &ProgressSink,
        cancel: &CancelToken,
    ) -> BackendResult<GitRepository> {
        if !is_safe_dir_name(&input.target_dir_name) {
            return Err(BackendError::InvalidName(input.target_dir_name));
        }
        let target: PathBuf = self.with_ctx(|ctx| {
            let project = projects::get(ctx, project_id)?;
            Ok(ctx.root.join(&project.project_path).join(&input.target_dir_name))
        })?;

        let key = format!("clone:{project_id}/{}", input.target_dir_name);
        let _guard = self.locks.try_begin(&key)?;
        if target.exists() {
            return Err(BackendError::TargetAlreadyExists(
                target.display().to_string(),
            ));
        }

        // Store lock released during the transfer; only the row write below
        // takes it again.
        let outcome = engine::clone(
            &input.remote_url,
            &target,
            input.branch.as_deref(),
            sink,
            cancel,
        )?;

        let record = GitRepository {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            name: input.target_dir_name.clone(),
            path: target.display().to_string(),
            remote_url: outcome.remote_url.or(Some(input.remote_url)),
            branch: outcome.branch,
            last_sync_at: Some(now_iso()),
            last_status_checked_at: None,
        };
        self.with_ctx(|ctx| repos::insert(ctx, &record))?;
        Ok(record)
    }

    /// Thread-spawning variant of `git_repo_clone` for callers that pump
    /// progress off their control thread.
    pub fn git_repo_clone_spawn(
        self: &Arc<Self>,
        project_id: String,
        input: GitCloneInput,
    ) -> OperationHandle<GitRepository> {
        let (sink, events) = ProgressSink::channel();
        let cancel = CancelToken::new();
        let gateway = Arc::clone(self);
        let token = cancel.clone();
        let outcome = std::thread::spawn(move || {
            gateway.git_repo_clone(&project_id, input, &sink, &token)
        });
        OperationHandle {
            events,
            cancel,
            outcome,
        }
    }

    /// Fetch plus fast-forward. Divergence is reported, never auto-merged.
    pub fn git_repo_pull(
        &self,
        repo_id: &str,
        cancel: &CancelToken,
    ) -> BackendResult<PullOutcome> {
        let repo = self.with_ctx(|ctx| repos::get(ctx, repo_id))?;
        let _guard = self.locks.try_begin(repo_id)?;

        match engine::pull(&PathBuf::from(&repo.path), cancel)? {
            PullResult::UpToDate | PullResult::FastForwarded => {
                let synced_at = now_iso();
                self.with_ctx(|ctx| repos::set_last_sync(ctx, repo_id, &synced_at))?;
                Ok(PullOutcome {
                    ok: true,
                    message: None,
                    synced_at: Some(synced_at),
                })
            }
            PullResult::Diverged(message) | PullResult::Blocked(message) => Ok(PullOutcome {
                ok: false,
                message: Some(message),
                synced_at: None,
            }),
        }
    }

    pub fn git_repo_pull_spawn(
        self: &Arc<Self>,
        repo_id: String,
    ) -> OperationHandle<PullOutcome> {
        let (_sink, events) = ProgressSink::channel();
        let cancel = CancelToken::new();
        let gateway = Arc::clone(self);
        let token = cancel.clone();
        let outcome = std::thread::spawn(move || gateway.git_repo_pull(&repo_id, &token));
        OperationHandle {
            events,
            cancel,
            outcome,
        }
    }

    /// Local-only status: dirtiness, branch, ahead/behind against the last
    /// fetched upstream. Never touches the network.
    pub fn git_repo_status_get(&self, repo_id: &str) -> BackendResult<GitRepoStatus> {
        let repo = self.with_ctx(|ctx| repos::get(ctx, repo_id))?;
        let local = engine::local_status(&PathBuf::from(&repo.path))?;
        let status = GitRepoStatus {
            repo_id: repo_id.to_string(),
            branch: local.branch,
            dirty: local.dirty,
            ahead: local.ahead,
            behind: local.behind,
            last_checked_at: now_iso(),
            network: NetworkState::Unknown,
            last_error: None,
        };
        self.with_ctx(|ctx| repos::cache_status(ctx, &status))?;
        Ok(status)
    }

    /// Status with a remote reachability probe. When the remote cannot be
    /// reached the last known branch and dirtiness are preserved and the
    /// result is marked offline; only auth rejection is a hard error.
    pub fn git_repo_status_check(&self, repo_id: &str) -> BackendResult<GitRepoStatus> {
        let repo = self.with_ctx(|ctx| repos::get(ctx, repo_id))?;
        let _guard = self.locks.try_begin(repo_id)?;
        let repo_path = PathBuf::from(&repo.path);
        let cancel = CancelToken::new();

        let status = match engine::probe_remote(&repo_path, &cancel) {
            Ok(()) => {
                let local = engine::local_status(&repo_path)?;
                GitRepoStatus {
                    repo_id: repo_id.to_string(),
                    branch: local.branch,
                    dirty: local.dirty,
                    ahead: local.ahead,
                    behind: local.behind,
                    last_checked_at: now_iso(),
                    network: NetworkState::Online,
                    last_error: None,
                }
            }
            Err(BackendError::GitAuthFailed(message)) => {
                return Err(BackendError::GitAuthFailed(message));
            }
            Err(probe_error) => {
                warn!(repo = %repo_id, error = %probe_error, "remote unreachable, reporting cached status");
                let cached = self.with_ctx(|ctx| repos::cached_status(ctx, repo_id))?;
                let local = engine::local_status(&repo_path).ok();
                let (branch, dirty) = match (&local, &cached) {
                    (Some(local), _) => (local.branch.clone(), local.dirty),
                    (None, Some(cached)) => (cached.branch.clone(), cached.dirty),
                    (None, None) => (repo.branch.clone(), false),
                };
                let (ahead, behind) = cached
                    .as_ref()
                    .map(|c| (c.ahead, c.behind))
                    .unwrap_or((0, 0));
                GitRepoStatus {
                    repo_id: repo_id.to_string(),
                    branch,
                    dirty,
                    ahead,
                    behind,
                    last_checked_at: now_iso(),
                    network: NetworkState::Offline,
                    last_error: Some(probe_error.to_string()),
                }
            }
        };
        self.with_ctx(|ctx| repos::cache_status(ctx, &status))?;
        Ok(status)
    }

    /// Unregisters the repository; the working tree stays on disk.
    pub fn git_repo_forget(&self, repo_id: &str) -> BackendResult<()> {
        self.with_ctx(|ctx| repos::forget(ctx, repo_id))
    }
}
