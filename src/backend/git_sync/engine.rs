use std::path::Path;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    BranchType, Cred, CredentialType, FetchOptions, RemoteCallbacks, Repository, StatusOptions,
};
use tracing::{debug, info, warn};

use crate::backend::git_sync::progress::{CancelToken, ClonePhase, ProgressEvent, ProgressSink};
use crate::error::{BackendError, BackendResult};

pub(crate) struct CloneOutcome {
    pub branch: Option<String>,
    pub remote_url: Option<String>,
}

#[derive(Debug, PartialEq)]
pub(crate) enum PullResult {
    UpToDate,
    FastForwarded,
    Diverged(String),
    Blocked(String),
}

pub(crate) struct LocalStatus {
    pub branch: Option<String>,
    pub dirty: bool,
    pub ahead: usize,
    pub behind: usize,
}

/// Clones `remote_url` into `target`, streaming transfer and checkout
/// progress. The caller has already verified the target does not exist and
/// holds the in-flight guard for it.
pub(crate) fn clone(
    remote_url: &str,
    target: &Path,
    branch: Option<&str>,
    sink: &ProgressSink,
    cancel: &CancelToken,
) -> BackendResult<CloneOutcome> {
    if target.exists() {
        return Err(BackendError::TargetAlreadyExists(
            target.display().to_string(),
        ));
    }
    info!(remote = %remote_url, target = %target.display(), "clone starting");

    let sink_events = sink;
    let cancel_events = cancel.clone();
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(credential_callback());
    callbacks.transfer_progress(move |stats| {
        if cancel_events.is_cancelled() {
            return false;
        }
        if stats.received_objects() < stats.total_objects() {
            sink_events.emit(ProgressEvent {
                phase: ClonePhase::Receiving,
                received: stats.received_objects(),
                total: stats.total_objects(),
                message: None,
            });
        } else {
            sink_events.emit(ProgressEvent {
                phase: ClonePhase::Resolving,
                received: stats.indexed_deltas(),
                total: stats.total_deltas(),
                message: None,
            });
        }
        true
    });

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);

    let mut checkout = CheckoutBuilder::new();
    checkout.progress(|_path, completed, total| {
        sink.emit(ProgressEvent {
            phase: ClonePhase::Checkout,
            received: completed,
            total,
            message: None,
        });
    });

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options);
    builder.with_checkout(checkout);
    if let Some(branch) = branch {
        builder.branch(branch);
    }

    let repo = builder
        .clone(remote_url, target)
        .map_err(|e| classify(e, cancel))?;

    let branch = head_shorthand(&repo);
    let remote_url = repo
        .find_remote("origin")
        .ok()
        .and_then(|remote| remote.url().map(str::to_string));
    info!(target = %target.display(), branch = ?branch, "clone finished");
    Ok(CloneOutcome { branch, remote_url })
}

/// Fetch from origin, then apply the result only when it is a fast-forward.
/// Anything requiring a real merge comes back as `Diverged` so the caller
/// can surface it without touching the working tree.
pub(crate) fn pull(repo_path: &Path, cancel: &CancelToken) -> BackendResult<PullResult> {
    let repo = Repository::open(repo_path)?;
    let branch = head_shorthand(&repo).ok_or_else(|| {
        BackendError::Git(git2::Error::from_str("repository HEAD is not a branch"))
    })?;

    fetch_branch(&repo, &branch, cancel)?;

    let fetch_head = repo.find_reference("FETCH_HEAD")?;
    let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;
    let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

    if analysis.is_up_to_date() {
        debug!(repo = %repo_path.display(), "pull: already up to date");
        return Ok(PullResult::UpToDate);
    }
    if analysis.is_fast_forward() {
        // Applying the fast-forward checks files out; uncommitted edits to
        // tracked files must survive, so a dirty tree blocks the pull
        // instead of being overwritten.
        let mut options = StatusOptions::new();
        options.include_untracked(false);
        let statuses = repo.statuses(Some(&mut options))?;
        if !statuses.is_empty() {
            warn!(repo = %repo_path.display(), branch = %branch, "pull: blocked by uncommitted changes");
            return Ok(PullResult::Blocked(format!(
                "branch {branch} has uncommitted changes; commit or stash them before pulling"
            )));
        }
        let refname = format!("refs/heads/{branch}");
        let mut reference = repo.find_reference(&refname)?;
        reference.set_target(fetch_commit.id(), "fast-forward pull")?;
        repo.set_head(&refname)?;
        repo.checkout_head(Some(&mut CheckoutBuilder::default()))?;
        info!(repo = %repo_path.display(), branch = %branch, "pull: fast-forwarded");
        return Ok(PullResult::FastForwarded);
    }
    warn!(repo = %repo_path.display(), branch = %branch, "pull: local and remote histories diverged");
    Ok(PullResult::Diverged(format!(
        "branch {branch} has diverged from its upstream; resolve manually"
    )))
}

/// Dirtiness, current branch, and ahead/behind counts without touching the
/// network. Missing upstream reads as 0/0.
pub(crate) fn local_status(repo_path: &Path) -> BackendResult<LocalStatus> {
    let repo = Repository::open(repo_path)?;
    let branch = head_shorthand(&repo);

    let mut options = StatusOptions::new();
    options.include_untracked(true);
    let statuses = repo.statuses(Some(&mut options))?;
    let dirty = !statuses.is_empty();

    let (ahead, behind) = match &branch {
        Some(name) => ahead_behind(&repo, name).unwrap_or((0, 0)),
        None => (0, 0),
    };

    Ok(LocalStatus {
        branch,
        dirty,
        ahead,
        behind,
    })
}

/// Probes remote reachability by fetching the current branch from origin.
/// Returns `Ok(())` when the remote answered; the caller maps failures onto
/// the offline status path.
pub(crate) fn probe_remote(repo_path: &Path, cancel: &CancelToken) -> BackendResult<()> {
    let repo = Repository::open(repo_path)?;
    let branch = head_shorthand(&repo).ok_or_else(|| {
        BackendError::Git(git2::Error::from_str("repository HEAD is not a branch"))
    })?;
    fetch_branch(&repo, &branch, cancel)
}

fn fetch_branch(repo: &Repository, branch: &str, cancel: &CancelToken) -> BackendResult<()> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(credential_callback());
    let cancel = cancel.clone();
    callbacks.transfer_progress(move |_stats| !cancel.is_cancelled());

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);

    let mut remote = repo.find_remote("origin")?;
    remote
        .fetch(&[branch], Some(&mut fetch_options), None)
        .map_err(BackendError::from)
}

fn ahead_behind(repo: &Repository, branch_name: &str) -> Option<(usize, usize)> {
    let branch = repo.find_branch(branch_name, BranchType::Local).ok()?;
    let upstream = branch.upstream().ok()?;
    let local_oid = branch.get().target()?;
    let upstream_oid = upstream.get().target()?;
    repo.graph_ahead_behind(local_oid, upstream_oid).ok()
}

fn head_shorthand(repo: &Repository) -> Option<String> {
    repo.head().ok().and_then(|h| h.shorthand().map(str::to_string))
}

/// Credential order: SSH agent when the remote asks for an SSH key, default
/// credentials otherwise. A second request means the first attempt was
/// rejected, so fail instead of looping.
fn credential_callback(
) -> impl FnMut(&str, Option<&str>, CredentialType) -> Result<Cred, git2::Error> {
    let mut attempts = 0u32;
    move |_url, username_from_url, allowed| {
        attempts += 1;
        if attempts > 2 {
            return Err(git2::Error::new(
                git2::ErrorCode::Auth,
                git2::ErrorClass::Callback,
                "credentials rejected by remote",
            ));
        }
        if allowed.contains(CredentialType::SSH_KEY) {
            Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
        } else {
            Cred::default()
        }
    }
}

fn classify(error: git2::Error, cancel: &CancelToken) -> BackendError {
    if cancel.is_cancelled() {
        return BackendError::OperationCancelled("clone".to_string());
    }
    error.into()
}
