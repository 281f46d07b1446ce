use std::fs;
use std::path::{Path, PathBuf};

use git2::{Repository, Signature};

use atelier_core::{CancelToken, Gateway, GitCloneInput, NetworkState, ProgressSink, ProjectCreateInput};

fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) {
    let workdir = repo.workdir().unwrap();
    fs::write(workdir.join(name), content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::now("tester", "tester@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap();
}

struct Fixture {
    _home: tempfile::TempDir,
    _ws: tempfile::TempDir,
    remote_dir: tempfile::TempDir,
    gw: Gateway,
    project_id: String,
    project_dir: PathBuf,
    remote_branch: String,
}

fn fixture() -> Fixture {
    let home = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();
    let remote_dir = tempfile::tempdir().unwrap();

    let remote = Repository::init(remote_dir.path()).unwrap();
    commit_file(&remote, "README.md", "# fixture", "initial commit");
    let remote_branch = remote.head().unwrap().shorthand().unwrap().to_string();

    let gw = Gateway::with_recent_index(home.path().join("recent.json"));
    gw.workspace_init_or_open(ws.path()).unwrap();
    let project = gw
        .project_create(ProjectCreateInput {
            name: "App".to_string(),
            description: None,
            project_path: None,
        })
        .unwrap();
    let project_dir = ws.path().join(&project.project_path);

    Fixture {
        _home: home,
        _ws: ws,
        remote_dir,
        gw,
        project_id: project.id,
        project_dir,
        remote_branch,
    }
}

fn remote_url(f: &Fixture) -> String {
    f.remote_dir.path().display().to_string()
}

fn clone_input(f: &Fixture, target: &str) -> GitCloneInput {
    GitCloneInput {
        remote_url: remote_url(f),
        target_dir_name: target.to_string(),
        branch: None,
    }
}

#[test]
fn clone_registers_a_repository_row() {
    let f = fixture();
    let record = f
        .gw
        .git_repo_clone(
            &f.project_id,
            clone_input(&f, "api"),
            &ProgressSink::disabled(),
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(record.branch.as_deref(), Some(f.remote_branch.as_str()));
    assert!(record.last_sync_at.is_some());
    assert!(f.project_dir.join("api/README.md").is_file());

    let listed = f.gw.git_repo_list(Some(&f.project_id)).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, record.id);
}

#[test]
fn clone_streams_progress_events() {
    let f = fixture();
    let (sink, events) = ProgressSink::channel();
    f.gw
        .git_repo_clone(&f.project_id, clone_input(&f, "api"), &sink, &CancelToken::new())
        .unwrap();
    drop(sink);
    let received: Vec<_> = events.iter().collect();
    assert!(!received.is_empty(), "a clone reports at least one event");
}

#[test]
fn clone_into_an_existing_target_is_refused() {
    let f = fixture();
    fs::create_dir(f.project_dir.join("api")).unwrap();
    let err = f
        .gw
        .git_repo_clone(
            &f.project_id,
            clone_input(&f, "api"),
            &ProgressSink::disabled(),
            &CancelToken::new(),
        )
        .unwrap_err();
    assert_eq!(err.code(), "TargetAlreadyExists");
    assert!(f.gw.git_repo_list(Some(&f.project_id)).unwrap().is_empty());
}

#[test]
fn clone_rejects_unsafe_target_names() {
    let f = fixture();
    let err = f
        .gw
        .git_repo_clone(
            &f.project_id,
            GitCloneInput {
                remote_url: remote_url(&f),
                target_dir_name: "../escape".to_string(),
                branch: None,
            },
            &ProgressSink::disabled(),
            &CancelToken::new(),
        )
        .unwrap_err();
    assert_eq!(err.code(), "InvalidName");
}

#[test]
fn cancelled_clone_writes_no_row() {
    let f = fixture();
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = f
        .gw
        .git_repo_clone(
            &f.project_id,
            clone_input(&f, "api"),
            &ProgressSink::disabled(),
            &cancel,
        )
        .unwrap_err();
    assert_eq!(err.code(), "OperationCancelled");
    assert!(f.gw.git_repo_list(Some(&f.project_id)).unwrap().is_empty());
}

#[test]
fn pull_reports_up_to_date() {
    let f = fixture();
    let record = f
        .gw
        .git_repo_clone(
            &f.project_id,
            clone_input(&f, "api"),
            &ProgressSink::disabled(),
            &CancelToken::new(),
        )
        .unwrap();
    let outcome = f.gw.git_repo_pull(&record.id, &CancelToken::new()).unwrap();
    assert!(outcome.ok);
    assert!(outcome.synced_at.is_some());
}

#[test]
fn pull_fast_forwards_new_remote_commits() {
    let f = fixture();
    let record = f
        .gw
        .git_repo_clone(
            &f.project_id,
            clone_input(&f, "api"),
            &ProgressSink::disabled(),
            &CancelToken::new(),
        )
        .unwrap();

    let remote = Repository::open(f.remote_dir.path()).unwrap();
    commit_file(&remote, "CHANGELOG.md", "v2", "second commit");

    let outcome = f.gw.git_repo_pull(&record.id, &CancelToken::new()).unwrap();
    assert!(outcome.ok);
    assert!(f.project_dir.join("api/CHANGELOG.md").is_file());

    let clone = Repository::open(f.project_dir.join("api")).unwrap();
    let local_head = clone.head().unwrap().target().unwrap();
    let remote_head = remote.head().unwrap().target().unwrap();
    assert_eq!(local_head, remote_head);
}

#[test]
fn diverged_histories_fail_the_pull_without_merging() {
    let f = fixture();
    let record = f
        .gw
        .git_repo_clone(
            &f.project_id,
            clone_input(&f, "api"),
            &ProgressSink::disabled(),
            &CancelToken::new(),
        )
        .unwrap();

    let clone = Repository::open(f.project_dir.join("api")).unwrap();
    commit_file(&clone, "local.txt", "local", "local work");
    let head_before = clone.head().unwrap().target().unwrap();

    let remote = Repository::open(f.remote_dir.path()).unwrap();
    commit_file(&remote, "remote.txt", "remote", "remote work");

    let outcome = f.gw.git_repo_pull(&record.id, &CancelToken::new()).unwrap();
    assert!(!outcome.ok);
    assert!(outcome.message.unwrap().contains("diverged"));
    assert!(outcome.synced_at.is_none());
    assert_eq!(clone.head().unwrap().target().unwrap(), head_before);
}

#[test]
fn uncommitted_edits_block_the_pull_instead_of_being_overwritten() {
    let f = fixture();
    let record = f
        .gw
        .git_repo_clone(
            &f.project_id,
            clone_input(&f, "api"),
            &ProgressSink::disabled(),
            &CancelToken::new(),
        )
        .unwrap();

    fs::write(f.project_dir.join("api/README.md"), "local edit").unwrap();
    let remote = Repository::open(f.remote_dir.path()).unwrap();
    commit_file(&remote, "README.md", "v2", "remote rewrite");

    let outcome = f.gw.git_repo_pull(&record.id, &CancelToken::new()).unwrap();
    assert!(!outcome.ok);
    assert!(outcome.message.unwrap().contains("uncommitted"));
    assert!(outcome.synced_at.is_none());
    assert_eq!(
        fs::read_to_string(f.project_dir.join("api/README.md")).unwrap(),
        "local edit"
    );
}

#[test]
fn init_creates_and_registers_a_new_repository() {
    let f = fixture();
    let record = f.gw.git_repo_init(&f.project_id, "fresh", None).unwrap();
    assert_eq!(record.name, "fresh");
    assert!(record.remote_url.is_none());
    assert!(Repository::open(f.project_dir.join("fresh")).is_ok());
    assert_eq!(f.gw.git_repo_list(Some(&f.project_id)).unwrap().len(), 1);

    let err = f.gw.git_repo_init(&f.project_id, "fresh", None).unwrap_err();
    assert_eq!(err.code(), "TargetAlreadyExists");
    let err = f.gw.git_repo_init(&f.project_id, "../x", None).unwrap_err();
    assert_eq!(err.code(), "InvalidName");
}

#[test]
fn status_get_is_local_only() {
    let f = fixture();
    let record = f
        .gw
        .git_repo_clone(
            &f.project_id,
            clone_input(&f, "api"),
            &ProgressSink::disabled(),
            &CancelToken::new(),
        )
        .unwrap();

    let status = f.gw.git_repo_status_get(&record.id).unwrap();
    assert_eq!(status.network, NetworkState::Unknown);
    assert!(!status.dirty);
    assert_eq!(status.branch.as_deref(), Some(f.remote_branch.as_str()));

    fs::write(f.project_dir.join("api/scratch.txt"), "wip").unwrap();
    let status = f.gw.git_repo_status_get(&record.id).unwrap();
    assert!(status.dirty);
}

#[test]
fn status_check_reports_behind_when_remote_advanced() {
    let f = fixture();
    let record = f
        .gw
        .git_repo_clone(
            &f.project_id,
            clone_input(&f, "api"),
            &ProgressSink::disabled(),
            &CancelToken::new(),
        )
        .unwrap();

    let remote = Repository::open(f.remote_dir.path()).unwrap();
    commit_file(&remote, "CHANGELOG.md", "v2", "second commit");

    let status = f.gw.git_repo_status_check(&record.id).unwrap();
    assert_eq!(status.network, NetworkState::Online);
    assert_eq!(status.behind, 1);
    assert_eq!(status.ahead, 0);
}

#[test]
fn unreachable_remote_degrades_to_offline_with_cached_fields() {
    let f = fixture();
    let record = f
        .gw
        .git_repo_clone(
            &f.project_id,
            clone_input(&f, "api"),
            &ProgressSink::disabled(),
            &CancelToken::new(),
        )
        .unwrap();
    f.gw.git_repo_status_get(&record.id).unwrap();

    // Point origin somewhere that does not exist.
    let clone = Repository::open(f.project_dir.join("api")).unwrap();
    clone
        .remote_set_url("origin", "/nonexistent/definitely/missing")
        .unwrap();

    let status = f.gw.git_repo_status_check(&record.id).unwrap();
    assert_eq!(status.network, NetworkState::Offline);
    assert!(status.last_error.is_some());
    assert_eq!(status.branch.as_deref(), Some(f.remote_branch.as_str()));
}

#[test]
fn register_and_forget_an_existing_worktree() {
    let f = fixture();
    let tree = f.project_dir.join("legacy");
    fs::create_dir(&tree).unwrap();
    let repo = Repository::init(&tree).unwrap();
    commit_file(&repo, "notes.txt", "hello", "initial commit");

    let record = f
        .gw
        .git_repo_register(&f.project_id, "legacy", None)
        .unwrap();
    assert_eq!(record.name, "legacy");
    assert!(record.branch.is_some());

    f.gw.git_repo_forget(&record.id).unwrap();
    assert!(f.gw.git_repo_list(Some(&f.project_id)).unwrap().is_empty());
    assert!(tree.join("notes.txt").is_file(), "working tree stays on disk");

    let err = f.gw.git_repo_forget(&record.id).unwrap_err();
    assert_eq!(err.code(), "RepoNotFound");
}

#[test]
fn registering_a_plain_directory_fails() {
    let f = fixture();
    fs::create_dir(f.project_dir.join("plain")).unwrap();
    let err = f
        .gw
        .git_repo_register(&f.project_id, "plain", None)
        .unwrap_err();
    assert_eq!(err.code(), "InvalidPath");
}

#[test]
fn opening_a_repo_without_any_ide_config_errors() {
    let f = fixture();
    let tree = f.project_dir.join("legacy");
    fs::create_dir(&tree).unwrap();
    let repo = Repository::init(&tree).unwrap();
    commit_file(&repo, "notes.txt", "hello", "initial commit");
    let record = f
        .gw
        .git_repo_register(&f.project_id, "legacy", None)
        .unwrap();

    let err = f.gw.ide_open_repo(&record.id, None).unwrap_err();
    assert_eq!(err.code(), "IdeNotConfigured");
}
