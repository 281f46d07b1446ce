use std::fs;

use atelier_core::{FileNodeKind, Gateway, PreviewKind, ProjectCreateInput};

struct Fixture {
    _home: tempfile::TempDir,
    ws: tempfile::TempDir,
    gw: Gateway,
    project_id: String,
    project_dir: std::path::PathBuf,
}

fn fixture() -> Fixture {
    let home = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();
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
    fs::create_dir(project_dir.join("src")).unwrap();
    fs::write(project_dir.join("src/main.rs"), "fn main() {}").unwrap();
    fs::write(project_dir.join("README.md"), "# app").unwrap();
    Fixture {
        _home: home,
        ws,
        gw,
        project_id: project.id,
        project_dir,
    }
}

#[test]
fn tree_lists_one_level_directories_first() {
    let f = fixture();
    let nodes = f.gw.fs_tree(&f.project_id, "").unwrap();
    let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["src", "README.md"]);
    assert_eq!(nodes[0].kind, FileNodeKind::Directory);
    assert!(nodes.iter().all(|n| n.children.is_none()));

    let nested = f.gw.fs_tree(&f.project_id, "src").unwrap();
    assert_eq!(nested.len(), 1);
    assert_eq!(nested[0].path, "src/main.rs");
}

#[test]
fn every_fs_operation_rejects_escapes() {
    let f = fixture();
    for escape in ["..", "../other", "src/../../x", "a/b/../../../../etc"] {
        let err = f.gw.fs_tree(&f.project_id, escape).unwrap_err();
        assert_eq!(err.code(), "PathOutsideProject", "tree {escape}");
        let err = f.gw.fs_read_text(&f.project_id, escape).unwrap_err();
        assert_eq!(err.code(), "PathOutsideProject", "read {escape}");
        let err = f.gw.fs_create_dir(&f.project_id, escape).unwrap_err();
        assert_eq!(err.code(), "PathOutsideProject", "create {escape}");
        let err = f.gw.fs_delete(&f.project_id, escape).unwrap_err();
        assert_eq!(err.code(), "PathOutsideProject", "delete {escape}");
    }
    let err = f.gw.fs_read_text(&f.project_id, "/etc/passwd").unwrap_err();
    assert_eq!(err.code(), "PathOutsideProject");
    let err = f
        .gw
        .fs_rename(&f.project_id, "README.md", "../stolen.md")
        .unwrap_err();
    assert_eq!(err.code(), "PathOutsideProject");
}

#[test]
fn read_text_caps_file_size() {
    let f = fixture();
    fs::write(f.project_dir.join("big.log"), vec![b'x'; 1024 * 1024 + 1]).unwrap();
    let err = f.gw.fs_read_text(&f.project_id, "big.log").unwrap_err();
    assert_eq!(err.code(), "FileTooLarge");
    assert_eq!(f.gw.fs_read_text(&f.project_id, "README.md").unwrap(), "# app");
}

#[test]
fn mutations_return_outcomes_instead_of_errors() {
    let f = fixture();

    let outcome = f.gw.fs_create_dir(&f.project_id, "assets").unwrap();
    assert!(outcome.ok);
    assert!(f.project_dir.join("assets").is_dir());

    let outcome = f.gw.fs_create_dir(&f.project_id, "assets").unwrap();
    assert!(!outcome.ok, "existing target is a reported failure");

    let outcome = f.gw.fs_delete(&f.project_id, "missing.txt").unwrap();
    assert!(!outcome.ok);

    let outcome = f.gw.fs_rename(&f.project_id, "README.md", "src").unwrap();
    assert!(!outcome.ok, "rename onto an existing entry is refused");

    let outcome = f
        .gw
        .fs_rename(&f.project_id, "README.md", "GUIDE.md")
        .unwrap();
    assert!(outcome.ok);
    assert!(f.project_dir.join("GUIDE.md").is_file());

    let outcome = f.gw.fs_delete(&f.project_id, "assets").unwrap();
    assert!(outcome.ok);
    assert!(!f.project_dir.join("assets").exists());
}

#[test]
fn workspace_root_never_leaks_between_projects() {
    let f = fixture();
    // A sibling project directory sits inside the same workspace; relative
    // paths from one project must not reach it.
    let other = f
        .gw
        .project_create(ProjectCreateInput {
            name: "Other".to_string(),
            description: None,
            project_path: None,
        })
        .unwrap();
    fs::write(f.ws.path().join(&other.project_path).join("secret.txt"), "s").unwrap();
    let err = f
        .gw
        .fs_read_text(&f.project_id, "../other/secret.txt")
        .unwrap_err();
    assert_eq!(err.code(), "PathOutsideProject");
}

#[test]
fn preview_detection_is_extension_based() {
    let f = fixture();
    assert_eq!(f.gw.fs_preview_detect("logo.PNG"), PreviewKind::Image);
    assert_eq!(f.gw.fs_preview_detect("README.md"), PreviewKind::Markdown);
    assert_eq!(f.gw.fs_preview_detect("archive.zip"), PreviewKind::Unsupported);
    assert_eq!(f.gw.fs_preview_detect("main.rs"), PreviewKind::Text);
    assert_eq!(f.gw.fs_preview_detect("Makefile"), PreviewKind::Text);
}
