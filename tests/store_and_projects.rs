use atelier_core::{
    DirTypeCreateInput, Gateway, ProjectCreateInput, ProjectDirBindInput, ProjectPatch, ThemeMode,
    WorkspaceSettingsPatch,
};

fn gateway(home: &tempfile::TempDir) -> Gateway {
    Gateway::with_recent_index(home.path().join("recent.json"))
}

fn create_input(name: &str) -> ProjectCreateInput {
    ProjectCreateInput {
        name: name.to_string(),
        description: None,
        project_path: None,
    }
}

#[test]
fn operations_require_an_open_workspace() {
    let home = tempfile::tempdir().unwrap();
    let gw = gateway(&home);
    let err = gw.project_list().unwrap_err();
    assert_eq!(err.code(), "WorkspaceNotOpen");
    let err = gw.workspace_settings_get().unwrap_err();
    assert_eq!(err.code(), "WorkspaceNotOpen");
}

#[test]
fn init_or_open_is_idempotent() {
    let home = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();
    let gw = gateway(&home);

    let first = gw.workspace_init_or_open(ws.path()).unwrap();
    let second = gw.workspace_init_or_open(ws.path()).unwrap();
    assert_eq!(first.db_path, second.db_path);
    assert!(second.last_opened_at >= first.last_opened_at);

    let recent = gw.workspace_list_recent();
    assert_eq!(recent.len(), 1, "reopening must not duplicate the entry");
    assert_eq!(recent[0].path, first.path);
}

#[test]
fn open_rejects_a_missing_directory() {
    let home = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();
    let gw = gateway(&home);
    let err = gw
        .workspace_init_or_open(&ws.path().join("missing"))
        .unwrap_err();
    assert_eq!(err.code(), "InvalidWorkspacePath");
}

#[test]
fn recent_alias_survives_reopen_and_removal_works() {
    let home = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();
    let gw = gateway(&home);

    let info = gw.workspace_init_or_open(ws.path()).unwrap();
    gw.workspace_update_alias(&info.path, Some("main".to_string()))
        .unwrap();
    let info = gw.workspace_init_or_open(ws.path()).unwrap();
    assert_eq!(info.alias.as_deref(), Some("main"));

    gw.workspace_remove_recent(&info.path).unwrap();
    assert!(gw.workspace_list_recent().is_empty());
}

#[test]
fn settings_merge_and_persist_across_reopen() {
    let home = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();
    let gw = gateway(&home);
    gw.workspace_init_or_open(ws.path()).unwrap();

    assert_eq!(
        gw.workspace_settings_get().unwrap().theme_mode,
        ThemeMode::System
    );
    gw.workspace_settings_update(WorkspaceSettingsPatch {
        theme_mode: Some(ThemeMode::Dark),
        ..Default::default()
    })
    .unwrap();

    gw.workspace_init_or_open(ws.path()).unwrap();
    let settings = gw.workspace_settings_get().unwrap();
    assert_eq!(settings.theme_mode, ThemeMode::Dark);
}

#[test]
fn project_round_trip_and_collision_suffixes() {
    let home = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();
    let gw = gateway(&home);
    gw.workspace_init_or_open(ws.path()).unwrap();

    let first = gw.project_create(create_input("My App")).unwrap();
    assert_eq!(first.project_path, "my-app");
    assert!(ws.path().join("my-app").is_dir());

    let fetched = gw.project_get(&first.id).unwrap();
    assert_eq!(fetched.name, "My App");

    let second = gw.project_create(create_input("My App")).unwrap();
    assert_eq!(second.project_path, "my-app-2");
}

#[test]
fn project_update_clears_with_explicit_null() {
    let home = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();
    let gw = gateway(&home);
    gw.workspace_init_or_open(ws.path()).unwrap();

    let project = gw
        .project_create(ProjectCreateInput {
            name: "App".to_string(),
            description: Some("temporary".to_string()),
            project_path: None,
        })
        .unwrap();

    let patch: ProjectPatch = serde_json::from_str(r#"{"description":null}"#).unwrap();
    let updated = gw.project_update(&project.id, patch).unwrap();
    assert!(updated.description.is_none());
    assert_eq!(updated.name, "App", "untouched fields survive the patch");
}

#[test]
fn project_delete_is_metadata_only_and_not_repeatable() {
    let home = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();
    let gw = gateway(&home);
    gw.workspace_init_or_open(ws.path()).unwrap();

    let project = gw.project_create(create_input("App")).unwrap();
    gw.project_delete(&project.id).unwrap();
    assert!(ws.path().join("app").is_dir(), "directory stays on disk");

    let err = gw.project_delete(&project.id).unwrap_err();
    assert_eq!(err.code(), "ProjectNotFound");
    let err = gw.project_get(&project.id).unwrap_err();
    assert_eq!(err.code(), "ProjectNotFound");
}

#[test]
fn builtin_dir_types_seed_once_and_bind_upserts() {
    let home = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();
    let gw = gateway(&home);
    gw.workspace_init_or_open(ws.path()).unwrap();
    gw.workspace_init_or_open(ws.path()).unwrap();

    let types = gw.dir_types_list().unwrap();
    assert_eq!(types.len(), 4);

    let project = gw.project_create(create_input("App")).unwrap();
    let bind = |path: &str| {
        gw.project_dir_bind(ProjectDirBindInput {
            project_id: project.id.clone(),
            dir_type_id: types[0].id.clone(),
            relative_path: path.to_string(),
        })
        .unwrap()
    };
    let first = bind("src");
    let second = bind("source");
    assert_eq!(first.id, second.id);
    assert_eq!(second.relative_path, "source");
    assert_eq!(gw.project_dirs_list(&project.id).unwrap().len(), 1);
}

#[test]
fn custom_dir_types_join_the_listing() {
    let home = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();
    let gw = gateway(&home);
    gw.workspace_init_or_open(ws.path()).unwrap();

    gw.dir_type_create_custom(DirTypeCreateInput {
        name: "Research".to_string(),
        icon: None,
        sort_order: None,
    })
    .unwrap();
    assert_eq!(gw.dir_types_list().unwrap().len(), 5);
}
