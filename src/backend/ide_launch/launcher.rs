use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::info;

use crate::backend::common::dtos::IdeConfig;
use crate::error::{BackendError, BackendResult};

const PATH_PLACEHOLDER: &str = "{path}";

/// Picks the effective IDE for a repository: explicit override first, then
/// the project's override, then the workspace default.
pub(crate) fn resolve_config(
    explicit: Option<IdeConfig>,
    project_override: Option<IdeConfig>,
    workspace_default: Option<IdeConfig>,
) -> BackendResult<IdeConfig> {
    explicit
        .or(project_override)
        .or(workspace_default)
        .ok_or(BackendError::IdeNotConfigured)
}

/// Expands the argument template against the target path. `{path}` may sit
/// anywhere inside an argument (at most once per argument); any other
/// `{...}` token is rejected. Templates without a marker get the target
/// appended as the final argument.
pub(crate) fn substitute_args(config: &IdeConfig, target: &Path) -> BackendResult<Vec<String>> {
    let target = target.to_string_lossy().to_string();
    let template = config.args.clone().unwrap_or_default();

    let mut resolved = Vec::with_capacity(template.len() + 1);
    let mut placeholder_seen = false;
    for arg in template {
        let markers = arg.matches(PATH_PLACEHOLDER).count();
        if markers > 1 {
            return Err(BackendError::InvalidIdeConfig(format!(
                "argument carries more than one path marker: {arg}"
            )));
        }
        let stripped = arg.replace(PATH_PLACEHOLDER, "");
        if stripped.contains('{') || stripped.contains('}') {
            return Err(BackendError::InvalidIdeConfig(format!(
                "unrecognized placeholder in argument template: {arg}"
            )));
        }
        if markers == 1 {
            resolved.push(arg.replace(PATH_PLACEHOLDER, &target));
            placeholder_seen = true;
        } else {
            resolved.push(arg);
        }
    }
    if !placeholder_seen {
        resolved.push(target);
    }
    Ok(resolved)
}

/// Spawns the IDE with discrete arguments and detaches. Exit status is not
/// observed; launching is fire-and-forget.
pub(crate) fn launch(config: &IdeConfig, target: &Path) -> BackendResult<()> {
    let args = substitute_args(config, target)?;
    let spawned = Command::new(&config.exe_path)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    match spawned {
        Ok(_) => {
            info!(ide = %config.name, target = %target.display(), "ide launched");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(BackendError::IdeNotFound(config.exe_path.clone()))
        }
        Err(e) => Err(BackendError::IdeLaunchFailed(e.to_string())),
    }
}
