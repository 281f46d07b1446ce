use std::path::PathBuf;

use crate::backend::common::dtos::IdeConfig;
use crate::backend::git_sync::repos;
use crate::backend::ide_launch::{launcher, probe};
use crate::backend::project_catalog::projects;
use crate::error::BackendResult;

use super::Gateway;

impl Gateway {
    pub fn ide_list_supported(&self) -> Vec<IdeConfig> {
        probe::list_supported()
    }

    /// Opens a repository's working tree in an IDE. Resolution order:
    /// explicit override, then the project's override, then the workspace
    /// default.
    pub fn ide_open_repo(
        &self,
        repo_id: &str,
        explicit: Option<IdeConfig>,
    ) -> BackendResult<()> {
        let (repo, project_override, workspace_default) = self.with_ctx(|ctx| {
            let repo = repos::get(ctx, repo_id)?;
            let project = projects::get(ctx, &repo.project_id)?;
            let settings = ctx.settings()?;
            Ok((repo, project.ide_override, settings.default_ide))
        })?;
        let config = launcher::resolve_config(explicit, project_override, workspace_default)?;
        launcher::launch(&config, &PathBuf::from(repo.path))
    }
}
