use crate::backend::common::dtos::{
    DirTypeCreateInput, DirTypePatch, DirectoryType, Project, ProjectCreateInput,
    ProjectDirBindInput, ProjectDirectory, ProjectPatch,
};
use crate::backend::project_catalog::{dir_types, projects};
use crate::error::BackendResult;

use super::Gateway;

impl Gateway {
    pub fn project_list(&self) -> BackendResult<Vec<Project>> {
        self.with_ctx(projects::list)
    }

    pub fn project_create(&self, input: ProjectCreateInput) -> BackendResult<Project> {
        self.with_ctx(|ctx| projects::create(ctx, input))
    }

    pub fn project_get(&self, project_id: &str) -> BackendResult<Project> {
        self.with_ctx(|ctx| projects::get(ctx, project_id))
    }

    pub fn project_update(&self, project_id: &str, patch: ProjectPatch) -> BackendResult<Project> {
        self.with_ctx(|ctx| projects::update(ctx, project_id, patch))
    }

    pub fn project_delete(&self, project_id: &str) -> BackendResult<()> {
        self.with_ctx(|ctx| projects::delete(ctx, project_id))
    }

    pub fn dir_types_list(&self) -> BackendResult<Vec<DirectoryType>> {
        self.with_ctx(dir_types::list)
    }

    pub fn dir_type_create_custom(&self, input: DirTypeCreateInput) -> BackendResult<DirectoryType> {
        self.with_ctx(|ctx| dir_types::create_custom(ctx, input))
    }

    pub fn dir_type_update(
        &self,
        dir_type_id: &str,
        patch: DirTypePatch,
    ) -> BackendResult<DirectoryType> {
        self.with_ctx(|ctx| dir_types::update(ctx, dir_type_id, patch))
    }

    pub fn project_dirs_list(&self, project_id: &str) -> BackendResult<Vec<ProjectDirectory>> {
        self.with_ctx(|ctx| dir_types::list_project_dirs(ctx, project_id))
    }

    pub fn project_dir_bind(&self, input: ProjectDirBindInput) -> BackendResult<ProjectDirectory> {
        self.with_ctx(|ctx| dir_types::bind_project_dir(ctx, input))
    }
}
