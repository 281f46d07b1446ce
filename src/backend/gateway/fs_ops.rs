use std::path::PathBuf;

use crate::backend::common::dtos::{FileNode, MutationOutcome, PreviewKind};
use crate::backend::file_browser::{browser, preview};
use crate::backend::project_catalog::projects;
use crate::error::BackendResult;

use super::Gateway;

impl Gateway {
    pub fn fs_tree(&self, project_id: &str, relative: &str) -> BackendResult<Vec<FileNode>> {
        let root = self.project_root(project_id)?;
        browser::tree(&root, relative)
    }

    pub fn fs_read_text(&self, project_id: &str, relative: &str) -> BackendResult<String> {
        let root = self.project_root(project_id)?;
        browser::read_text(&root, relative)
    }

    pub fn fs_create_dir(
        &self,
        project_id: &str,
        relative: &str,
    ) -> BackendResult<MutationOutcome> {
        let root = self.project_root(project_id)?;
        browser::create_dir(&root, relative)
    }

    pub fn fs_delete(&self, project_id: &str, relative: &str) -> BackendResult<MutationOutcome> {
        let root = self.project_root(project_id)?;
        browser::delete(&root, relative)
    }

    pub fn fs_rename(
        &self,
        project_id: &str,
        from: &str,
        to: &str,
    ) -> BackendResult<MutationOutcome> {
        let root = self.project_root(project_id)?;
        browser::rename(&root, from, to)
    }

    pub fn fs_preview_detect(&self, path: &str) -> PreviewKind {
        preview::detect(path)
    }

    fn project_root(&self, project_id: &str) -> BackendResult<PathBuf> {
        self.with_ctx(|ctx| {
            let project = projects::get(ctx, project_id)?;
            Ok(ctx.root.join(project.project_path))
        })
    }
}
