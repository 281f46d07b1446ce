pub mod common;
pub mod file_browser;
pub mod gateway;
pub mod git_sync;
pub mod ide_launch;
pub mod project_catalog;
pub mod workspace_store;
