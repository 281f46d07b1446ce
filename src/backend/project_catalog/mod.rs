pub mod dir_types;
pub mod projects;
