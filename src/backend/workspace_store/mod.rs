pub mod recent;
pub mod store;

pub use recent::RecentIndex;
pub use store::WorkspaceContext;
