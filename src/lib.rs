pub mod backend;
pub mod error;
pub mod telemetry;

pub use backend::common::dtos::{
    DirTypeCreateInput, DirTypePatch, DirectoryType, DirectoryTypeKind, FileNode, FileNodeKind,
    GitCloneInput, GitRepoStatus, GitRepository, IdeConfig, IdeKind, MutationOutcome, NetworkState,
    PreviewKind, Project, ProjectCreateInput, ProjectDirBindInput, ProjectDirectory,
    ProjectDisplay, ProjectPatch, PullOutcome, ThemeMode, WorkspaceInfo, WorkspaceSettings,
    WorkspaceSettingsPatch,
};
pub use backend::gateway::{Gateway, OperationHandle};
pub use backend::git_sync::progress::{CancelToken, ClonePhase, ProgressEvent, ProgressSink};
pub use backend::workspace_store::recent::RecentEntry;
pub use error::{BackendError, BackendResult};
