use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Failure taxonomy for every operation crossing the gateway boundary.
///
/// Degraded-but-expected outcomes (pull divergence, offline status checks,
/// filesystem mutation feedback) are *not* errors; they are returned as
/// structured `{ok, message}` payloads instead.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("workspace path is not an existing directory: {0}")]
    InvalidWorkspacePath(String),

    #[error("workspace directory is not writable: {0}")]
    WorkspacePermissionDenied(String),

    #[error("workspace store is corrupt: {0}")]
    WorkspaceCorrupt(String),

    #[error("no workspace is currently open")]
    WorkspaceNotOpen,

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("repository not found: {0}")]
    RepoNotFound(String),

    #[error("directory type not found: {0}")]
    DirTypeNotFound(String),

    #[error("{0}")]
    InvalidName(String),

    #[error("{0}")]
    InvalidPath(String),

    #[error("path resolves outside the project root: {0}")]
    PathOutsideProject(String),

    #[error("file exceeds the preview size limit: {0}")]
    FileTooLarge(String),

    #[error("target already exists: {0}")]
    TargetAlreadyExists(String),

    #[error("another operation is already running for {0}")]
    OperationInProgress(String),

    #[error("operation was cancelled: {0}")]
    OperationCancelled(String),

    #[error("authentication rejected by remote: {0}")]
    GitAuthFailed(String),

    #[error("remote is unreachable: {0}")]
    GitOffline(String),

    #[error(transparent)]
    Git(git2::Error),

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no IDE is configured for this repository")]
    IdeNotConfigured,

    #[error("IDE executable not found: {0}")]
    IdeNotFound(String),

    #[error("failed to launch IDE: {0}")]
    IdeLaunchFailed(String),

    #[error("{0}")]
    InvalidIdeConfig(String),
}

impl BackendError {
    /// Stable machine-readable code consumed by the UI shell.
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::InvalidWorkspacePath(_) => "InvalidWorkspacePath",
            BackendError::WorkspacePermissionDenied(_) => "WorkspacePermissionDenied",
            BackendError::WorkspaceCorrupt(_) => "WorkspaceCorrupt",
            BackendError::WorkspaceNotOpen => "WorkspaceNotOpen",
            BackendError::ProjectNotFound(_) => "ProjectNotFound",
            BackendError::RepoNotFound(_) => "RepoNotFound",
            BackendError::DirTypeNotFound(_) => "DirTypeNotFound",
            BackendError::InvalidName(_) => "InvalidName",
            BackendError::InvalidPath(_) => "InvalidPath",
            BackendError::PathOutsideProject(_) => "PathOutsideProject",
            BackendError::FileTooLarge(_) => "FileTooLarge",
            BackendError::TargetAlreadyExists(_) => "TargetAlreadyExists",
            BackendError::OperationInProgress(_) => "OperationInProgress",
            BackendError::OperationCancelled(_) => "OperationCancelled",
            BackendError::GitAuthFailed(_) => "GitAuthFailed",
            BackendError::GitOffline(_) => "GitOffline",
            BackendError::Git(_) => "GitError",
            BackendError::Storage(_) => "StorageError",
            BackendError::Io(_) => "IoError",
            BackendError::IdeNotConfigured => "IdeNotConfigured",
            BackendError::IdeNotFound(_) => "IdeNotFound",
            BackendError::IdeLaunchFailed(_) => "IdeLaunchFailed",
            BackendError::InvalidIdeConfig(_) => "InvalidIdeConfig",
        }
    }
}

impl From<git2::Error> for BackendError {
    fn from(error: git2::Error) -> Self {
        match (error.class(), error.code()) {
            (_, git2::ErrorCode::Auth) => BackendError::GitAuthFailed(error.message().to_string()),
            (git2::ErrorClass::Net, _) => BackendError::GitOffline(error.message().to_string()),
            _ => BackendError::Git(error),
        }
    }
}

impl Serialize for BackendError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("BackendError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type BackendResult<T> = Result<T, BackendError>;
