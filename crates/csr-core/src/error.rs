use csr_engine::EngineError;
use csr_fs::FsError;
use csr_model::{Detected, ErrorCode};
use csr_prompt::PromptError;
use csr_store::StoreError;
use thiserror::Error;

/// A fail-closed umbrella over every collaborator crate's error type,
/// carrying enough information to map onto a single wire code via
/// [`CsrError::to_wire_code`] so the dispatcher never hand-translates an
/// error twice.
#[derive(Debug, Error)]
pub enum CsrError {
    #[error("persistence error: {0}")]
    Store(#[from] StoreError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("filesystem error: {0}")]
    Fs(#[from] FsError),

    #[error("prompt helper error: {0}")]
    Prompt(#[from] PromptError),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("permission denied")]
    PermissionDenied,

    #[error("engine is disabled")]
    EngineDisabled,

    #[error("no such engine")]
    EngineNotExist,

    #[error("no task is running")]
    NoTask,

    #[error("worker pool is busy")]
    Busy,

    /// A remove action reached the UI helper's `remove` response but the
    /// underlying deletion failed; the detection is echoed back so the
    /// caller still has the verdict it prompted on.
    #[error("failed to remove target {}", .0.target_name)]
    RemoveFailed(Box<Detected>),

    #[error("target does not exist: {0}")]
    FileDoNotExist(String),

    /// The target changed (or the wrong path was supplied) between the
    /// detection and the judge call.
    #[error("target changed since detection: {0}")]
    FileChanged(String),

    #[error("filesystem operation failed: {0}")]
    FileSystem(String),

    #[error("user response could not be obtained")]
    UserResponseFailed,

    #[error("internal server error: {0}")]
    System(String),
}

pub type Result<T> = std::result::Result<T, CsrError>;

impl CsrError {
    /// Maps any error raised inside a logic entry point onto the single
    /// wire code the dispatcher returns.
    pub fn to_wire_code(&self) -> ErrorCode {
        match self {
            CsrError::Store(_) => ErrorCode::Db,
            CsrError::Engine(e) => match e {
                EngineError::NotActivated => ErrorCode::EngineNotActivated,
                EngineError::PermissionDenied => ErrorCode::EnginePermission,
                EngineError::Internal(_) => ErrorCode::EngineInternal,
                EngineError::Load(_) | EngineError::MissingSymbol(_) => ErrorCode::EngineInternal,
                EngineError::InvalidString => ErrorCode::EngineInternal,
            },
            CsrError::Fs(e) => match e {
                // Blacklisted is the traversal/forbidden-path rejection,
                // e.g. `..` escaping root -> INVALID_PARAMETER.
                FsError::Blacklisted(_) => ErrorCode::InvalidParameter,
                FsError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => ErrorCode::FileDoNotExist,
                FsError::Io { .. } => ErrorCode::FileSystem,
            },
            CsrError::Prompt(_) => ErrorCode::UserResponseFailed,
            CsrError::InvalidParameter(_) => ErrorCode::InvalidParameter,
            CsrError::PermissionDenied => ErrorCode::PermissionDenied,
            CsrError::EngineDisabled => ErrorCode::EngineDisabled,
            CsrError::EngineNotExist => ErrorCode::EngineNotExist,
            CsrError::NoTask => ErrorCode::NoTask,
            CsrError::Busy => ErrorCode::Busy,
            CsrError::RemoveFailed(_) => ErrorCode::RemoveFailed,
            CsrError::FileDoNotExist(_) => ErrorCode::FileDoNotExist,
            CsrError::FileChanged(_) => ErrorCode::FileChanged,
            CsrError::FileSystem(_) => ErrorCode::FileSystem,
            CsrError::UserResponseFailed => ErrorCode::UserResponseFailed,
            CsrError::System(_) => ErrorCode::System,
        }
    }
}
