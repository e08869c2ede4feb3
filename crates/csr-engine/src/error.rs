use thiserror::Error;

/// Errors raised while loading or invoking an engine plugin.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load engine library: {0}")]
    Load(#[from] libloading::Error),

    #[error("engine library is missing required symbol {0:?}")]
    MissingSymbol(&'static str),

    #[error("engine reported internal error (code {0})")]
    Internal(i32),

    #[error("engine is not activated")]
    NotActivated,

    #[error("engine denied the operation")]
    PermissionDenied,

    #[error("a string returned by the engine was not valid UTF-8")]
    InvalidString,
}

pub type Result<T> = std::result::Result<T, EngineError>;
