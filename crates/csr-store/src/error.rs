use thiserror::Error;

/// Errors raised by the persistence layer. All are mapped onto
/// `ErrorCode::Db` by the caller except where noted.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("no such history row for target {0:?}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
