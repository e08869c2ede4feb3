use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving or walking a scan target.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("i/o error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// Not a real failure: the path lies under a blacklisted system prefix
    /// and was dropped by the short-circuit check. Kept as a variant so
    /// callers can distinguish "silently skip" from a genuine I/O error,
    /// but it should never surface to a client as an error code.
    #[error("path {0:?} is under a blacklisted system prefix")]
    Blacklisted(PathBuf),
}

pub type Result<T> = std::result::Result<T, FsError>;
