//! # CSR Filesystem Visitor
//!
//! Path canonicalization, app-root classification, and the lazy scan
//! target walk used by the content-screening pipeline.

mod approot;
mod error;
mod path;
mod visitor;

pub use approot::AppRootMatcher;
pub use error::{FsError, Result};
pub use path::{canonicalize, is_blacklisted, lexical_normalize};
pub use visitor::{mtime_unix, File, Visitor};
