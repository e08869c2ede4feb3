//! # CSR Persistence Store
//!
//! An embedded SQLite database holding detection history, per-directory
//! scan-time watermarks, and engine enable/disable state.
//!
//! Schema version lives in `SCHEMA_INFO`; [`schema::ensure_schema`] brings a
//! freshly opened connection up to date, migrating forward or recreating as
//! needed. [`Store`] wraps the connection in a mutex — concurrent callers in
//! the server process are safe, and correctness never depends on this being
//! a hot path.

mod error;
mod schema;
mod store;

pub use error::{Result, StoreError};
pub use schema::SCHEMA_LATEST_VERSION;
pub use store::Store;
