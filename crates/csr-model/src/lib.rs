//! # CSR Data Model
//!
//! Shared vocabulary for the CSR server: verdict types, severities, wire
//! error codes, and the per-request context structs that flow from the
//! socket layer down into the scanning logic.
//!
//! This crate is deliberately inert — it holds types and small pure
//! conversions only. `csr-store` persists them, `csr-wire` serializes them,
//! `csr-core` gives them meaning.

mod context;
mod detected;
mod error_code;
mod response;
mod severity;
mod url;

pub use context::{CoreUsage, EngineContext, EngineId, ScanContext, UrlContext};
pub use detected::{Detected, HistoryRow};
pub use error_code::ErrorCode;
pub use response::UserResponse;
pub use severity::{PromptScope, Severity};
pub use url::{Risk, UrlVerdict};
