//! Client for the UI helper's prompt socket. `csr-core` calls into this
//! crate whenever a detection or URL verdict needs a user decision; the
//! protocol here is a private request/response exchange distinct from
//! the client-facing scan/check sockets.

mod client;
mod error;
mod protocol;

pub use client::PromptClient;
pub use error::{PromptError, Result};
pub use protocol::{PromptDomain, PromptRequest};
