//! # CSR Engine Loader
//!
//! Loads vendor content/web detection engines as dynamic plugins.
//! A plugin is a shared object exporting a fixed vector of C-style
//! symbols; [`loader`] resolves all of them eagerly and fails the load if
//! any are missing. [`handle::ScopedContext`] guarantees a per-request
//! engine context is destroyed on every exit path, including unwinds.
//!
//! The two real vendor plugins are out of scope for this build. Behind the
//! `test-util` feature, [`mock::MockEngine`] implements the same
//! [`handle::ContentEngineHandle`]/[`handle::WebEngineHandle`] traits
//! in-process, standing in for a `.so` fixture that can't be built without
//! running the toolchain.

mod abi;
mod error;
mod handle;
mod loader;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use error::{EngineError, Result};
pub use handle::{ContentEngineHandle, EngineCtx, EngineLifecycle, ScopedContext, WebEngineHandle};
pub use loader::{ContentEngineLibrary, WebEngineLibrary};
