//! Socket layer: bind the three privilege-class endpoints as named
//! local stream sockets.
//!
//! The production daemon receives these fds from the supervising init
//! system via socket activation; lacking that infrastructure here, this
//! build binds the configured paths directly, removing a stale socket
//! file left behind by an unclean shutdown first.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::net::UnixListener;
use tracing::info;

use csr_core::Endpoint;

/// One bound endpoint: its listener and the privilege class requests
/// arriving on it carry.
pub struct BoundEndpoint {
    pub endpoint: Endpoint,
    pub listener: UnixListener,
}

fn bind(path: &Path, endpoint: Endpoint) -> Result<BoundEndpoint> {
    if path.exists() {
        std::fs::remove_file(path).with_context(|| format!("removing stale socket at {path:?}"))?;
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating socket directory {parent:?}"))?;
    }
    let listener = UnixListener::bind(path).with_context(|| format!("binding {endpoint:?} endpoint at {path:?}"))?;
    info!(?endpoint, path = %path.display(), "bound endpoint");
    Ok(BoundEndpoint { endpoint, listener })
}

/// Binds all three endpoints from [`csr_core::SocketConfig`].
pub fn bind_all(config: &csr_core::SocketConfig) -> Result<Vec<BoundEndpoint>> {
    Ok(vec![
        bind(&config.content_path, Endpoint::Content)?,
        bind(&config.web_path, Endpoint::Web)?,
        bind(&config.admin_path, Endpoint::Admin)?,
    ])
}
