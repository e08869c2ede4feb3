//! Server configuration.
//!
//! Grouped into one sub-struct per component, `Default`-derived with
//! sensible defaults (60s I/O timeout, 2/10 worker bounds), loadable
//! from a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CsrError, Result};

/// Persistence store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Read-write space holding `.csr.db` and schema migration scripts.
    pub rw_dir: PathBuf,
}

impl StoreConfig {
    pub fn db_path(&self) -> PathBuf {
        self.rw_dir.join(".csr.db")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { rw_dir: PathBuf::from("/var/lib/csr") }
    }
}

/// Engine plugin locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub content_library: PathBuf,
    pub web_library: PathBuf,
    /// Read-only resource directory passed to every plugin's
    /// `global_initialize`.
    pub ro_resource_dir: PathBuf,
    /// Read-write working directory passed to every plugin's
    /// `global_initialize`.
    pub rw_work_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            content_library: PathBuf::from("/usr/lib/csr/libcontent_engine.so"),
            web_library: PathBuf::from("/usr/lib/csr/libweb_engine.so"),
            ro_resource_dir: PathBuf::from("/usr/share/csr/engine"),
            rw_work_dir: PathBuf::from("/var/lib/csr/engine"),
        }
    }
}

/// Worker pool bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub min_workers: usize,
    pub max_workers: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { min_workers: 2, max_workers: 10 }
    }
}

impl From<WorkerConfig> for csr_worker::PoolConfig {
    fn from(c: WorkerConfig) -> Self {
        csr_worker::PoolConfig { min_workers: c.min_workers, max_workers: c.max_workers }
    }
}

/// Socket endpoints and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketConfig {
    pub content_path: PathBuf,
    pub web_path: PathBuf,
    pub admin_path: PathBuf,
    /// The UI helper's prompt endpoint.
    pub prompt_path: PathBuf,
    /// Per-read/write timeout on a client connection (default 60s).
    pub io_timeout_secs: u64,
    /// Event loop idle shutdown timeout. The supervising init system
    /// restarts the process on the next connect.
    pub idle_timeout_secs: u64,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            content_path: PathBuf::from("/run/csr/content.sock"),
            web_path: PathBuf::from("/run/csr/web.sock"),
            admin_path: PathBuf::from("/run/csr/admin.sock"),
            prompt_path: PathBuf::from("/run/csr/prompt.sock"),
            io_timeout_secs: 60,
            idle_timeout_secs: 30,
        }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsrConfig {
    pub store: StoreConfig,
    pub engine: EngineConfig,
    pub worker: WorkerConfig,
    pub socket: SocketConfig,
}

impl CsrConfig {
    /// Loads and parses a TOML config file. Does not validate — call
    /// [`CsrConfig::validate`] separately (the `csrd check-config`
    /// subcommand does both).
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CsrError::System(format!("reading config {path:?}: {e}")))?;
        toml::from_str(&text).map_err(|e| CsrError::System(format!("parsing config {path:?}: {e}")))
    }

    /// Sanity-checks the config without binding any socket: worker bounds
    /// ordered correctly, timeouts positive, and the socket directory
    /// exists and is writable.
    pub fn validate(&self) -> Result<()> {
        if self.worker.min_workers > self.worker.max_workers {
            return Err(CsrError::InvalidParameter(format!(
                "worker.min_workers ({}) must be <= worker.max_workers ({})",
                self.worker.min_workers, self.worker.max_workers
            )));
        }
        if self.socket.idle_timeout_secs == 0 {
            return Err(CsrError::InvalidParameter("socket.idle_timeout_secs must be > 0".into()));
        }
        if self.socket.io_timeout_secs == 0 {
            return Err(CsrError::InvalidParameter("socket.io_timeout_secs must be > 0".into()));
        }
        for path in [&self.socket.content_path, &self.socket.web_path, &self.socket.admin_path] {
            let Some(dir) = path.parent() else {
                return Err(CsrError::InvalidParameter(format!("socket path {path:?} has no parent directory")));
            };
            if !dir.is_dir() {
                return Err(CsrError::InvalidParameter(format!("socket directory {dir:?} does not exist")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_defaults() {
        let config = CsrConfig::default();
        assert_eq!(config.worker.min_workers, 2);
        assert_eq!(config.worker.max_workers, 10);
        assert_eq!(config.socket.io_timeout_secs, 60);
    }

    #[test]
    fn validate_rejects_inverted_worker_bounds() {
        let mut config = CsrConfig::default();
        config.worker.min_workers = 20;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CsrError::InvalidParameter(_)));
    }

    #[test]
    fn validate_rejects_zero_idle_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CsrConfig::default();
        config.socket.idle_timeout_secs = 0;
        config.socket.content_path = dir.path().join("content.sock");
        config.socket.web_path = dir.path().join("web.sock");
        config.socket.admin_path = dir.path().join("admin.sock");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CsrError::InvalidParameter(_)));
    }

    #[test]
    fn validate_accepts_config_with_existing_socket_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CsrConfig::default();
        config.socket.content_path = dir.path().join("content.sock");
        config.socket.web_path = dir.path().join("web.sock");
        config.socket.admin_path = dir.path().join("admin.sock");
        config.validate().unwrap();
    }

    #[test]
    fn round_trips_through_toml() {
        let config = CsrConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: CsrConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.worker.max_workers, config.worker.max_workers);
    }
}
