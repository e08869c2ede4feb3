use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Which engine a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineId {
    Content,
    Web,
}

impl EngineId {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineId::Content => "content",
            EngineId::Web => "web",
        }
    }
}

/// CPU-affinity request for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CoreUsage {
    #[default]
    Default,
    All,
    Half,
    Single,
}

impl CoreUsage {
    /// Number of cores to pin the calling worker thread to, given the
    /// machine's total core count. `Default`/`All` use every core.
    pub fn core_count(self, total_cores: usize) -> usize {
        let total_cores = total_cores.max(1);
        match self {
            CoreUsage::Default | CoreUsage::All => total_cores,
            CoreUsage::Half => total_cores.div_ceil(2),
            CoreUsage::Single => 1,
        }
    }
}

/// Per-request options for a content scan (data/file/app).
///
/// Lives for the duration of one synchronous request or one asynchronous
/// job; owns the cooperative cancellation flag consulted by the scan loop.
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub ask_user: bool,
    pub popup_message: String,
    pub core_usage: CoreUsage,
    pub scan_on_cloud: bool,
    pub is_scanned_cb_registered: bool,
    /// Cooperative cancellation flag. Set by an explicit `CANCEL` command
    /// or peer-close detection in the socket layer;
    /// checked by the scan loop at each target boundary. Shared across
    /// clones so the event loop and the worker running the job observe
    /// the same flag.
    stop_flag: Arc<AtomicBool>,
}

impl ScanContext {
    pub fn new(ask_user: bool, popup_message: impl Into<String>) -> Self {
        Self {
            ask_user,
            popup_message: popup_message.into(),
            core_usage: CoreUsage::Default,
            scan_on_cloud: false,
            is_scanned_cb_registered: false,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn request_cancel(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop_flag.load(Ordering::SeqCst)
    }

    pub fn with_core_usage(mut self, core_usage: CoreUsage) -> Self {
        self.core_usage = core_usage;
        self
    }

    pub fn with_scan_on_cloud(mut self, scan_on_cloud: bool) -> Self {
        self.scan_on_cloud = scan_on_cloud;
        self
    }

    pub fn with_scanned_cb_registered(mut self, registered: bool) -> Self {
        self.is_scanned_cb_registered = registered;
        self
    }
}

/// Per-request options for a URL check.
#[derive(Debug, Clone)]
pub struct UrlContext {
    pub ask_user: bool,
    pub popup_message: String,
}

impl UrlContext {
    pub fn new(ask_user: bool, popup_message: impl Into<String>) -> Self {
        Self {
            ask_user,
            popup_message: popup_message.into(),
        }
    }
}

/// Identifies which engine an engine-management request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineContext {
    pub engine_id: EngineId,
}

impl EngineContext {
    pub fn new(engine_id: EngineId) -> Self {
        Self { engine_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_usage_maps_to_counts() {
        assert_eq!(CoreUsage::Single.core_count(8), 1);
        assert_eq!(CoreUsage::Half.core_count(8), 4);
        assert_eq!(CoreUsage::Half.core_count(7), 4);
        assert_eq!(CoreUsage::All.core_count(8), 8);
        assert_eq!(CoreUsage::Default.core_count(8), 8);
    }

    #[test]
    fn core_usage_floors_at_one_core_machine() {
        assert_eq!(CoreUsage::Half.core_count(0), 1);
    }

    #[test]
    fn cancellation_is_observed_through_clones() {
        let ctx = ScanContext::new(false, "");
        let clone = ctx.clone();
        assert!(!clone.is_cancelled());
        ctx.request_cancel();
        assert!(clone.is_cancelled());
    }
}
