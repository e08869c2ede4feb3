use std::path::Path;

use csr_model::{Detected, UrlVerdict};

use crate::error::Result;

/// Opaque per-request context handle returned by a plugin's
/// `context_create` symbol. Never shared across requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineCtx(pub(crate) usize);

/// Capability methods common to both engine kinds.
pub trait EngineLifecycle: Send + Sync {
    fn global_initialize(&self, ro_res_dir: &Path, rw_work_dir: &Path) -> Result<()>;
    fn context_create(&self) -> Result<EngineCtx>;
    fn context_destroy(&self, ctx: EngineCtx);

    fn vendor(&self) -> Result<String>;
    fn name(&self) -> Result<String>;
    fn version(&self) -> Result<String>;
    fn data_version(&self) -> Result<String>;
    fn latest_update_time(&self) -> Result<i64>;
    fn activated(&self) -> Result<bool>;
    fn api_version(&self) -> Result<i32>;
    fn error_string(&self, code: i32) -> Result<String>;
}

/// Content-engine scan surface.
pub trait ContentEngineHandle: EngineLifecycle {
    fn scan_data(&self, ctx: EngineCtx, bytes: &[u8]) -> Result<Option<Detected>>;
    fn scan_file(&self, ctx: EngineCtx, path: &Path) -> Result<Option<Detected>>;
    fn scan_app_on_cloud(&self, ctx: EngineCtx, app_root: &Path) -> Result<Option<Detected>>;
}

/// Web-engine check surface, analogous to the content-engine one above.
pub trait WebEngineHandle: EngineLifecycle {
    fn check_url(&self, ctx: EngineCtx, url: &str) -> Result<Option<UrlVerdict>>;
}

/// Scoped per-request context: acquires on construction, guarantees
/// `context_destroy` runs on every exit path including panics that unwind
/// through it.
pub struct ScopedContext<'a, E: EngineLifecycle + ?Sized> {
    engine: &'a E,
    ctx: EngineCtx,
}

impl<'a, E: EngineLifecycle + ?Sized> ScopedContext<'a, E> {
    pub fn acquire(engine: &'a E) -> Result<Self> {
        let ctx = engine.context_create()?;
        Ok(Self { engine, ctx })
    }

    pub fn handle(&self) -> EngineCtx {
        self.ctx
    }
}

impl<'a, E: EngineLifecycle + ?Sized> Drop for ScopedContext<'a, E> {
    fn drop(&mut self) {
        self.engine.context_destroy(self.ctx);
    }
}
