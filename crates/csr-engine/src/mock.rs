//! In-process engine doubles standing in for a vendor `.so` in tests.
//!
//! Building a real `cdylib` fixture is out of reach without running the
//! toolchain, so `MockEngine` implements [`ContentEngineHandle`] and
//! [`WebEngineHandle`] directly rather than going through `libloading`.
//! Behavior is scripted: callers queue up canned results keyed by the
//! input they expect to see.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use csr_model::{Detected, UrlVerdict};

use crate::error::Result;
use crate::handle::{ContentEngineHandle, EngineCtx, EngineLifecycle, WebEngineHandle};

struct Scripted {
    vendor: String,
    name: String,
    version: String,
    data_version: String,
    latest_update_time: i64,
    activated: bool,
    data_results: HashMap<Vec<u8>, Detected>,
    file_results: HashMap<PathBuf, Detected>,
    app_results: HashMap<PathBuf, Detected>,
    url_results: HashMap<String, UrlVerdict>,
}

impl Default for Scripted {
    fn default() -> Self {
        Self {
            vendor: "mock-vendor".into(),
            name: "mock-engine".into(),
            version: "0.0.0".into(),
            data_version: "1".into(),
            latest_update_time: 0,
            activated: true,
            data_results: HashMap::new(),
            file_results: HashMap::new(),
            app_results: HashMap::new(),
            url_results: HashMap::new(),
        }
    }
}

/// A scriptable engine double used as both the content and web engine in
/// tests; the two roles only differ in which trait methods are invoked.
pub struct MockEngine {
    inner: Mutex<Scripted>,
    live_contexts: AtomicUsize,
    next_ctx: AtomicUsize,
}

impl MockEngine {
    pub fn content() -> Self {
        Self::new()
    }

    pub fn web() -> Self {
        Self::new()
    }

    fn new() -> Self {
        Self {
            inner: Mutex::new(Scripted::default()),
            live_contexts: AtomicUsize::new(0),
            next_ctx: AtomicUsize::new(1),
        }
    }

    pub fn live_context_count(&self) -> usize {
        self.live_contexts.load(Ordering::SeqCst)
    }

    pub fn set_activated(&self, activated: bool) {
        self.inner.lock().expect("mock engine mutex poisoned").activated = activated;
    }

    pub fn set_data_version(&self, version: impl Into<String>) {
        self.inner.lock().expect("mock engine mutex poisoned").data_version = version.into();
    }

    pub fn script_data(&self, input: &[u8], result: Detected) {
        self.inner
            .lock()
            .expect("mock engine mutex poisoned")
            .data_results
            .insert(input.to_vec(), result);
    }

    pub fn script_file(&self, path: impl Into<PathBuf>, result: Detected) {
        self.inner
            .lock()
            .expect("mock engine mutex poisoned")
            .file_results
            .insert(path.into(), result);
    }

    pub fn script_app(&self, app_root: impl Into<PathBuf>, result: Detected) {
        self.inner
            .lock()
            .expect("mock engine mutex poisoned")
            .app_results
            .insert(app_root.into(), result);
    }

    pub fn script_url(&self, url: impl Into<String>, result: UrlVerdict) {
        self.inner
            .lock()
            .expect("mock engine mutex poisoned")
            .url_results
            .insert(url.into(), result);
    }
}

impl EngineLifecycle for MockEngine {
    fn global_initialize(&self, _ro_res_dir: &Path, _rw_work_dir: &Path) -> Result<()> {
        Ok(())
    }

    fn context_create(&self) -> Result<EngineCtx> {
        self.live_contexts.fetch_add(1, Ordering::SeqCst);
        let id = self.next_ctx.fetch_add(1, Ordering::SeqCst);
        Ok(EngineCtx(id))
    }

    fn context_destroy(&self, _ctx: EngineCtx) {
        self.live_contexts.fetch_sub(1, Ordering::SeqCst);
    }

    fn vendor(&self) -> Result<String> {
        Ok(self.inner.lock().expect("mock engine mutex poisoned").vendor.clone())
    }

    fn name(&self) -> Result<String> {
        Ok(self.inner.lock().expect("mock engine mutex poisoned").name.clone())
    }

    fn version(&self) -> Result<String> {
        Ok(self.inner.lock().expect("mock engine mutex poisoned").version.clone())
    }

    fn data_version(&self) -> Result<String> {
        Ok(self.inner.lock().expect("mock engine mutex poisoned").data_version.clone())
    }

    fn latest_update_time(&self) -> Result<i64> {
        Ok(self.inner.lock().expect("mock engine mutex poisoned").latest_update_time)
    }

    fn activated(&self) -> Result<bool> {
        Ok(self.inner.lock().expect("mock engine mutex poisoned").activated)
    }

    fn api_version(&self) -> Result<i32> {
        Ok(1)
    }

    fn error_string(&self, code: i32) -> Result<String> {
        Ok(format!("mock engine error {code}"))
    }
}

impl ContentEngineHandle for MockEngine {
    fn scan_data(&self, _ctx: EngineCtx, bytes: &[u8]) -> Result<Option<Detected>> {
        Ok(self.inner.lock().expect("mock engine mutex poisoned").data_results.get(bytes).cloned())
    }

    fn scan_file(&self, _ctx: EngineCtx, path: &Path) -> Result<Option<Detected>> {
        Ok(self
            .inner
            .lock()
            .expect("mock engine mutex poisoned")
            .file_results
            .get(path)
            .cloned())
    }

    fn scan_app_on_cloud(&self, _ctx: EngineCtx, app_root: &Path) -> Result<Option<Detected>> {
        Ok(self
            .inner
            .lock()
            .expect("mock engine mutex poisoned")
            .app_results
            .get(app_root)
            .cloned())
    }
}

impl WebEngineHandle for MockEngine {
    fn check_url(&self, _ctx: EngineCtx, url: &str) -> Result<Option<UrlVerdict>> {
        Ok(self.inner.lock().expect("mock engine mutex poisoned").url_results.get(url).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csr_model::Severity;

    #[test]
    fn unscripted_scan_returns_none() {
        let engine = MockEngine::content();
        let ctx = engine.context_create().unwrap();
        assert!(engine.scan_data(ctx, b"clean").unwrap().is_none());
    }

    #[test]
    fn scripted_file_scan_returns_detection() {
        let engine = MockEngine::content();
        engine.script_file("/tmp/eicar", Detected::for_file("/tmp/eicar", "eicar_test", "", Severity::High, 1));

        let ctx = engine.context_create().unwrap();
        let got = engine.scan_file(ctx, Path::new("/tmp/eicar")).unwrap().unwrap();
        assert_eq!(got.malware_name, "eicar_test");
    }

    #[test]
    fn not_activated_is_reflected() {
        let engine = MockEngine::content();
        engine.set_activated(false);
        assert!(!engine.activated().unwrap());
    }
}
