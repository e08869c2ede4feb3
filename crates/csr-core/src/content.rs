//! Content-screening logic: scan_data/scan_file/scan_app, the user-prompt
//! policy, judge, and the async scan event stream.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use csr_engine::{ContentEngineHandle, ScopedContext};
use csr_fs::{mtime_unix, Visitor};
use csr_model::{Detected, EngineId, ErrorCode, HistoryRow, ScanContext, UserResponse};
use csr_prompt::{PromptClient, PromptDomain, PromptRequest};
use csr_store::Store;

use crate::engine_state::ensure_enabled;
use crate::error::{CsrError, Result};

fn unix_now() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

/// Action requested against an existing detection via the judge entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeAction {
    Remove,
    Ignore,
    Unignore,
}

/// One event in an async scan's stream. The dispatcher translates these
/// into `MALWARE_DETECTED`/`MALWARE_NONE` frames plus a terminal
/// `COMPLETE` or fatal error.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Detected(Detected),
    /// Emitted only when the caller registered the scanned-file callback.
    Clean(String),
    /// A per-target, non-fatal failure; the stream continues.
    Error { target: String, code: ErrorCode },
}

/// Removes an installed application by package id. The real backend
/// (the platform's package manager) is an external collaborator out of
/// scope here; this is the seam it plugs into, mirroring
/// [`crate::access::PrivilegeResolver`].
pub trait PackageManager: Send + Sync {
    fn uninstall(&self, pkg_id: &str) -> Result<()>;
}

/// Stand-in that always fails, wired in until a real package-manager
/// backend exists for this platform.
#[derive(Debug, Default)]
pub struct UnsupportedPackageManager;

impl PackageManager for UnsupportedPackageManager {
    fn uninstall(&self, pkg_id: &str) -> Result<()> {
        Err(CsrError::System(format!("no package manager backend configured to uninstall {pkg_id}")))
    }
}

/// Content-screening entry points (C10), bound to one loaded content
/// engine, the shared store, and the collaborators the prompt/remove
/// paths need.
pub struct ContentScreening<'a, E: ContentEngineHandle + ?Sized> {
    store: &'a Store,
    engine: &'a E,
    visitor: &'a Visitor,
    prompt: &'a PromptClient,
    package_manager: &'a dyn PackageManager,
}

impl<'a, E: ContentEngineHandle + ?Sized> ContentScreening<'a, E> {
    pub fn new(
        store: &'a Store,
        engine: &'a E,
        visitor: &'a Visitor,
        prompt: &'a PromptClient,
        package_manager: &'a dyn PackageManager,
    ) -> Self {
        Self { store, engine, visitor, prompt, package_manager }
    }

    fn ensure_enabled(&self) -> Result<()> {
        ensure_enabled(self.store, EngineId::Content)
    }

    /// Scans an in-memory byte buffer with no filesystem identity.
    pub fn scan_data(&self, ctx: &ScanContext, bytes: &[u8]) -> Result<Option<Detected>> {
        self.ensure_enabled()?;
        let scoped = ScopedContext::acquire(self.engine)?;
        let Some(mut detected) = self.engine.scan_data(scoped.handle(), bytes)? else {
            return Ok(None);
        };
        self.run_prompt_policy(ctx, &mut detected, None)?;
        Ok(Some(detected))
    }

    /// Scans a single file. Dispatches to [`Self::scan_app`] when `path`
    /// resolves inside an application root.
    pub fn scan_file(&self, ctx: &ScanContext, path: &Path) -> Result<Option<Detected>> {
        self.ensure_enabled()?;
        let target = self.visitor.create(path)?;
        if target.in_app {
            return self.scan_app(ctx, &target);
        }
        self.scan_plain_file(ctx, &target.path)
    }

    fn scan_plain_file(&self, ctx: &ScanContext, path: &Path) -> Result<Option<Detected>> {
        let target_name = path.to_string_lossy().into_owned();
        let engine_latest = self.engine.latest_update_time()?;

        let cached = self
            .store
            .get_detected(&target_name)?
            .or(self.store.get_ignored(&target_name)?)
            .filter(|row| row.detected.ts >= engine_latest);

        if let Some(row) = cached {
            let current_mtime = mtime_unix(path)?;
            if current_mtime <= row.detected.ts {
                if row.is_ignored {
                    return Ok(None);
                }
                let mut detected = row.detected.clone();
                self.run_prompt_policy(ctx, &mut detected, None)?;
                return Ok(Some(detected));
            }
        }

        let scoped = ScopedContext::acquire(self.engine)?;
        let Some(mut detected) = self.engine.scan_file(scoped.handle(), path)? else {
            let _ = self.store.remove_detected(&target_name);
            return Ok(None);
        };
        detected.target_name = target_name;
        let data_version = self.engine.data_version()?;
        self.store.upsert_history_row(&HistoryRow::new(detected.clone(), data_version))?;
        self.run_prompt_policy(ctx, &mut detected, None)?;
        Ok(Some(detected))
    }

    fn scan_app(&self, ctx: &ScanContext, target: &csr_fs::File) -> Result<Option<Detected>> {
        let pkg_root = target.path.as_path();
        let pkg_id = target.pkg_id.as_deref().expect("in_app target always carries a pkg_id");

        if ctx.scan_on_cloud {
            self.scan_app_cloud(ctx, pkg_root, pkg_id)
        } else {
            self.scan_app_delta(ctx, pkg_root, pkg_id)
        }
    }

    /// A single cloud-side verdict for the whole app, recorded as
    /// `by_cloud`.
    fn scan_app_cloud(&self, ctx: &ScanContext, pkg_root: &Path, pkg_id: &str) -> Result<Option<Detected>> {
        let scoped = ScopedContext::acquire(self.engine)?;
        let Some(mut detected) = self.engine.scan_app_on_cloud(scoped.handle(), pkg_root)? else {
            return Ok(None);
        };
        let root_str = pkg_root.to_string_lossy().into_owned();
        detected.target_name = root_str.clone();
        detected.is_app = true;
        detected.pkg_id = pkg_id.to_string();

        let data_version = self.engine.data_version()?;
        let mut row = HistoryRow::new(detected.clone(), data_version).with_by_cloud(true);
        row.file_in_app_path = root_str;
        self.store.upsert_history_row(&row)?;

        self.run_prompt_policy(ctx, &mut detected, Some(pkg_id))?;
        Ok(Some(detected))
    }

    /// A delta walk over files changed since the last scan of this
    /// package, followed by the state-table arbitration across pre-walk
    /// history, post-walk history, and this walk's riskiest detection.
    fn scan_app_delta(&self, ctx: &ScanContext, pkg_root: &Path, pkg_id: &str) -> Result<Option<Detected>> {
        let root_str = pkg_root.to_string_lossy().into_owned();
        let data_version = self.engine.data_version()?;
        let prefix = format!("{root_str}/");

        self.store.delete_detected_deprecated(&prefix, &data_version)?;

        let history = self.store.riskiest_for_app(pkg_id)?;
        let since = self.store.last_scan_time(&root_str, &data_version)?.unwrap_or(0);
        let walk_start = unix_now();

        let mut riskiest: Option<Detected> = None;
        for file in self.visitor.create_targets(pkg_root, since)? {
            if ctx.is_cancelled() {
                break;
            }
            let file_path = file.path.to_string_lossy().into_owned();
            let scoped = ScopedContext::acquire(self.engine)?;
            match self.engine.scan_file(scoped.handle(), &file.path)? {
                None => {
                    let _ = self.store.remove_detected(&file_path);
                }
                Some(mut per_file) => {
                    per_file.target_name = file_path.clone();
                    per_file.is_app = true;
                    per_file.pkg_id = pkg_id.to_string();
                    let row = HistoryRow::new(per_file.clone(), data_version.clone()).with_file_in_app_path(file_path);
                    self.store.upsert_history_row(&row)?;
                    riskiest = match riskiest {
                        Some(prev) if prev.severity >= per_file.severity => Some(prev),
                        _ => Some(per_file),
                    };
                }
            }
        }
        self.store.set_last_scan_time(&root_str, &data_version, walk_start)?;

        let after = self.store.riskiest_for_app(pkg_id)?;
        let winner = self.arbitrate_app_verdict(pkg_root, &history, &after, &riskiest)?;

        let Some(mut detected) = winner else {
            return Ok(None);
        };
        detected.target_name = root_str;
        self.run_prompt_policy(ctx, &mut detected, Some(pkg_id))?;
        Ok(Some(detected))
    }

    /// The app-verdict arbitration table, keyed by (history, after, riskiest).
    fn arbitrate_app_verdict(
        &self,
        pkg_root: &Path,
        history: &Option<HistoryRow>,
        after: &Option<HistoryRow>,
        riskiest: &Option<Detected>,
    ) -> Result<Option<Detected>> {
        match (history, after, riskiest) {
            (Some(h), Some(_a), Some(r)) if r.severity >= h.severity() => Ok(Some(r.clone())),
            (Some(_h), Some(a), _) => {
                if a.is_ignored {
                    Ok(None)
                } else {
                    Ok(Some(a.detected.clone()))
                }
            }
            (Some(_h), None, Some(r)) => {
                let remaining = self.worst_remaining_per_file(pkg_root)?;
                match remaining {
                    Some(remaining) if remaining.severity() > r.severity => {
                        if remaining.is_ignored {
                            self.store.set_ignored(remaining.target_name(), false)?;
                        }
                        Ok(Some(remaining.detected.clone()))
                    }
                    _ => Ok(Some(r.clone())),
                }
            }
            (Some(_h), None, None) => {
                let remaining = self.worst_remaining_per_file(pkg_root)?;
                Ok(remaining.map(|row| row.detected))
            }
            (None, Some(_), _) => {
                unreachable!("per-file rows always write the pkg-worst cache through before `after` can be read")
            }
            (None, None, Some(r)) => Ok(Some(r.clone())),
            (None, None, None) => Ok(None),
        }
    }

    fn worst_remaining_per_file(&self, pkg_root: &Path) -> Result<Option<HistoryRow>> {
        let prefix = format!("{}/", pkg_root.to_string_lossy());
        let rows = self.store.get_detected_list(&prefix)?;
        Ok(rows.into_iter().max_by_key(|r| r.severity()))
    }

    /// The user-prompt policy. Mutates `detected.user_response` in place
    /// and, on `Remove`, deletes the target and its history row.
    fn run_prompt_policy(&self, ctx: &ScanContext, detected: &mut Detected, app_pkg_id: Option<&str>) -> Result<()> {
        if !ctx.ask_user {
            detected.user_response = UserResponse::NotAsked;
            return Ok(());
        }

        let scope = detected.severity.prompt_scope();
        let subject = if detected.target_name.is_empty() {
            detected.malware_name.clone()
        } else {
            detected.target_name.clone()
        };
        let req = PromptRequest::new(PromptDomain::Content, scope, subject, ctx.popup_message.clone());
        let response = self.prompt.request_blocking(&req)?;
        detected.user_response = response;

        if response == UserResponse::Remove && !detected.target_name.is_empty() {
            let removal = match app_pkg_id {
                Some(pkg_id) => self.package_manager.uninstall(pkg_id),
                None => std::fs::remove_file(&detected.target_name).map_err(|e| CsrError::System(e.to_string())),
            };
            if removal.is_err() {
                return Err(CsrError::RemoveFailed(Box::new(detected.clone())));
            }
            let _ = self.store.remove_detected(&detected.target_name);
        }
        Ok(())
    }

    /// Applies a judge action to an existing detection.
    pub fn judge(&self, target: &Path, action: JudgeAction) -> Result<()> {
        self.ensure_enabled()?;
        let target_name = target.to_string_lossy().into_owned();
        match action {
            JudgeAction::Ignore => self.store.set_ignored(&target_name, true).map_err(Into::into),
            JudgeAction::Unignore => self.store.set_ignored(&target_name, false).map_err(Into::into),
            JudgeAction::Remove => self.judge_remove(&target_name),
        }
    }

    /// The caller-supplied path must equal the history row's own
    /// `target_name` exactly. No fallback lookup by `file_in_app_path`
    /// is attempted.
    fn judge_remove(&self, target_name: &str) -> Result<()> {
        let row = self
            .store
            .get_detected(target_name)?
            .or(self.store.get_ignored(target_name)?)
            .ok_or_else(|| CsrError::FileChanged(target_name.to_string()))?;

        let current_mtime = mtime_unix(Path::new(target_name))?;
        if current_mtime != row.detected.ts {
            return Err(CsrError::FileChanged(target_name.to_string()));
        }

        let removal = if row.detected.is_app {
            self.package_manager.uninstall(&row.detected.pkg_id)
        } else {
            std::fs::remove_file(target_name).map_err(|e| CsrError::System(e.to_string()))
        };
        removal?;
        self.store.remove_detected(target_name)?;
        Ok(())
    }

    fn scan_one_async(&self, ctx: &ScanContext, target: &Path, on_event: &mut impl FnMut(ScanEvent)) -> Result<()> {
        match self.scan_file(ctx, target) {
            Ok(Some(detected)) => {
                on_event(ScanEvent::Detected(detected));
                Ok(())
            }
            Ok(None) => {
                if ctx.is_scanned_cb_registered {
                    on_event(ScanEvent::Clean(target.to_string_lossy().into_owned()));
                }
                Ok(())
            }
            Err(e) => {
                let code = e.to_wire_code();
                if code.is_fatal_in_stream() {
                    Err(e)
                } else {
                    on_event(ScanEvent::Error { target: target.to_string_lossy().into_owned(), code });
                    Ok(())
                }
            }
        }
    }

    /// Scans each target in order. The caller's `on_event` closure is
    /// invoked once per target plus error frames; the dispatcher appends
    /// the terminal `COMPLETE`/fatal-error frame.
    pub fn scan_files_async(&self, ctx: &ScanContext, targets: &[PathBuf], mut on_event: impl FnMut(ScanEvent)) -> Result<()> {
        self.ensure_enabled()?;
        for target in targets {
            if ctx.is_cancelled() {
                return Ok(());
            }
            self.scan_one_async(ctx, target, &mut on_event)?;
        }
        Ok(())
    }

    /// `scan_dir_async`: walks `dir` since its last scan at the engine's
    /// current data-version, then re-emits still-existent carry-over
    /// detections that fell outside the walk's `since` filter.
    pub fn scan_dir_async(&self, ctx: &ScanContext, dir: &Path, mut on_event: impl FnMut(ScanEvent)) -> Result<()> {
        self.ensure_enabled()?;
        let resolved = csr_fs::canonicalize(dir)?;
        let dir_str = resolved.to_string_lossy().into_owned();
        let prefix = format!("{}/", dir_str.trim_end_matches('/'));
        let data_version = self.engine.data_version()?;

        self.store.delete_detected_deprecated(&prefix, &data_version)?;

        let since = self.store.last_scan_time(&dir_str, &data_version)?.unwrap_or(0);
        let walk_start = unix_now();
        let targets = self.visitor.create_targets(&resolved, since)?;
        let scanned: HashSet<String> = targets.iter().map(|f| f.path.to_string_lossy().into_owned()).collect();

        for file in &targets {
            if ctx.is_cancelled() {
                return Ok(());
            }
            self.scan_one_async(ctx, &file.path, &mut on_event)?;
        }
        self.store.set_last_scan_time(&dir_str, &data_version, walk_start)?;

        for row in self.store.get_detected_list(&prefix)? {
            if ctx.is_cancelled() {
                return Ok(());
            }
            if scanned.contains(row.target_name()) {
                continue;
            }
            if Path::new(row.target_name()).exists() {
                on_event(ScanEvent::Detected(row.detected.clone()));
            }
        }
        Ok(())
    }

    /// `scan_dirs_async`: each directory runs the same walk as
    /// [`Self::scan_dir_async`], in order, sharing one stop flag.
    pub fn scan_dirs_async(&self, ctx: &ScanContext, dirs: &[PathBuf], mut on_event: impl FnMut(ScanEvent)) -> Result<()> {
        self.ensure_enabled()?;
        for dir in dirs {
            if ctx.is_cancelled() {
                return Ok(());
            }
            self.scan_dir_async(ctx, dir, &mut on_event)?;
        }
        Ok(())
    }

    pub fn get_detected(&self, target_name: &str) -> Result<Option<HistoryRow>> {
        Ok(self.store.get_detected(target_name)?)
    }

    pub fn get_detected_list(&self, dir_prefix: &str) -> Result<Vec<HistoryRow>> {
        Ok(self.store.get_detected_list(dir_prefix)?)
    }

    pub fn get_ignored(&self, target_name: &str) -> Result<Option<HistoryRow>> {
        Ok(self.store.get_ignored(target_name)?)
    }

    pub fn get_ignored_list(&self, dir_prefix: &str) -> Result<Vec<HistoryRow>> {
        Ok(self.store.get_ignored_list(dir_prefix)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csr_engine::mock::MockEngine;
    use csr_model::{CoreUsage, Severity};
    use std::fs;

    fn setup() -> (tempfile::TempDir, Store, MockEngine, Visitor) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::in_memory().unwrap();
        let engine = MockEngine::content();
        let visitor = Visitor::default();
        (dir, store, engine, visitor)
    }

    fn prompt_client() -> PromptClient {
        PromptClient::new("/nonexistent/prompt.sock")
    }

    #[test]
    fn scan_data_with_no_detection_returns_none() {
        let (_dir, store, engine, visitor) = setup();
        let prompt = prompt_client();
        let pm = UnsupportedPackageManager;
        let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

        let ctx = ScanContext::new(false, "");
        let result = screening.scan_data(&ctx, b"clean bytes").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn scan_data_without_ask_user_skips_prompt() {
        let (_dir, store, engine, visitor) = setup();
        engine.script_data(b"RISKY_MALWARE", Detected::for_data("test_risk", "", Severity::Medium, 100));
        let prompt = prompt_client();
        let pm = UnsupportedPackageManager;
        let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

        let ctx = ScanContext::new(false, "").with_core_usage(CoreUsage::Single);
        let detected = screening.scan_data(&ctx, b"RISKY_MALWARE").unwrap().unwrap();
        assert_eq!(detected.severity, Severity::Medium);
        assert_eq!(detected.user_response, UserResponse::NotAsked);
        assert!(detected.target_name.is_empty());
    }

    #[test]
    fn scan_file_records_history_row_on_detection() {
        let (dir, store, engine, visitor) = setup();
        let target = dir.path().join("m");
        fs::write(&target, b"eicar").unwrap();
        engine.script_file(&target, Detected::for_file(target.to_string_lossy(), "test_malware", "http://high.malware.com", Severity::High, 1));
        let prompt = prompt_client();
        let pm = UnsupportedPackageManager;
        let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

        let ctx = ScanContext::new(false, "");
        let detected = screening.scan_file(&ctx, &target).unwrap().unwrap();
        assert_eq!(detected.severity, Severity::High);
        assert_eq!(detected.malware_name, "test_malware");

        let row = store.get_detected(&target.to_string_lossy()).unwrap().unwrap();
        assert_eq!(row.severity(), Severity::High);
    }

    #[test]
    fn scan_file_reuses_cached_history_without_rescanning() {
        let (dir, store, engine, visitor) = setup();
        let target = dir.path().join("cached");
        fs::write(&target, b"x").unwrap();
        let target_str = target.to_string_lossy().into_owned();

        let ts = unix_now() + 3600;
        let mut detected = Detected::for_file(&target_str, "cached_hit", "", Severity::Medium, ts);
        detected.user_response = UserResponse::NotAsked;
        store.upsert_history_row(&HistoryRow::new(detected, "1")).unwrap();

        let prompt = prompt_client();
        let pm = UnsupportedPackageManager;
        let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);
        let ctx = ScanContext::new(false, "");

        let result = screening.scan_file(&ctx, &target).unwrap().unwrap();
        assert_eq!(result.malware_name, "cached_hit");
    }

    #[test]
    fn scan_file_skips_engine_when_disabled() {
        let (dir, store, engine, visitor) = setup();
        crate::engine_state::set_state(&store, EngineId::Content, false).unwrap();
        let target = dir.path().join("m");
        fs::write(&target, b"x").unwrap();

        let prompt = prompt_client();
        let pm = UnsupportedPackageManager;
        let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);
        let ctx = ScanContext::new(false, "");

        let err = screening.scan_file(&ctx, &target).unwrap_err();
        assert!(matches!(err, CsrError::EngineDisabled));
    }

    #[test]
    fn judge_ignore_then_unignore_round_trips() {
        let (dir, store, engine, visitor) = setup();
        let target = dir.path().join("m");
        fs::write(&target, b"x").unwrap();
        store
            .upsert_history_row(&HistoryRow::new(Detected::for_file(target.to_string_lossy(), "x", "", Severity::Low, 1), "1"))
            .unwrap();

        let prompt = prompt_client();
        let pm = UnsupportedPackageManager;
        let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

        screening.judge(&target, JudgeAction::Ignore).unwrap();
        assert!(store.get_detected(&target.to_string_lossy()).unwrap().is_none());
        assert!(store.get_ignored(&target.to_string_lossy()).unwrap().is_some());

        screening.judge(&target, JudgeAction::Unignore).unwrap();
        assert!(store.get_detected(&target.to_string_lossy()).unwrap().is_some());
    }

    #[test]
    fn judge_remove_fails_when_mtime_changed() {
        let (dir, store, engine, visitor) = setup();
        let target = dir.path().join("m");
        fs::write(&target, b"x").unwrap();
        let target_str = target.to_string_lossy().into_owned();
        store
            .upsert_history_row(&HistoryRow::new(Detected::for_file(&target_str, "x", "", Severity::High, 1), "1"))
            .unwrap();

        let prompt = prompt_client();
        let pm = UnsupportedPackageManager;
        let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

        let err = screening.judge(&target, JudgeAction::Remove).unwrap_err();
        assert!(matches!(err, CsrError::FileChanged(_)));
    }

    #[test]
    fn judge_remove_on_unknown_target_fails_changed_not_missing() {
        let (dir, store, engine, visitor) = setup();
        let target = dir.path().join("never-scanned");
        fs::write(&target, b"x").unwrap();

        let prompt = prompt_client();
        let pm = UnsupportedPackageManager;
        let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

        let err = screening.judge(&target, JudgeAction::Remove).unwrap_err();
        assert!(matches!(err, CsrError::FileChanged(_)));
    }

    #[test]
    fn scan_files_async_reports_clean_only_when_subscribed() {
        let (dir, store, engine, visitor) = setup();
        let clean = dir.path().join("clean.txt");
        fs::write(&clean, b"ok").unwrap();

        let prompt = prompt_client();
        let pm = UnsupportedPackageManager;
        let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

        let mut events = Vec::new();
        let ctx = ScanContext::new(false, "");
        screening.scan_files_async(&ctx, &[clean.clone()], |e| events.push(e)).unwrap();
        assert!(events.is_empty());

        let ctx = ScanContext::new(false, "").with_scanned_cb_registered(true);
        let mut events = Vec::new();
        screening.scan_files_async(&ctx, &[clean], |e| events.push(e)).unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ScanEvent::Clean(_)));
    }

    #[test]
    fn cancellation_stops_the_stream_early() {
        let (dir, store, engine, visitor) = setup();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, b"x").unwrap();
        fs::write(&b, b"x").unwrap();
        engine.script_file(&a, Detected::for_file(a.to_string_lossy(), "m", "", Severity::High, 1));
        engine.script_file(&b, Detected::for_file(b.to_string_lossy(), "m", "", Severity::High, 1));

        let prompt = prompt_client();
        let pm = UnsupportedPackageManager;
        let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

        let ctx = ScanContext::new(false, "");
        ctx.request_cancel();
        let mut events = Vec::new();
        screening.scan_files_async(&ctx, &[a, b], |e| events.push(e)).unwrap();
        assert!(events.is_empty());
    }
}
