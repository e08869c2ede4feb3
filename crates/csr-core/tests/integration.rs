//! End-to-end scenarios exercised across `ContentScreening`/`UrlScreening`
//! against `Store::in_memory()` and `MockEngine`, mirroring the server's
//! own request lifecycle minus the wire/socket layer.

use std::fs;

use csr_core::{ContentScreening, JudgeAction, ScanEvent, UnsupportedPackageManager, UrlScreening};
use csr_engine::mock::MockEngine;
use csr_fs::Visitor;
use csr_model::{Detected, Risk, ScanContext, Severity, UrlContext, UrlVerdict, UserResponse};
use csr_prompt::PromptClient;
use csr_store::Store;

const EICAR: &str = "X5O!P%@AP[4\\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";

// S1: single infected file.
#[test]
fn single_infected_file_reports_high_severity() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("m");
    fs::write(&target, EICAR).unwrap();

    let store = Store::in_memory().unwrap();
    let engine = MockEngine::content();
    engine.script_file(
        &target,
        Detected::for_file(target.to_string_lossy(), "test_malware", "http://high.malware.com", Severity::High, 1),
    );
    let visitor = Visitor::default();
    let prompt = PromptClient::new("/nonexistent/prompt.sock");
    let pm = UnsupportedPackageManager;
    let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

    let ctx = ScanContext::new(false, "");
    let detected = screening.scan_file(&ctx, &target).unwrap().unwrap();

    assert_eq!(detected.severity, Severity::High);
    assert_eq!(detected.malware_name, "test_malware");
    assert_eq!(detected.detailed_url, "http://high.malware.com");
    assert_eq!(detected.target_name, target.to_string_lossy());
}

// S2: medium-risk data buffer.
#[test]
fn medium_risk_data_scan() {
    let store = Store::in_memory().unwrap();
    let engine = MockEngine::content();
    engine.script_data(b"aabbccRISKY_MALWARE112233", Detected::for_data("test_risk", "", Severity::Medium, 1));
    let visitor = Visitor::default();
    let prompt = PromptClient::new("/nonexistent/prompt.sock");
    let pm = UnsupportedPackageManager;
    let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

    let ctx = ScanContext::new(false, "");
    let detected = screening.scan_data(&ctx, b"aabbccRISKY_MALWARE112233").unwrap().unwrap();

    assert_eq!(detected.severity, Severity::Medium);
    assert_eq!(detected.malware_name, "test_risk");
    assert!(detected.target_name.is_empty());
}

// Boundary case: empty buffer to scan_data.
#[test]
fn empty_buffer_scan_data_is_clean() {
    let store = Store::in_memory().unwrap();
    let engine = MockEngine::content();
    let visitor = Visitor::default();
    let prompt = PromptClient::new("/nonexistent/prompt.sock");
    let pm = UnsupportedPackageManager;
    let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

    let ctx = ScanContext::new(false, "");
    assert!(screening.scan_data(&ctx, b"").unwrap().is_none());
}

// S3-style async dir scan: high/medium/low/normal files, clean-callback subscribed.
#[test]
fn async_dir_scan_emits_one_event_per_infected_file_and_clean_when_subscribed() {
    let dir = tempfile::tempdir().unwrap();
    let high = dir.path().join("high");
    let medium = dir.path().join("medium");
    let low = dir.path().join("low");
    let normal = dir.path().join("normal");
    for f in [&high, &medium, &low, &normal] {
        fs::write(f, b"x").unwrap();
    }

    let store = Store::in_memory().unwrap();
    let engine = MockEngine::content();
    engine.script_file(&high, Detected::for_file(high.to_string_lossy(), "m", "", Severity::High, 1));
    engine.script_file(&medium, Detected::for_file(medium.to_string_lossy(), "m", "", Severity::Medium, 1));
    engine.script_file(&low, Detected::for_file(low.to_string_lossy(), "m", "", Severity::Low, 1));
    let visitor = Visitor::default();
    let prompt = PromptClient::new("/nonexistent/prompt.sock");
    let pm = UnsupportedPackageManager;
    let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

    let ctx = ScanContext::new(false, "").with_scanned_cb_registered(true);
    let mut events = Vec::new();
    screening.scan_dir_async(&ctx, dir.path(), |e| events.push(e)).unwrap();

    let detected_count = events.iter().filter(|e| matches!(e, ScanEvent::Detected(_))).count();
    let clean_count = events.iter().filter(|e| matches!(e, ScanEvent::Clean(_))).count();
    assert_eq!(detected_count, 3);
    assert_eq!(clean_count, 1);
}

// Invariant 3: judge ignore/unignore toggles list membership.
#[test]
fn judge_ignore_moves_target_between_detected_and_ignored_lists() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("m");
    fs::write(&target, b"x").unwrap();
    let target_str = target.to_string_lossy().into_owned();

    let store = Store::in_memory().unwrap();
    store
        .upsert_history_row(&csr_model::HistoryRow::new(Detected::for_file(&target_str, "m", "", Severity::Medium, 1), "1"))
        .unwrap();
    let engine = MockEngine::content();
    let visitor = Visitor::default();
    let prompt = PromptClient::new("/nonexistent/prompt.sock");
    let pm = UnsupportedPackageManager;
    let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

    screening.judge(&target, JudgeAction::Ignore).unwrap();
    assert!(screening.get_detected_list(dir.path().to_str().unwrap()).unwrap().is_empty());
    assert_eq!(screening.get_ignored_list(dir.path().to_str().unwrap()).unwrap().len(), 1);

    screening.judge(&target, JudgeAction::Unignore).unwrap();
    assert_eq!(screening.get_detected_list(dir.path().to_str().unwrap()).unwrap().len(), 1);
    assert!(screening.get_ignored_list(dir.path().to_str().unwrap()).unwrap().is_empty());
}

// Invariant 4: judge remove succeeds iff mtime is unchanged, then the file and row are gone.
#[test]
fn judge_remove_deletes_file_and_history_row_on_match() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("m");
    fs::write(&target, b"x").unwrap();
    let target_str = target.to_string_lossy().into_owned();
    let ts = csr_fs::mtime_unix(&target).unwrap();

    let store = Store::in_memory().unwrap();
    store
        .upsert_history_row(&csr_model::HistoryRow::new(Detected::for_file(&target_str, "m", "", Severity::High, ts), "1"))
        .unwrap();
    let engine = MockEngine::content();
    let visitor = Visitor::default();
    let prompt = PromptClient::new("/nonexistent/prompt.sock");
    let pm = UnsupportedPackageManager;
    let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

    screening.judge(&target, JudgeAction::Remove).unwrap();
    assert!(!target.exists());
    assert!(store.get_detected(&target_str).unwrap().is_none());
}

// Invariant 5: stale data-version rows are purged before the next dir scan reports results.
#[test]
fn stale_data_version_rows_are_purged_before_next_scan() {
    let dir = tempfile::tempdir().unwrap();
    let stale = dir.path().join("stale");
    fs::write(&stale, b"x").unwrap();
    let stale_str = stale.to_string_lossy().into_owned();

    let store = Store::in_memory().unwrap();
    store
        .upsert_history_row(&csr_model::HistoryRow::new(Detected::for_file(&stale_str, "old", "", Severity::Medium, 1), "v1"))
        .unwrap();

    let engine = MockEngine::content();
    engine.set_data_version("v2");
    let visitor = Visitor::default();
    let prompt = PromptClient::new("/nonexistent/prompt.sock");
    let pm = UnsupportedPackageManager;
    let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

    let ctx = ScanContext::new(false, "");
    let mut events = Vec::new();
    screening.scan_dir_async(&ctx, dir.path(), |e| events.push(e)).unwrap();

    // The stale v1 row was dropped, not carried over as a detection.
    assert!(!events.iter().any(|e| matches!(e, ScanEvent::Detected(d) if d.target_name == stale_str)));
}

// Invariant 7 / cancellation: CANCEL before COMPLETE stops the stream early.
#[test]
fn cancel_before_complete_yields_no_further_events() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"x").unwrap();
    fs::write(&b, b"x").unwrap();

    let store = Store::in_memory().unwrap();
    let engine = MockEngine::content();
    engine.script_file(&a, Detected::for_file(a.to_string_lossy(), "m", "", Severity::High, 1));
    engine.script_file(&b, Detected::for_file(b.to_string_lossy(), "m", "", Severity::High, 1));
    let visitor = Visitor::default();
    let prompt = PromptClient::new("/nonexistent/prompt.sock");
    let pm = UnsupportedPackageManager;
    let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

    let ctx = ScanContext::new(false, "");
    ctx.request_cancel();
    let mut events = Vec::new();
    screening.scan_files_async(&ctx, &[a, b], |e| events.push(e)).unwrap();
    assert!(events.is_empty());
}

// Invariant 8: a disabled engine is rejected without being invoked.
#[test]
fn disabled_engine_rejects_scan_without_loading_it() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("m");
    fs::write(&target, b"x").unwrap();

    let store = Store::in_memory().unwrap();
    csr_core::set_state(&store, csr_model::EngineId::Content, false).unwrap();
    let engine = MockEngine::content();
    let visitor = Visitor::default();
    let prompt = PromptClient::new("/nonexistent/prompt.sock");
    let pm = UnsupportedPackageManager;
    let screening = ContentScreening::new(&store, &engine, &visitor, &prompt, &pm);

    let ctx = ScanContext::new(false, "");
    let err = screening.scan_file(&ctx, &target).unwrap_err();
    assert_eq!(err.to_wire_code(), csr_model::ErrorCode::EngineDisabled);
}

// URL risk policy end to end.
#[test]
fn url_check_policy_covers_all_four_risk_bands() {
    let store = Store::in_memory().unwrap();
    let engine = MockEngine::web();
    engine.script_url("http://medium.example", UrlVerdict::new(Risk::Medium, "http://medium.example/detail"));
    engine.script_url("http://high.example", UrlVerdict::new(Risk::High, "http://high.example/detail"));
    let prompt = PromptClient::new("/nonexistent/prompt.sock");
    let screening = UrlScreening::new(&store, &engine, &prompt);

    let silent_ctx = UrlContext::new(false, "");
    let unverified = screening.check_url(&silent_ctx, "http://unknown.example").unwrap();
    assert_eq!(unverified.risk, Risk::Unverified);
    assert_eq!(unverified.user_response, UserResponse::NotAsked);

    let medium = screening.check_url(&silent_ctx, "http://medium.example").unwrap();
    assert_eq!(medium.risk, Risk::Medium);
    assert_eq!(medium.user_response, UserResponse::NotAsked);

    let high = screening.check_url(&silent_ctx, "http://high.example").unwrap();
    assert_eq!(high.risk, Risk::High);
    assert_eq!(high.user_response, UserResponse::NotAsked);
}
