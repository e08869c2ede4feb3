//! Engine-management logic: metadata getters and the enable/disable
//! toggle consulted at the start of every scan/check call.

use csr_engine::EngineLifecycle;
use csr_model::EngineId;
use csr_store::Store;

use crate::error::{CsrError, Result};

/// Point-in-time snapshot of one engine's metadata and enable state —
/// plain data, no behavior, suitable for ambient structured logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatusReport {
    pub engine_id: EngineId,
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub data_version: String,
    pub latest_update_time: i64,
    pub activated: bool,
    pub enabled: bool,
}

const STATE_ENABLED: &str = "enabled";
const STATE_DISABLED: &str = "disabled";

/// `true` if `engine_id` has no stored state (default enabled) or is
/// explicitly `enabled`.
pub fn is_enabled(store: &Store, engine_id: EngineId) -> Result<bool> {
    match store.engine_state(engine_id.as_str())? {
        Some(state) => Ok(state != STATE_DISABLED),
        None => Ok(true),
    }
}

/// Fails closed with `ENGINE_DISABLED` without invoking the plugin.
/// Every public content-screening/URL-risk entry point calls this before
/// touching the engine.
pub fn ensure_enabled(store: &Store, engine_id: EngineId) -> Result<()> {
    if is_enabled(store, engine_id)? {
        Ok(())
    } else {
        Err(CsrError::EngineDisabled)
    }
}

pub fn set_state(store: &Store, engine_id: EngineId, enabled: bool) -> Result<()> {
    let state = if enabled { STATE_ENABLED } else { STATE_DISABLED };
    store.set_engine_state(engine_id.as_str(), state)?;
    Ok(())
}

/// Reads every metadata getter for `engine_id` plus its enable state.
/// Does not itself check `ensure_enabled` — a disabled engine's metadata
/// is still legitimately queryable via `EM_GET_*`; only scan/check calls
/// are gated.
pub fn report<E: EngineLifecycle + ?Sized>(store: &Store, engine_id: EngineId, engine: &E) -> Result<EngineStatusReport> {
    Ok(EngineStatusReport {
        engine_id,
        vendor: engine.vendor()?,
        name: engine.name()?,
        version: engine.version()?,
        data_version: engine.data_version()?,
        latest_update_time: engine.latest_update_time()?,
        activated: engine.activated()?,
        enabled: is_enabled(store, engine_id)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use csr_engine::mock::MockEngine;

    #[test]
    fn defaults_to_enabled() {
        let store = Store::in_memory().unwrap();
        assert!(is_enabled(&store, EngineId::Content).unwrap());
        assert!(ensure_enabled(&store, EngineId::Content).is_ok());
    }

    #[test]
    fn disabling_gates_without_touching_the_engine() {
        let store = Store::in_memory().unwrap();
        set_state(&store, EngineId::Content, false).unwrap();
        let err = ensure_enabled(&store, EngineId::Content).unwrap_err();
        assert!(matches!(err, CsrError::EngineDisabled));
    }

    #[test]
    fn re_enabling_clears_the_gate() {
        let store = Store::in_memory().unwrap();
        set_state(&store, EngineId::Content, false).unwrap();
        set_state(&store, EngineId::Content, true).unwrap();
        assert!(ensure_enabled(&store, EngineId::Content).is_ok());
    }

    #[test]
    fn disabling_one_engine_does_not_affect_the_other() {
        let store = Store::in_memory().unwrap();
        set_state(&store, EngineId::Content, false).unwrap();
        assert!(ensure_enabled(&store, EngineId::Web).is_ok());
    }

    #[test]
    fn report_reads_every_metadata_field() {
        let store = Store::in_memory().unwrap();
        let engine = MockEngine::content();
        let report = report(&store, EngineId::Content, &engine).unwrap();
        assert_eq!(report.vendor, "mock-vendor");
        assert!(report.enabled);
        assert!(report.activated);
    }
}
