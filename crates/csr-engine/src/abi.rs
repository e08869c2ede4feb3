//! Raw C symbol shapes exported by a vendor engine plugin.
//!
//! A plugin `.so` is expected to export exactly these symbols, with these
//! signatures. The loader resolves every one of them at open time; a
//! missing symbol aborts the load (`EngineError::MissingSymbol`).

use std::os::raw::{c_char, c_int, c_void};

/// A written detection: fixed-capacity output buffers since the adapter
/// does not assume the plugin exposes an allocator-compatible free
/// callback for heap-allocated strings.
#[repr(C)]
pub struct DetectedRaw {
    pub malware_name: [c_char; 256],
    pub detailed_url: [c_char; 512],
    /// 0 = Low, 1 = Medium, 2 = High.
    pub severity: c_int,
}

#[repr(C)]
pub struct UrlVerdictRaw {
    /// 0 = Unverified, 1 = Low, 2 = Medium, 3 = High.
    pub risk: c_int,
}

/// Return convention shared by every scan/check symbol: `0` = no
/// detection, `1` = detection written to the output pointer, negative =
/// plugin error code (translated via `get_error_string`).
pub const SCAN_RESULT_NONE: c_int = 0;
pub const SCAN_RESULT_DETECTED: c_int = 1;

pub type FnGlobalInitialize = unsafe extern "C" fn(ro_res_dir: *const c_char, rw_work_dir: *const c_char) -> c_int;
pub type FnGlobalDeinitialize = unsafe extern "C" fn();
pub type FnContextCreate = unsafe extern "C" fn() -> *mut c_void;
pub type FnContextDestroy = unsafe extern "C" fn(ctx: *mut c_void);

pub type FnScanData = unsafe extern "C" fn(ctx: *mut c_void, data: *const u8, len: usize, out: *mut DetectedRaw) -> c_int;
pub type FnScanFile = unsafe extern "C" fn(ctx: *mut c_void, path: *const c_char, out: *mut DetectedRaw) -> c_int;
pub type FnScanAppOnCloud = unsafe extern "C" fn(ctx: *mut c_void, app_root: *const c_char, out: *mut DetectedRaw) -> c_int;
pub type FnCheckUrl = unsafe extern "C" fn(ctx: *mut c_void, url: *const c_char, out: *mut UrlVerdictRaw) -> c_int;

pub type FnGetStringProp = unsafe extern "C" fn(buf: *mut c_char, buf_len: usize) -> c_int;
pub type FnGetI64Prop = unsafe extern "C" fn(out: *mut i64) -> c_int;
pub type FnGetBoolProp = unsafe extern "C" fn(out: *mut c_int) -> c_int;
pub type FnGetApiVersion = unsafe extern "C" fn() -> c_int;
pub type FnGetErrorString = unsafe extern "C" fn(code: c_int, buf: *mut c_char, buf_len: usize) -> c_int;

/// Symbols exported by every plugin, content and web alike.
pub const SYM_GLOBAL_INITIALIZE: &[u8] = b"global_initialize\0";
pub const SYM_GLOBAL_DEINITIALIZE: &[u8] = b"global_deinitialize\0";
pub const SYM_CONTEXT_CREATE: &[u8] = b"context_create\0";
pub const SYM_CONTEXT_DESTROY: &[u8] = b"context_destroy\0";
pub const SYM_GET_VENDOR: &[u8] = b"get_engine_vendor\0";
pub const SYM_GET_NAME: &[u8] = b"get_engine_name\0";
pub const SYM_GET_VERSION: &[u8] = b"get_engine_version\0";
pub const SYM_GET_DATA_VERSION: &[u8] = b"get_engine_data_version\0";
pub const SYM_GET_UPDATED_TIME: &[u8] = b"get_engine_latest_update_time\0";
pub const SYM_GET_ACTIVATED: &[u8] = b"get_engine_activated\0";
pub const SYM_GET_API_VERSION: &[u8] = b"get_engine_api_version\0";
pub const SYM_GET_ERROR_STRING: &[u8] = b"get_error_string\0";

/// Symbols additionally required by a content engine plugin.
pub const SYM_SCAN_DATA: &[u8] = b"scan_data\0";
pub const SYM_SCAN_FILE: &[u8] = b"scan_file\0";
pub const SYM_SCAN_APP_ON_CLOUD: &[u8] = b"scan_app_on_cloud\0";

/// Symbol additionally required by a web engine plugin.
pub const SYM_CHECK_URL: &[u8] = b"check_url\0";

/// Reads a NUL-terminated fixed buffer written by the plugin into an owned
/// `String`, stopping at the first NUL or the buffer's end.
pub fn cstr_buf_to_string(buf: &[c_char]) -> crate::error::Result<String> {
    let bytes: Vec<u8> = buf.iter().take_while(|&&b| b != 0).map(|&b| b as u8).collect();
    String::from_utf8(bytes).map_err(|_| crate::error::EngineError::InvalidString)
}
