use std::ffi::CString;
use std::os::raw::c_int;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use csr_model::{Detected, Severity, UrlVerdict, Risk, UserResponse};
use libloading::{Library, Symbol};

use crate::abi::*;
use crate::error::{EngineError, Result};
use crate::handle::{ContentEngineHandle, EngineCtx, EngineLifecycle, WebEngineHandle};

fn path_to_cstring(path: &Path) -> Result<CString> {
    CString::new(path.as_os_str().to_string_lossy().as_bytes())
        .map_err(|_| EngineError::InvalidString)
}

macro_rules! resolve {
    ($lib:expr, $name:expr, $ty:ty) => {{
        let sym: Symbol<'_, $ty> = unsafe { $lib.get($name) }.map_err(|_| {
            EngineError::MissingSymbol(std::str::from_utf8(&$name[..$name.len() - 1]).unwrap_or("?"))
        })?;
        *sym
    }};
}

/// Symbols shared by both engine kinds, resolved once at open time.
struct CommonSymbols {
    global_initialize: FnGlobalInitialize,
    global_deinitialize: FnGlobalDeinitialize,
    context_create: FnContextCreate,
    context_destroy: FnContextDestroy,
    get_vendor: FnGetStringProp,
    get_name: FnGetStringProp,
    get_version: FnGetStringProp,
    get_data_version: FnGetStringProp,
    get_updated_time: FnGetI64Prop,
    get_activated: FnGetBoolProp,
    get_api_version: FnGetApiVersion,
    get_error_string: FnGetErrorString,
}

impl CommonSymbols {
    fn resolve(lib: &Library) -> Result<Self> {
        Ok(Self {
            global_initialize: resolve!(lib, SYM_GLOBAL_INITIALIZE, FnGlobalInitialize),
            global_deinitialize: resolve!(lib, SYM_GLOBAL_DEINITIALIZE, FnGlobalDeinitialize),
            context_create: resolve!(lib, SYM_CONTEXT_CREATE, FnContextCreate),
            context_destroy: resolve!(lib, SYM_CONTEXT_DESTROY, FnContextDestroy),
            get_vendor: resolve!(lib, SYM_GET_VENDOR, FnGetStringProp),
            get_name: resolve!(lib, SYM_GET_NAME, FnGetStringProp),
            get_version: resolve!(lib, SYM_GET_VERSION, FnGetStringProp),
            get_data_version: resolve!(lib, SYM_GET_DATA_VERSION, FnGetStringProp),
            get_updated_time: resolve!(lib, SYM_GET_UPDATED_TIME, FnGetI64Prop),
            get_activated: resolve!(lib, SYM_GET_ACTIVATED, FnGetBoolProp),
            get_api_version: resolve!(lib, SYM_GET_API_VERSION, FnGetApiVersion),
            get_error_string: resolve!(lib, SYM_GET_ERROR_STRING, FnGetErrorString),
        })
    }

    fn get_string(&self, f: FnGetStringProp) -> Result<String> {
        let mut buf = [0 as std::os::raw::c_char; 256];
        let rc = unsafe { f(buf.as_mut_ptr(), buf.len()) };
        if rc < 0 {
            return Err(EngineError::Internal(rc));
        }
        cstr_buf_to_string(&buf)
    }

    fn error_string(&self, code: c_int) -> Result<String> {
        let mut buf = [0 as std::os::raw::c_char; 256];
        let rc = unsafe { (self.get_error_string)(code, buf.as_mut_ptr(), buf.len()) };
        if rc < 0 {
            return Err(EngineError::Internal(rc));
        }
        cstr_buf_to_string(&buf)
    }
}

fn unix_now() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

fn translate_scan_result(rc: c_int, out: &DetectedRaw) -> Result<Option<Detected>> {
    match rc {
        SCAN_RESULT_NONE => Ok(None),
        SCAN_RESULT_DETECTED => {
            let severity = match out.severity {
                0 => Severity::Low,
                1 => Severity::Medium,
                _ => Severity::High,
            };
            Ok(Some(Detected {
                target_name: String::new(),
                malware_name: cstr_buf_to_string(&out.malware_name)?,
                detailed_url: cstr_buf_to_string(&out.detailed_url)?,
                severity,
                ts: unix_now(),
                is_app: false,
                pkg_id: String::new(),
                user_response: UserResponse::NotAsked,
            }))
        }
        rc => Err(EngineError::Internal(rc)),
    }
}

/// A loaded content-engine plugin: owns the library handle for the process
/// lifetime and the resolved content-scan symbol vector.
pub struct ContentEngineLibrary {
    // Kept alive so the resolved function pointers below remain valid;
    // never unloaded while `self` is reachable.
    _lib: Library,
    common: CommonSymbols,
    scan_data: FnScanData,
    scan_file: FnScanFile,
    scan_app_on_cloud: FnScanAppOnCloud,
}

impl ContentEngineLibrary {
    /// Opens `path` and resolves every required content-engine symbol.
    /// Fails closed: any missing symbol aborts the load.
    pub fn open(path: &Path) -> Result<Self> {
        let lib = unsafe { Library::new(path) }?;
        let common = CommonSymbols::resolve(&lib)?;
        let scan_data = resolve!(lib, SYM_SCAN_DATA, FnScanData);
        let scan_file = resolve!(lib, SYM_SCAN_FILE, FnScanFile);
        let scan_app_on_cloud = resolve!(lib, SYM_SCAN_APP_ON_CLOUD, FnScanAppOnCloud);
        Ok(Self {
            _lib: lib,
            common,
            scan_data,
            scan_file,
            scan_app_on_cloud,
        })
    }
}

impl EngineLifecycle for ContentEngineLibrary {
    fn global_initialize(&self, ro_res_dir: &Path, rw_work_dir: &Path) -> Result<()> {
        let ro = path_to_cstring(ro_res_dir)?;
        let rw = path_to_cstring(rw_work_dir)?;
        let rc = unsafe { (self.common.global_initialize)(ro.as_ptr(), rw.as_ptr()) };
        if rc != 0 {
            return Err(EngineError::Internal(rc));
        }
        Ok(())
    }

    fn context_create(&self) -> Result<EngineCtx> {
        let ptr = unsafe { (self.common.context_create)() };
        if ptr.is_null() {
            return Err(EngineError::Internal(-1));
        }
        Ok(EngineCtx(ptr as usize))
    }

    fn context_destroy(&self, ctx: EngineCtx) {
        unsafe { (self.common.context_destroy)(ctx.0 as *mut _) }
    }

    fn vendor(&self) -> Result<String> {
        self.common.get_string(self.common.get_vendor)
    }

    fn name(&self) -> Result<String> {
        self.common.get_string(self.common.get_name)
    }

    fn version(&self) -> Result<String> {
        self.common.get_string(self.common.get_version)
    }

    fn data_version(&self) -> Result<String> {
        self.common.get_string(self.common.get_data_version)
    }

    fn latest_update_time(&self) -> Result<i64> {
        let mut out = 0i64;
        let rc = unsafe { (self.common.get_updated_time)(&mut out) };
        if rc != 0 {
            return Err(EngineError::Internal(rc));
        }
        Ok(out)
    }

    fn activated(&self) -> Result<bool> {
        let mut out = 0;
        let rc = unsafe { (self.common.get_activated)(&mut out) };
        if rc != 0 {
            return Err(EngineError::Internal(rc));
        }
        Ok(out != 0)
    }

    fn api_version(&self) -> Result<i32> {
        Ok(unsafe { (self.common.get_api_version)() })
    }

    fn error_string(&self, code: i32) -> Result<String> {
        self.common.error_string(code)
    }
}

impl ContentEngineHandle for ContentEngineLibrary {
    fn scan_data(&self, ctx: EngineCtx, bytes: &[u8]) -> Result<Option<Detected>> {
        let mut out = blank_detected_raw();
        let rc = unsafe { (self.scan_data)(ctx.0 as *mut _, bytes.as_ptr(), bytes.len(), &mut out) };
        translate_scan_result(rc, &out)
    }

    fn scan_file(&self, ctx: EngineCtx, path: &Path) -> Result<Option<Detected>> {
        let c_path = path_to_cstring(path)?;
        let mut out = blank_detected_raw();
        let rc = unsafe { (self.scan_file)(ctx.0 as *mut _, c_path.as_ptr(), &mut out) };
        translate_scan_result(rc, &out)
    }

    fn scan_app_on_cloud(&self, ctx: EngineCtx, app_root: &Path) -> Result<Option<Detected>> {
        let c_path = path_to_cstring(app_root)?;
        let mut out = blank_detected_raw();
        let rc = unsafe { (self.scan_app_on_cloud)(ctx.0 as *mut _, c_path.as_ptr(), &mut out) };
        translate_scan_result(rc, &out)
    }
}

/// A loaded web-engine plugin.
pub struct WebEngineLibrary {
    _lib: Library,
    common: CommonSymbols,
    check_url: FnCheckUrl,
}

impl WebEngineLibrary {
    pub fn open(path: &Path) -> Result<Self> {
        let lib = unsafe { Library::new(path) }?;
        let common = CommonSymbols::resolve(&lib)?;
        let check_url = resolve!(lib, SYM_CHECK_URL, FnCheckUrl);
        Ok(Self { _lib: lib, common, check_url })
    }
}

impl EngineLifecycle for WebEngineLibrary {
    fn global_initialize(&self, ro_res_dir: &Path, rw_work_dir: &Path) -> Result<()> {
        let ro = path_to_cstring(ro_res_dir)?;
        let rw = path_to_cstring(rw_work_dir)?;
        let rc = unsafe { (self.common.global_initialize)(ro.as_ptr(), rw.as_ptr()) };
        if rc != 0 {
            return Err(EngineError::Internal(rc));
        }
        Ok(())
    }

    fn context_create(&self) -> Result<EngineCtx> {
        let ptr = unsafe { (self.common.context_create)() };
        if ptr.is_null() {
            return Err(EngineError::Internal(-1));
        }
        Ok(EngineCtx(ptr as usize))
    }

    fn context_destroy(&self, ctx: EngineCtx) {
        unsafe { (self.common.context_destroy)(ctx.0 as *mut _) }
    }

    fn vendor(&self) -> Result<String> {
        self.common.get_string(self.common.get_vendor)
    }

    fn name(&self) -> Result<String> {
        self.common.get_string(self.common.get_name)
    }

    fn version(&self) -> Result<String> {
        self.common.get_string(self.common.get_version)
    }

    fn data_version(&self) -> Result<String> {
        self.common.get_string(self.common.get_data_version)
    }

    fn latest_update_time(&self) -> Result<i64> {
        let mut out = 0i64;
        let rc = unsafe { (self.common.get_updated_time)(&mut out) };
        if rc != 0 {
            return Err(EngineError::Internal(rc));
        }
        Ok(out)
    }

    fn activated(&self) -> Result<bool> {
        let mut out = 0;
        let rc = unsafe { (self.common.get_activated)(&mut out) };
        if rc != 0 {
            return Err(EngineError::Internal(rc));
        }
        Ok(out != 0)
    }

    fn api_version(&self) -> Result<i32> {
        Ok(unsafe { (self.common.get_api_version)() })
    }

    fn error_string(&self, code: i32) -> Result<String> {
        self.common.error_string(code)
    }
}

impl WebEngineHandle for WebEngineLibrary {
    fn check_url(&self, ctx: EngineCtx, url: &str) -> Result<Option<UrlVerdict>> {
        let c_url = CString::new(url).map_err(|_| EngineError::InvalidString)?;
        let mut out = UrlVerdictRaw { risk: 0 };
        let rc = unsafe { (self.check_url)(ctx.0 as *mut _, c_url.as_ptr(), &mut out) };
        match rc {
            SCAN_RESULT_NONE => Ok(None),
            SCAN_RESULT_DETECTED => {
                let risk = match out.risk {
                    0 => Risk::Unverified,
                    1 => Risk::Low,
                    2 => Risk::Medium,
                    _ => Risk::High,
                };
                Ok(Some(UrlVerdict::new(risk, url)))
            }
            rc => Err(EngineError::Internal(rc)),
        }
    }
}

fn blank_detected_raw() -> DetectedRaw {
    DetectedRaw {
        malware_name: [0; 256],
        detailed_url: [0; 512],
        severity: 0,
    }
}
