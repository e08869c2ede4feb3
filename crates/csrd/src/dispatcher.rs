//! Server dispatcher (C13): decode a command, authorize it, run the
//! matching `csr-core` logic on the worker pool, and write a framed reply.
//!
//! Every reply payload's first field is the `ErrorCode`; a command's
//! own fields follow only when that code is `NONE`. The three streaming
//! scan commands additionally write one frame per [`StreamFrame`] after
//! their initial reply, ending with `Complete` or `Fatal` — never both,
//! and never either if the job was cancelled mid-stream.

use std::path::PathBuf;
use std::sync::Arc;

use csr_core::{
    AccessControl, ContentScreening, CsrError, Endpoint, JudgeAction, PackageManager, PeerCredentials, Privilege,
    PrivilegeResolver, ScanEvent, UrlScreening,
};
use csr_engine::{ContentEngineHandle, WebEngineHandle};
use csr_fs::Visitor;
use csr_model::{Detected, EngineId, ErrorCode, HistoryRow, ScanContext, UrlVerdict};
use csr_prompt::PromptClient;
use csr_store::Store;
use csr_wire::{
    decode_scan_context, decode_url_context, encode_detected, encode_history_row, encode_url_verdict, read_frame,
    write_frame, AsyncEvent, Command, Decoder, Encoder, WireError,
};
use csr_worker::Pool;
use tokio::io::AsyncReadExt;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::job::JobRegistry;

/// Every collaborator the dispatcher needs, explicit rather than global
/// state (design note "Global state").
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub content_engine: Arc<dyn ContentEngineHandle>,
    pub web_engine: Arc<dyn WebEngineHandle>,
    pub visitor: Arc<Visitor>,
    pub prompt: Arc<PromptClient>,
    pub package_manager: Arc<dyn PackageManager>,
    pub access: Arc<AccessControl<csr_core::StaticPrivilegeResolver>>,
    pub pool: Arc<Pool>,
    pub jobs: Arc<JobRegistry>,
}

/// Runs `job` on the worker pool and awaits its result without blocking
/// the connection's tokio task — synchronous commands execute on the
/// pool, not the event loop.
async fn run_on_pool<T, F>(pool: &Pool, job: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = tokio::sync::oneshot::channel();
    pool.submit(move || {
        let _ = tx.send(job());
    });
    rx.await.expect("worker pool dropped the reply channel without sending")
}

fn decode_engine_id(dec: &mut Decoder<'_>) -> Result<EngineId, WireError> {
    match dec.i32()? {
        0 => Ok(EngineId::Content),
        1 => Ok(EngineId::Web),
        other => Err(WireError::protocol(format!("invalid engine id discriminant {other}"))),
    }
}

fn decode_judge_action(dec: &mut Decoder<'_>) -> Result<JudgeAction, WireError> {
    match dec.i32()? {
        0 => Ok(JudgeAction::Remove),
        1 => Ok(JudgeAction::Ignore),
        2 => Ok(JudgeAction::Unignore),
        other => Err(WireError::protocol(format!("invalid judge action discriminant {other}"))),
    }
}

fn encode_error_only(code: ErrorCode) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.i32(code.into());
    enc.into_payload()
}

/// Reads one request frame, authorizes and routes it, and writes the
/// reply frame(s). Returns a [`WireError`] only for framing/I-O failures
/// that the caller must treat as connection-ending; logic failures are
/// always encoded into the reply payload instead.
pub async fn dispatch(
    state: &AppState,
    endpoint: Endpoint,
    creds: PeerCredentials,
    reader: &mut OwnedReadHalf,
    writer: &mut OwnedWriteHalf,
) -> Result<(), WireError> {
    let payload = read_frame(reader).await?;
    let mut dec = Decoder::new(&payload);
    let opcode = dec.i32()?;
    let Some(command) = Command::from_i32(opcode) else {
        warn!(opcode, "rejecting unknown command discriminant");
        write_frame(writer, &encode_error_only(ErrorCode::InvalidParameter)).await?;
        return Ok(());
    };

    if state.access.authorize(&creds, required_privilege(command)).is_err() {
        write_frame(writer, &encode_error_only(ErrorCode::PermissionDenied)).await?;
        return Ok(());
    }

    debug!(?command, ?endpoint, uid = creds.uid, "dispatching request");

    match command {
        Command::ScanData => scan_data(state, &mut dec, writer).await,
        Command::ScanFile => scan_file(state, &mut dec, writer).await,
        Command::JudgeStatus => judge_status(state, &mut dec, writer).await,
        Command::GetDetected => get_detected(state, &mut dec, writer).await,
        Command::GetDetectedList => get_detected_list(state, &mut dec, writer).await,
        Command::GetIgnored => get_ignored(state, &mut dec, writer).await,
        Command::GetIgnoredList => get_ignored_list(state, &mut dec, writer).await,
        Command::CheckUrl => check_url(state, &mut dec, writer).await,
        Command::EmGetName => em_get_string(state, &mut dec, writer, |e| e.name()).await,
        Command::EmGetVendor => em_get_string(state, &mut dec, writer, |e| e.vendor()).await,
        Command::EmGetVersion => em_get_string(state, &mut dec, writer, |e| e.version()).await,
        Command::EmGetDataVersion => em_get_string(state, &mut dec, writer, |e| e.data_version()).await,
        Command::EmGetUpdatedTime => em_get_updated_time(state, &mut dec, writer).await,
        Command::EmGetActivated => em_get_activated(state, &mut dec, writer).await,
        Command::EmGetState => em_get_state(state, &mut dec, writer).await,
        Command::EmSetState => em_set_state(state, &mut dec, writer).await,
        Command::Cancel => cancel(state, writer).await,
        Command::ScanFilesAsync => scan_files_async(state, &mut dec, reader, writer).await,
        Command::ScanDirAsync => scan_dir_async(state, &mut dec, reader, writer).await,
        Command::ScanDirsAsync => scan_dirs_async(state, &mut dec, reader, writer).await,
    }
}

/// The privilege a command requires, independent of which socket it
/// arrived over: every `EM_*` engine-management command plus `JudgeStatus`
/// needs `antivirus.admin`; every scan/get/`CheckUrl` command needs only
/// `antivirus.scan`.
fn required_privilege(command: Command) -> Privilege {
    match command {
        Command::JudgeStatus
        | Command::EmGetName
        | Command::EmGetVendor
        | Command::EmGetVersion
        | Command::EmGetDataVersion
        | Command::EmGetUpdatedTime
        | Command::EmGetActivated
        | Command::EmGetState
        | Command::EmSetState => Privilege::Admin,
        Command::ScanData
        | Command::ScanFile
        | Command::ScanFilesAsync
        | Command::ScanDirAsync
        | Command::ScanDirsAsync
        | Command::Cancel
        | Command::GetDetected
        | Command::GetDetectedList
        | Command::GetIgnored
        | Command::GetIgnoredList
        | Command::CheckUrl => Privilege::Scan,
    }
}

fn encode_detected_reply(detected: &Option<Detected>) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.i32(ErrorCode::None.into());
    match detected {
        Some(d) => {
            enc.bool(true);
            encode_detected(&mut enc, d);
        }
        None => {
            enc.bool(false);
        }
    }
    enc.into_payload()
}

async fn scan_data(state: &AppState, dec: &mut Decoder<'_>, writer: &mut OwnedWriteHalf) -> Result<(), WireError> {
    let ctx = decode_scan_context(dec)?;
    let bytes = dec.bytes()?;

    let store = Arc::clone(&state.store);
    let engine = Arc::clone(&state.content_engine);
    let visitor = Arc::clone(&state.visitor);
    let prompt = Arc::clone(&state.prompt);
    let pm = Arc::clone(&state.package_manager);
    let result = run_on_pool(&state.pool, move || {
        let _guard = csr_core::apply_core_usage(ctx.core_usage);
        let screening = ContentScreening::new(&store, engine.as_ref(), &visitor, &prompt, pm.as_ref());
        screening.scan_data(&ctx, &bytes)
    })
    .await;

    write_sync_reply(writer, result.map(|d| encode_detected_reply(&d))).await
}

async fn scan_file(state: &AppState, dec: &mut Decoder<'_>, writer: &mut OwnedWriteHalf) -> Result<(), WireError> {
    let ctx = decode_scan_context(dec)?;
    let path = PathBuf::from(dec.string()?);

    let store = Arc::clone(&state.store);
    let engine = Arc::clone(&state.content_engine);
    let visitor = Arc::clone(&state.visitor);
    let prompt = Arc::clone(&state.prompt);
    let pm = Arc::clone(&state.package_manager);
    let result = run_on_pool(&state.pool, move || {
        let _guard = csr_core::apply_core_usage(ctx.core_usage);
        let screening = ContentScreening::new(&store, engine.as_ref(), &visitor, &prompt, pm.as_ref());
        screening.scan_file(&ctx, &path)
    })
    .await;

    write_sync_reply(writer, result.map(|d| encode_detected_reply(&d))).await
}

async fn judge_status(state: &AppState, dec: &mut Decoder<'_>, writer: &mut OwnedWriteHalf) -> Result<(), WireError> {
    let action = decode_judge_action(dec)?;
    let target = PathBuf::from(dec.string()?);

    let store = Arc::clone(&state.store);
    let engine = Arc::clone(&state.content_engine);
    let visitor = Arc::clone(&state.visitor);
    let prompt = Arc::clone(&state.prompt);
    let pm = Arc::clone(&state.package_manager);
    let result = run_on_pool(&state.pool, move || {
        let screening = ContentScreening::new(&store, engine.as_ref(), &visitor, &prompt, pm.as_ref());
        screening.judge(&target, action)
    })
    .await;

    write_sync_reply(writer, result.map(|()| encode_error_only(ErrorCode::None))).await
}

async fn get_detected(state: &AppState, dec: &mut Decoder<'_>, writer: &mut OwnedWriteHalf) -> Result<(), WireError> {
    let target_name = dec.string()?;
    let store = Arc::clone(&state.store);
    let result = run_on_pool(&state.pool, move || store.get_detected(&target_name)).await;
    write_sync_reply(writer, result.map_err(CsrError::from).map(encode_history_row_reply)).await
}

async fn get_ignored(state: &AppState, dec: &mut Decoder<'_>, writer: &mut OwnedWriteHalf) -> Result<(), WireError> {
    let target_name = dec.string()?;
    let store = Arc::clone(&state.store);
    let result = run_on_pool(&state.pool, move || store.get_ignored(&target_name)).await;
    write_sync_reply(writer, result.map_err(CsrError::from).map(encode_history_row_reply)).await
}

fn encode_history_row_reply(row: Option<HistoryRow>) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.i32(ErrorCode::None.into());
    match row {
        Some(row) => {
            enc.bool(true);
            encode_history_row(&mut enc, &row);
        }
        None => {
            enc.bool(false);
        }
    }
    enc.into_payload()
}

async fn get_detected_list(state: &AppState, dec: &mut Decoder<'_>, writer: &mut OwnedWriteHalf) -> Result<(), WireError> {
    let prefix = dec.string()?;
    let store = Arc::clone(&state.store);
    let result = run_on_pool(&state.pool, move || store.get_detected_list(&prefix)).await;
    write_sync_reply(writer, result.map_err(CsrError::from).map(encode_history_row_list_reply)).await
}

async fn get_ignored_list(state: &AppState, dec: &mut Decoder<'_>, writer: &mut OwnedWriteHalf) -> Result<(), WireError> {
    let prefix = dec.string()?;
    let store = Arc::clone(&state.store);
    let result = run_on_pool(&state.pool, move || store.get_ignored_list(&prefix)).await;
    write_sync_reply(writer, result.map_err(CsrError::from).map(encode_history_row_list_reply)).await
}

fn encode_history_row_list_reply(rows: Vec<HistoryRow>) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.i32(ErrorCode::None.into());
    enc.seq(&rows, |e, row| encode_history_row(e, row));
    enc.into_payload()
}

async fn check_url(state: &AppState, dec: &mut Decoder<'_>, writer: &mut OwnedWriteHalf) -> Result<(), WireError> {
    let ctx = decode_url_context(dec)?;
    let url = dec.string()?;

    let store = Arc::clone(&state.store);
    let engine = Arc::clone(&state.web_engine);
    let prompt = Arc::clone(&state.prompt);
    let result = run_on_pool(&state.pool, move || {
        let screening = UrlScreening::new(&store, engine.as_ref(), &prompt);
        screening.check_url(&ctx, &url)
    })
    .await;

    write_sync_reply(
        writer,
        result.map(|verdict| {
            let mut enc = Encoder::new();
            enc.i32(ErrorCode::None.into());
            encode_url_verdict(&mut enc, &verdict);
            enc.into_payload()
        }),
    )
    .await
}

async fn em_get_string(
    state: &AppState,
    dec: &mut Decoder<'_>,
    writer: &mut OwnedWriteHalf,
    get: impl Fn(&dyn csr_engine::EngineLifecycle) -> csr_engine::Result<String> + Send + 'static,
) -> Result<(), WireError> {
    let engine_id = decode_engine_id(dec)?;
    let content = Arc::clone(&state.content_engine);
    let web = Arc::clone(&state.web_engine);
    let result = run_on_pool(&state.pool, move || -> csr_core::Result<String> {
        let value = match engine_id {
            EngineId::Content => get(content.as_ref())?,
            EngineId::Web => get(web.as_ref())?,
        };
        Ok(value)
    })
    .await;

    write_sync_reply(
        writer,
        result.map(|value| {
            let mut enc = Encoder::new();
            enc.i32(ErrorCode::None.into());
            enc.string(&value);
            enc.into_payload()
        }),
    )
    .await
}

async fn em_get_updated_time(state: &AppState, dec: &mut Decoder<'_>, writer: &mut OwnedWriteHalf) -> Result<(), WireError> {
    let engine_id = decode_engine_id(dec)?;
    let content = Arc::clone(&state.content_engine);
    let web = Arc::clone(&state.web_engine);
    let result = run_on_pool(&state.pool, move || -> csr_core::Result<i64> {
        Ok(match engine_id {
            EngineId::Content => content.latest_update_time()?,
            EngineId::Web => web.latest_update_time()?,
        })
    })
    .await;

    write_sync_reply(
        writer,
        result.map(|value| {
            let mut enc = Encoder::new();
            enc.i32(ErrorCode::None.into());
            enc.i64(value);
            enc.into_payload()
        }),
    )
    .await
}

async fn em_get_activated(state: &AppState, dec: &mut Decoder<'_>, writer: &mut OwnedWriteHalf) -> Result<(), WireError> {
    let engine_id = decode_engine_id(dec)?;
    let content = Arc::clone(&state.content_engine);
    let web = Arc::clone(&state.web_engine);
    let result = run_on_pool(&state.pool, move || -> csr_core::Result<bool> {
        Ok(match engine_id {
            EngineId::Content => content.activated()?,
            EngineId::Web => web.activated()?,
        })
    })
    .await;

    write_sync_reply(writer, result.map(encode_bool_reply)).await
}

async fn em_get_state(state: &AppState, dec: &mut Decoder<'_>, writer: &mut OwnedWriteHalf) -> Result<(), WireError> {
    let engine_id = decode_engine_id(dec)?;
    let store = Arc::clone(&state.store);
    let result = run_on_pool(&state.pool, move || csr_core::is_enabled(&store, engine_id)).await;
    write_sync_reply(writer, result.map(encode_bool_reply)).await
}

fn encode_bool_reply(value: bool) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.i32(ErrorCode::None.into());
    enc.bool(value);
    enc.into_payload()
}

async fn em_set_state(state: &AppState, dec: &mut Decoder<'_>, writer: &mut OwnedWriteHalf) -> Result<(), WireError> {
    let engine_id = decode_engine_id(dec)?;
    let enabled = dec.bool()?;
    let store = Arc::clone(&state.store);
    let result = run_on_pool(&state.pool, move || csr_core::set_state(&store, engine_id, enabled)).await;
    write_sync_reply(writer, result.map(|()| encode_error_only(ErrorCode::None))).await
}

async fn cancel(state: &AppState, writer: &mut OwnedWriteHalf) -> Result<(), WireError> {
    let result = state.jobs.cancel();
    write_sync_reply(writer, result.map(|()| encode_error_only(ErrorCode::None))).await
}

async fn write_sync_reply(writer: &mut OwnedWriteHalf, result: csr_core::Result<Vec<u8>>) -> Result<(), WireError> {
    let payload = match result {
        Ok(payload) => payload,
        Err(e) => {
            debug!(error = %e, "request failed");
            encode_error_only(e.to_wire_code())
        }
    };
    write_frame(writer, &payload).await
}

/// One event written to an async command's connection after its initial
/// reply: a detection, a clean-scan notice, a per-target non-fatal
/// error, or one of the two terminal frames.
enum StreamFrame {
    Detected(Detected),
    Clean(String),
    TargetError { target: String, code: ErrorCode },
    Complete,
    Fatal(ErrorCode),
}

fn encode_stream_frame(frame: &StreamFrame) -> Vec<u8> {
    let mut enc = Encoder::new();
    match frame {
        StreamFrame::Detected(d) => {
            enc.i32(ErrorCode::None.into());
            enc.i32(AsyncEvent::MalwareDetected.into());
            encode_detected(&mut enc, d);
        }
        StreamFrame::Clean(path) => {
            enc.i32(ErrorCode::None.into());
            enc.i32(AsyncEvent::MalwareNone.into());
            enc.string(path);
        }
        StreamFrame::Complete => {
            enc.i32(ErrorCode::None.into());
            enc.i32(AsyncEvent::Complete.into());
        }
        StreamFrame::TargetError { target, code } => {
            enc.i32((*code).into());
            enc.string(target);
        }
        StreamFrame::Fatal(code) => {
            enc.i32((*code).into());
            enc.string("");
        }
    }
    enc.into_payload()
}

fn scan_event_to_frame(event: ScanEvent) -> StreamFrame {
    match event {
        ScanEvent::Detected(d) => StreamFrame::Detected(d),
        ScanEvent::Clean(path) => StreamFrame::Clean(path),
        ScanEvent::Error { target, code } => StreamFrame::TargetError { target, code },
    }
}

/// What an async scan job walks. Kept as data rather than a generic
/// closure parameter over `ContentScreening` itself, whose borrowed engine
/// reference can't be named across the pool-thread boundary.
enum ScanTargets {
    Files(Vec<PathBuf>),
    Dir(PathBuf),
    Dirs(Vec<PathBuf>),
}

/// Drives one of the three async scan commands: decodes its request,
/// writes the initial reply, then streams [`StreamFrame`]s produced by a
/// pool job until the job signals `Complete`, a fatal error, or silent
/// cancellation (no further frames at all once the peer cancels).
///
/// Concurrently watches `reader` for peer hang-up — cancellation of a
/// client during async work is signaled by the client closing its end of
/// the connection — since this connection has no pipelining and sends no
/// further request frames once a stream is in flight — any read activity
/// at all on it means the peer went away.
async fn run_async_scan(
    state: &AppState,
    reader: &mut OwnedReadHalf,
    writer: &mut OwnedWriteHalf,
    ctx: ScanContext,
    targets: ScanTargets,
) -> Result<(), WireError> {
    // A cheap pool round trip surfaces an up-front failure (disabled
    // engine, say) as the sole reply with no stream following — the job
    // never starts in that case.
    let store = Arc::clone(&state.store);
    let precheck = run_on_pool(&state.pool, move || csr_core::ensure_enabled(&store, EngineId::Content)).await;
    if let Err(e) = precheck {
        write_frame(writer, &encode_error_only(e.to_wire_code())).await?;
        return Ok(());
    }

    write_frame(writer, &encode_error_only(ErrorCode::None)).await?;
    state.jobs.start(ctx.clone());

    let (tx, mut rx) = mpsc::unbounded_channel::<StreamFrame>();
    let store = Arc::clone(&state.store);
    let engine = Arc::clone(&state.content_engine);
    let visitor = Arc::clone(&state.visitor);
    let prompt = Arc::clone(&state.prompt);
    let pm = Arc::clone(&state.package_manager);
    let job_ctx = ctx.clone();
    state.pool.submit(move || {
        let _guard = csr_core::apply_core_usage(job_ctx.core_usage);
        let screening = ContentScreening::new(&store, engine.as_ref(), &visitor, &prompt, pm.as_ref());
        let sender = tx.clone();
        let emit = |e: ScanEvent| {
            let _ = sender.send(scan_event_to_frame(e));
        };
        let outcome = match targets {
            ScanTargets::Files(files) => screening.scan_files_async(&job_ctx, &files, emit),
            ScanTargets::Dir(dir) => screening.scan_dir_async(&job_ctx, &dir, emit),
            ScanTargets::Dirs(dirs) => screening.scan_dirs_async(&job_ctx, &dirs, emit),
        };
        match outcome {
            Ok(()) if job_ctx.is_cancelled() => {}
            Ok(()) => {
                let _ = tx.send(StreamFrame::Complete);
            }
            Err(e) => {
                let _ = tx.send(StreamFrame::Fatal(e.to_wire_code()));
            }
        }
    });

    let mut hung_up = false;
    let mut probe = [0u8; 1];
    loop {
        tokio::select! {
            frame = rx.recv() => {
                match frame {
                    Some(frame) => {
                        let terminal = matches!(frame, StreamFrame::Complete | StreamFrame::Fatal(_));
                        write_frame(writer, &encode_stream_frame(&frame)).await?;
                        if terminal {
                            break;
                        }
                    }
                    None => break,
                }
            }
            res = reader.read(&mut probe), if !hung_up => {
                // The client never sends another frame while a stream is
                // in flight; any outcome here other than "still open with
                // nothing to say" means it went away.
                if !matches!(res, Ok(n) if n > 0) {
                    hung_up = true;
                    ctx.request_cancel();
                }
            }
        }
    }
    state.jobs.clear();
    Ok(())
}

async fn scan_files_async(
    state: &AppState,
    dec: &mut Decoder<'_>,
    reader: &mut OwnedReadHalf,
    writer: &mut OwnedWriteHalf,
) -> Result<(), WireError> {
    let ctx = decode_scan_context(dec)?;
    let targets: Vec<PathBuf> = dec.seq(|d| d.string().map(PathBuf::from))?;
    run_async_scan(state, reader, writer, ctx, ScanTargets::Files(targets)).await
}

async fn scan_dir_async(
    state: &AppState,
    dec: &mut Decoder<'_>,
    reader: &mut OwnedReadHalf,
    writer: &mut OwnedWriteHalf,
) -> Result<(), WireError> {
    let ctx = decode_scan_context(dec)?;
    let dir = PathBuf::from(dec.string()?);
    run_async_scan(state, reader, writer, ctx, ScanTargets::Dir(dir)).await
}

async fn scan_dirs_async(
    state: &AppState,
    dec: &mut Decoder<'_>,
    reader: &mut OwnedReadHalf,
    writer: &mut OwnedWriteHalf,
) -> Result<(), WireError> {
    let ctx = decode_scan_context(dec)?;
    let dirs: Vec<PathBuf> = dec.seq(|d| d.string().map(PathBuf::from))?;
    run_async_scan(state, reader, writer, ctx, ScanTargets::Dirs(dirs)).await
}
