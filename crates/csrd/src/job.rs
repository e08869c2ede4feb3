//! The single in-flight async job slot.
//!
//! The server only ever runs one asynchronous scan at a time in this
//! build: `ScanFilesAsync`/`ScanDirAsync`/`ScanDirsAsync` each register
//! their `ScanContext` here for the duration of the job so a later
//! `CANCEL` command — arriving on any connection, not necessarily the one
//! that started the job — can flip its stop flag. `judge_status`-style
//! admin commands never touch this; it is purely the cooperative
//! cancellation handle the worker pool's jobs check at target boundaries.

use std::sync::Mutex;

use csr_core::CsrError;
use csr_model::ScanContext;

#[derive(Default)]
pub struct JobRegistry {
    current: Mutex<Option<ScanContext>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `ctx` as the running job. Replaces whatever was there
    /// before — this build serializes async jobs one at a time.
    pub fn start(&self, ctx: ScanContext) {
        *self.current.lock().expect("job registry mutex poisoned") = Some(ctx);
    }

    pub fn clear(&self) {
        *self.current.lock().expect("job registry mutex poisoned") = None;
    }

    /// Handles a `CANCEL` command: sets the stop flag of the running
    /// job, or fails `NoTask` if nothing is running.
    pub fn cancel(&self) -> Result<(), CsrError> {
        match self.current.lock().expect("job registry mutex poisoned").as_ref() {
            Some(ctx) => {
                ctx.request_cancel();
                Ok(())
            }
            None => Err(CsrError::NoTask),
        }
    }
}
