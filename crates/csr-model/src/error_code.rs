use serde::{Deserialize, Serialize};

/// Wire error code: the first `i32` of every response payload.
///
/// Discriminants are explicit and stable — they are part of the wire
/// protocol, not an implementation detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    None = 0,
    InvalidHandle = 1,
    InvalidParameter = 2,
    OutOfMemory = 3,
    PermissionDenied = 4,
    Socket = 5,
    Server = 6,
    Db = 7,
    RemoveFailed = 8,
    FileDoNotExist = 9,
    FileChanged = 10,
    FileSystem = 11,
    EngineNotExist = 12,
    EngineDisabled = 13,
    EngineNotActivated = 14,
    EnginePermission = 15,
    EngineInternal = 16,
    Busy = 17,
    NoTask = 18,
    UserResponseFailed = 19,
    System = 20,
}

impl ErrorCode {
    pub fn is_ok(self) -> bool {
        matches!(self, ErrorCode::None)
    }

    /// Filesystem errors (`FileDoNotExist`, `FileChanged`, `FileSystem`,
    /// plus the generic `None`) are non-fatal inside an async event stream;
    /// everything else terminates the stream.
    pub fn is_fatal_in_stream(self) -> bool {
        !matches!(
            self,
            ErrorCode::None | ErrorCode::FileDoNotExist | ErrorCode::FileChanged | ErrorCode::FileSystem
        )
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code as i32
    }
}
