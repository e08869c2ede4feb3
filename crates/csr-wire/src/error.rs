use thiserror::Error;

/// Errors raised by framing and decoding. Both close the connection:
/// a short read means the peer went away mid-frame, a protocol error
/// means the payload didn't match the expected field sequence.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("i/o error reading or writing a frame: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame exceeds maximum length ({len} > {max})")]
    FrameTooLarge { len: u64, max: u64 },

    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl WireError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        WireError::Protocol(msg.into())
    }
}
