use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::WireError;

/// Refuses to allocate more than 64 MiB for a single frame payload. Not
/// part of the wire format itself; a defensive bound so a malformed
/// length prefix can't be used to force an unbounded allocation.
pub const MAX_FRAME_LEN: u64 = 64 * 1024 * 1024;

/// Reads one length-prefixed frame: `u64 length` (host-endian) followed by
/// `length` payload bytes.
///
/// A clean EOF before any bytes are read propagates as `WireError::Io` with
/// `ErrorKind::UnexpectedEof`; a short read mid-payload surfaces as
/// `WireError::ShortRead`. Both are framing errors — the caller closes the
/// connection on either.
pub async fn read_frame<R: tokio::io::AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, WireError> {
    let mut len_buf = [0u8; 8];
    reader.read_exact(&mut len_buf).await?;
    let len = u64::from_ne_bytes(len_buf);

    if len > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge { len, max: MAX_FRAME_LEN });
    }

    let mut payload = vec![0u8; len as usize];
    match reader.read_exact(&mut payload).await {
        Ok(()) => Ok(payload),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(WireError::ShortRead {
            expected: len as usize,
            got: 0,
        }),
        Err(e) => Err(e.into()),
    }
}

/// Writes one length-prefixed frame.
pub async fn write_frame<W: tokio::io::AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<(), WireError> {
    let len = payload.len() as u64;
    writer.write_all(&len.to_ne_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}
