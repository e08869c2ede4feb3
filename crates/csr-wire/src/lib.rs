//! # CSR Wire Codec
//!
//! Length-prefixed binary framing and typed (de)serialization for the CSR
//! server protocol.
//!
//! A frame is `u64 length` (host-endian) followed by `length` bytes of
//! payload. The payload is a flat stream of typed fields — encoder and
//! decoder agree position-by-position, there is no field tag. Composite
//! records define their own serialize/deserialize pairs by concatenation;
//! this is the *only* versioning mechanism, so both peers must share a code
//! base version.
//!
//! A short read (fewer than `length` bytes before EOF) is a framing error;
//! a type mismatch during decode is a protocol error. Both close the
//! connection (see [`WireError`]).

mod codec;
mod command;
mod error;
mod frame;
mod records;

pub use codec::{Decoder, Encoder};
pub use command::{AsyncEvent, Command};
pub use error::WireError;
pub use frame::{read_frame, write_frame, MAX_FRAME_LEN};
pub use records::{
    decode_detected, decode_history_row, decode_scan_context, decode_url_context, decode_url_verdict,
    encode_detected, encode_history_row, encode_scan_context, encode_url_context, encode_url_verdict,
};
