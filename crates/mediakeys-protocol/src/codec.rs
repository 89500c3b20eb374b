//! Length-prefixed JSON framing.
//!
//! Every frame is a 4-byte little-endian payload length followed by a UTF-8
//! JSON document. This is the framing Chrome uses for native messaging, and
//! the daemon's control socket uses it too so a host can relay frames without
//! re-encoding.

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::codec::LengthDelimitedCodec;

use crate::Result;

/// Largest accepted payload (Chrome caps host-to-browser messages at 1 MiB).
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Width of the length header in bytes.
pub const HEADER_LEN: usize = 4;

/// Build a codec for use with `tokio_util::codec::Framed{Read,Write}`.
pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(HEADER_LEN)
        .little_endian()
        .max_frame_length(MAX_FRAME_LEN)
        .new_codec()
}

/// Serialize a message into a frame payload (without the length header).
pub fn encode<T: Serialize>(msg: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(msg)?))
}

/// Deserialize a frame payload.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(payload)?)
}

/// Serialize a message into a complete frame, header included.
pub fn encode_frame<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(msg)?;
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}
