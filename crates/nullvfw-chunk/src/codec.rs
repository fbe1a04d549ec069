use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ChunkError, Result};

/// Chunk header: payload length (4) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Default maximum payload size: 256 MiB, enough for one 8K RGBA frame.
pub const DEFAULT_MAX_PAYLOAD: usize = 256 * 1024 * 1024;

/// Encode one chunk into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬─────────────────┐
/// │ Length       │ Payload         │
/// │ (4B LE)      │ (Length bytes)  │
/// └──────────────┴─────────────────┘
/// ```
pub fn encode_chunk(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(ChunkError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Decode one chunk from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete chunk yet.
/// On success, consumes the chunk bytes from the buffer.
pub fn decode_chunk(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let mut header = [0u8; HEADER_SIZE];
    header.copy_from_slice(&src[..HEADER_SIZE]);
    let payload_len = u32::from_le_bytes(header) as usize;

    if payload_len > max_payload {
        return Err(ChunkError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    if src.len() < HEADER_SIZE + payload_len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}

/// The total wire size of a chunk carrying `payload_len` bytes.
pub fn wire_size(payload_len: usize) -> usize {
    HEADER_SIZE + payload_len
}

/// Configuration for the chunk container.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum payload size in bytes. Default: 256 MiB.
    pub max_payload_size: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
