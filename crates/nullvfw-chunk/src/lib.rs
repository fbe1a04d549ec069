//! Length-prefixed chunk container for encoded frame streams.
//!
//! The codec itself never frames its output: one compress call yields one
//! chunk whose bytes are exactly the frame payload. Callers that keep many
//! frames in a single file or pipe prefix each chunk with:
//! - A 4-byte little-endian payload length
//!
//! and nothing else. Readers always hand back complete chunks.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_chunk, encode_chunk, wire_size, ChunkConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use error::{ChunkError, Result};
pub use reader::ChunkReader;
pub use writer::ChunkWriter;
