use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use crate::codec::{decode_chunk, ChunkConfig, HEADER_SIZE};
use crate::error::{ChunkError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 64 * 1024;
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Reads complete chunks from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete chunks.
pub struct ChunkReader<T> {
    inner: T,
    buf: BytesMut,
    config: ChunkConfig,
    chunks_read: u64,
}

impl<T: Read> ChunkReader<T> {
    /// Create a new chunk reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ChunkConfig::default())
    }

    /// Create a new chunk reader with explicit configuration.
    pub fn with_config(inner: T, config: ChunkConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            chunks_read: 0,
        }
    }

    /// Read the next complete chunk (blocking).
    ///
    /// Returns `Ok(None)` when the stream ends exactly on a chunk boundary and
    /// `Err(ChunkError::Truncated)` when it ends inside one.
    pub fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(chunk) = decode_chunk(&mut self.buf, self.config.max_payload_size)? {
                self.chunks_read += 1;
                tracing::trace!(index = self.chunks_read, size = chunk.len(), "chunk read");
                return Ok(Some(chunk));
            }

            let mut scratch = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut scratch) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ChunkError::Io(err)),
            };

            if read == 0 {
                return self.finish();
            }

            self.buf.extend_from_slice(&scratch[..read]);
        }
    }

    fn finish(&self) -> Result<Option<Bytes>> {
        if self.buf.is_empty() {
            return Ok(None);
        }

        let expected = if self.buf.len() < HEADER_SIZE {
            HEADER_SIZE
        } else {
            let mut header = [0u8; HEADER_SIZE];
            header.copy_from_slice(&self.buf[..HEADER_SIZE]);
            HEADER_SIZE + u32::from_le_bytes(header) as usize
        };

        Err(ChunkError::Truncated {
            expected,
            received: self.buf.len(),
        })
    }

    /// Number of complete chunks returned so far.
    pub fn chunks_read(&self) -> u64 {
        self.chunks_read
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current chunk reader configuration.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }
}

impl<T: Read> Iterator for ChunkReader<T> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_chunk().transpose()
    }
}
