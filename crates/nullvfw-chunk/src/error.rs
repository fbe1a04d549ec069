/// Errors that can occur while encoding or decoding chunks.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// The payload exceeds the configured maximum size.
    #[error("chunk payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The stream ended inside a chunk.
    #[error("stream ended inside a chunk ({received} of {expected} bytes)")]
    Truncated { expected: usize, received: usize },

    /// An I/O error occurred while reading or writing chunks.
    #[error("chunk I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChunkError>;
