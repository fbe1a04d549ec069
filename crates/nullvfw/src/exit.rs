use std::fmt;
use std::io;

use nullvfw_chunk::ChunkError;
use nullvfw_driver::StreamError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const CODEC_REJECTED: i32 = 6;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => FAILURE,
        io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn chunk_error(context: &str, err: ChunkError) -> CliError {
    match err {
        ChunkError::Io(source) => io_error(context, source),
        other @ (ChunkError::PayloadTooLarge { .. } | ChunkError::Truncated { .. }) => {
            CliError::new(DATA_INVALID, format!("{context}: {other}"))
        }
    }
}

pub fn stream_error(context: &str, err: StreamError) -> CliError {
    match err {
        StreamError::Rejected { .. } => CliError::new(CODEC_REJECTED, format!("{context}: {err}")),
        StreamError::FrameTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        StreamError::UnexpectedReply { .. } => {
            CliError::new(INTERNAL, format!("{context}: {err}"))
        }
    }
}
