use crate::context::DriverId;
use crate::message::MessageId;
use crate::status::Status;

/// Errors raised while handling a single driver message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    /// The token is null, the invalid sentinel, or not a live instance.
    #[error("{message} sent to {token}, which is not a live instance")]
    InvalidToken { token: DriverId, message: MessageId },

    /// A required operand was absent.
    #[error("{message} is missing its {operand}")]
    MissingArgument {
        message: MessageId,
        operand: &'static str,
    },

    /// The capability query buffer cannot hold an info record.
    #[error("info buffer too small ({size} bytes, need {required})")]
    InfoBufferTooSmall { size: usize, required: usize },

    /// The destination cannot hold the payload.
    #[error("destination holds {capacity} bytes, payload needs {required}")]
    InsufficientCapacity { capacity: usize, required: usize },

    /// The source slice is shorter than the descriptor declares.
    #[error("source holds {len} bytes, descriptor declares {declared}")]
    ShortSource { len: usize, declared: usize },

    /// Storage for a new instance could not be reserved.
    #[error("cannot reserve storage for a new instance")]
    Exhausted,
}

impl DriverError {
    /// The status surfaced to the caller for this error.
    pub fn status(&self) -> Status {
        match self {
            Self::InvalidToken { .. }
            | Self::MissingArgument { .. }
            | Self::InfoBufferTooSmall { .. }
            | Self::ShortSource { .. } => Status::BadParam,
            Self::InsufficientCapacity { .. } => Status::Memory,
            Self::Exhausted => Status::Cancel,
        }
    }
}

/// Stage of a sequential stream that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStage {
    Open,
    Negotiate,
    Begin,
    Compress,
    Decompress,
}

impl std::fmt::Display for StreamStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Negotiate => "size negotiation",
            Self::Begin => "begin",
            Self::Compress => "compress",
            Self::Decompress => "decompress",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the sequential stream sessions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The driver rejected a stage of the stream.
    #[error("{stage} failed with status {status:?}")]
    Rejected { stage: StreamStage, status: Status },

    /// The driver answered with a reply the stage does not expect.
    #[error("{stage} returned an unexpected reply (raw {raw})")]
    UnexpectedReply { stage: StreamStage, raw: isize },

    /// A frame did not match the negotiated geometry.
    #[error("{stage} was given {len} bytes, at most {capacity} fit")]
    FrameTooLarge {
        stage: StreamStage,
        len: usize,
        capacity: usize,
    },
}

impl StreamError {
    pub fn stage(&self) -> StreamStage {
        match self {
            Self::Rejected { stage, .. }
            | Self::UnexpectedReply { stage, .. }
            | Self::FrameTooLarge { stage, .. } => *stage,
        }
    }

    /// The status closest to this error.
    pub fn status(&self) -> Status {
        match self {
            Self::Rejected { status, .. } => *status,
            Self::UnexpectedReply { .. } => Status::Unsupported,
            Self::FrameTooLarge { .. } => Status::Memory,
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
