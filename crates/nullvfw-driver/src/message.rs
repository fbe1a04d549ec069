//! Driver message identifiers and their typed operand views.
//!
//! Every message falls into exactly one [`MessageClass`], decided by the
//! identifier alone. Operands are only ever viewed through the variant that
//! matches the identifier, so a message can never be read with the wrong shape.

use std::fmt;

use crate::descriptor::FrameDescriptor;
use crate::fourcc::FourCc;
use crate::info::CodecInfo;

/// Numeric driver message identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub u32);

pub const DRV_LOAD: MessageId = MessageId(0x0001);
pub const DRV_ENABLE: MessageId = MessageId(0x0002);
pub const DRV_OPEN: MessageId = MessageId(0x0003);
pub const DRV_CLOSE: MessageId = MessageId(0x0004);
pub const DRV_DISABLE: MessageId = MessageId(0x0005);
pub const DRV_FREE: MessageId = MessageId(0x0006);
pub const DRV_CONFIGURE: MessageId = MessageId(0x0007);
pub const DRV_QUERYCONFIGURE: MessageId = MessageId(0x0008);
pub const DRV_INSTALL: MessageId = MessageId(0x0009);
pub const DRV_REMOVE: MessageId = MessageId(0x000A);
pub const DRV_POWER: MessageId = MessageId(0x000F);

const ICM_USER: u32 = 0x4000;
const ICM_RESERVED: u32 = 0x5000;

pub const ICM_GETSTATE: MessageId = MessageId(ICM_RESERVED);
pub const ICM_SETSTATE: MessageId = MessageId(ICM_RESERVED + 1);
pub const ICM_GETINFO: MessageId = MessageId(ICM_RESERVED + 2);
pub const ICM_CONFIGURE: MessageId = MessageId(ICM_RESERVED + 10);
pub const ICM_ABOUT: MessageId = MessageId(ICM_RESERVED + 11);
pub const ICM_GETQUALITY: MessageId = MessageId(ICM_RESERVED + 31);
pub const ICM_SETQUALITY: MessageId = MessageId(ICM_RESERVED + 32);

pub const ICM_COMPRESS_GET_FORMAT: MessageId = MessageId(ICM_USER + 4);
pub const ICM_COMPRESS_GET_SIZE: MessageId = MessageId(ICM_USER + 5);
pub const ICM_COMPRESS_QUERY: MessageId = MessageId(ICM_USER + 6);
pub const ICM_COMPRESS_BEGIN: MessageId = MessageId(ICM_USER + 7);
pub const ICM_COMPRESS: MessageId = MessageId(ICM_USER + 8);
pub const ICM_COMPRESS_END: MessageId = MessageId(ICM_USER + 9);
pub const ICM_DECOMPRESS_GET_FORMAT: MessageId = MessageId(ICM_USER + 10);
pub const ICM_DECOMPRESS_QUERY: MessageId = MessageId(ICM_USER + 11);
pub const ICM_DECOMPRESS_BEGIN: MessageId = MessageId(ICM_USER + 12);
pub const ICM_DECOMPRESS: MessageId = MessageId(ICM_USER + 13);
pub const ICM_DECOMPRESS_END: MessageId = MessageId(ICM_USER + 14);

/// Every codec-class identifier, in host order.
pub const CODEC_MESSAGES: [MessageId; 18] = [
    ICM_COMPRESS_GET_FORMAT,
    ICM_COMPRESS_GET_SIZE,
    ICM_COMPRESS_QUERY,
    ICM_COMPRESS_BEGIN,
    ICM_COMPRESS,
    ICM_COMPRESS_END,
    ICM_DECOMPRESS_GET_FORMAT,
    ICM_DECOMPRESS_QUERY,
    ICM_DECOMPRESS_BEGIN,
    ICM_DECOMPRESS,
    ICM_DECOMPRESS_END,
    ICM_GETSTATE,
    ICM_SETSTATE,
    ICM_GETINFO,
    ICM_CONFIGURE,
    ICM_ABOUT,
    ICM_GETQUALITY,
    ICM_SETQUALITY,
];

/// The four disjoint message classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    /// Load/enable/disable/free/configure/power notifications.
    Lifecycle,
    /// Open and close of an instance.
    Instance,
    /// Capability and transform messages; require a live instance token.
    Codec,
    /// Anything else; answered by the host's default responder.
    Unknown,
}

impl MessageId {
    /// Classify this identifier.
    pub fn class(self) -> MessageClass {
        if Lifecycle::from_id(self).is_some() {
            MessageClass::Lifecycle
        } else if self == DRV_OPEN || self == DRV_CLOSE {
            MessageClass::Instance
        } else if CODEC_MESSAGES.contains(&self) {
            MessageClass::Codec
        } else {
            MessageClass::Unknown
        }
    }

    /// Symbolic name, or `"unknown"`.
    pub fn name(self) -> &'static str {
        match self {
            DRV_LOAD => "DRV_LOAD",
            DRV_ENABLE => "DRV_ENABLE",
            DRV_OPEN => "DRV_OPEN",
            DRV_CLOSE => "DRV_CLOSE",
            DRV_DISABLE => "DRV_DISABLE",
            DRV_FREE => "DRV_FREE",
            DRV_CONFIGURE => "DRV_CONFIGURE",
            DRV_QUERYCONFIGURE => "DRV_QUERYCONFIGURE",
            DRV_INSTALL => "DRV_INSTALL",
            DRV_REMOVE => "DRV_REMOVE",
            DRV_POWER => "DRV_POWER",
            ICM_GETSTATE => "ICM_GETSTATE",
            ICM_SETSTATE => "ICM_SETSTATE",
            ICM_GETINFO => "ICM_GETINFO",
            ICM_CONFIGURE => "ICM_CONFIGURE",
            ICM_ABOUT => "ICM_ABOUT",
            ICM_GETQUALITY => "ICM_GETQUALITY",
            ICM_SETQUALITY => "ICM_SETQUALITY",
            ICM_COMPRESS_GET_FORMAT => "ICM_COMPRESS_GET_FORMAT",
            ICM_COMPRESS_GET_SIZE => "ICM_COMPRESS_GET_SIZE",
            ICM_COMPRESS_QUERY => "ICM_COMPRESS_QUERY",
            ICM_COMPRESS_BEGIN => "ICM_COMPRESS_BEGIN",
            ICM_COMPRESS => "ICM_COMPRESS",
            ICM_COMPRESS_END => "ICM_COMPRESS_END",
            ICM_DECOMPRESS_GET_FORMAT => "ICM_DECOMPRESS_GET_FORMAT",
            ICM_DECOMPRESS_QUERY => "ICM_DECOMPRESS_QUERY",
            ICM_DECOMPRESS_BEGIN => "ICM_DECOMPRESS_BEGIN",
            ICM_DECOMPRESS => "ICM_DECOMPRESS",
            ICM_DECOMPRESS_END => "ICM_DECOMPRESS_END",
            _ => "unknown",
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:#06x})", self.name(), self.0)
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Lifecycle notifications. They carry no operands the driver reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Load,
    Enable,
    Disable,
    Free,
    Configure,
    QueryConfigure,
    Power,
}

impl Lifecycle {
    pub fn from_id(id: MessageId) -> Option<Self> {
        match id {
            DRV_LOAD => Some(Self::Load),
            DRV_ENABLE => Some(Self::Enable),
            DRV_DISABLE => Some(Self::Disable),
            DRV_FREE => Some(Self::Free),
            DRV_CONFIGURE => Some(Self::Configure),
            DRV_QUERYCONFIGURE => Some(Self::QueryConfigure),
            DRV_POWER => Some(Self::Power),
            _ => None,
        }
    }

    pub fn id(self) -> MessageId {
        match self {
            Self::Load => DRV_LOAD,
            Self::Enable => DRV_ENABLE,
            Self::Disable => DRV_DISABLE,
            Self::Free => DRV_FREE,
            Self::Configure => DRV_CONFIGURE,
            Self::QueryConfigure => DRV_QUERYCONFIGURE,
            Self::Power => DRV_POWER,
        }
    }
}

/// Layout-identical to the host's open record, passed with `DRV_OPEN`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenParams {
    pub size: u32,
    pub fcc_type: FourCc,
    pub fcc_handler: FourCc,
    pub version: u32,
    /// Open mode, see [`crate::mode`].
    pub flags: u32,
    /// Written by the driver: the outcome of the open.
    pub error: isize,
    pub reserved1: usize,
    pub reserved2: usize,
    pub dev_node: u32,
}

impl OpenParams {
    pub fn new(fcc_type: FourCc, fcc_handler: FourCc, mode: u32) -> Self {
        Self {
            size: std::mem::size_of::<Self>() as u32,
            fcc_type,
            fcc_handler,
            version: 0,
            flags: mode,
            error: 0,
            reserved1: 0,
            reserved2: 0,
            dev_node: 0,
        }
    }
}

/// An untyped message as the host delivered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMessage {
    /// The host's driver handle (reserved operand).
    pub hdrvr: isize,
    pub id: MessageId,
    pub lparam1: isize,
    pub lparam2: isize,
}

/// Source and destination payloads of one transform.
#[derive(Debug)]
pub enum FrameBuffers<'a> {
    /// Distinct source and destination.
    Split {
        input: &'a [u8],
        output: &'a mut [u8],
    },
    /// Source and destination are the same buffer.
    InPlace(&'a mut [u8]),
    /// At least one buffer was not supplied.
    Missing,
}

impl FrameBuffers<'_> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Operands of one compress call.
#[derive(Debug)]
pub struct CompressRequest<'a> {
    pub flags: u32,
    pub input: Option<&'a FrameDescriptor>,
    pub output: Option<&'a mut FrameDescriptor>,
    pub buffers: FrameBuffers<'a>,
    /// Receives the chunk identifier of the output.
    pub chunk_id: Option<&'a mut FourCc>,
    /// Receives the frame flags of the output (key frame or not).
    pub frame_flags: Option<&'a mut u32>,
    pub frame_num: i32,
    /// Stated capacity of the destination in bytes.
    pub frame_size: u32,
    pub quality: u32,
}

/// Operands of one decompress call.
#[derive(Debug)]
pub struct DecompressRequest<'a> {
    pub flags: u32,
    pub input: Option<&'a FrameDescriptor>,
    pub output: Option<&'a FrameDescriptor>,
    pub buffers: FrameBuffers<'a>,
}

/// Codec-class messages with their operands.
#[derive(Debug)]
pub enum CodecMessage<'a> {
    GetInfo {
        /// Present only when the declared buffer can hold a whole record.
        info: Option<&'a mut CodecInfo>,
        /// Buffer size the caller declared.
        size: usize,
    },
    CompressQuery,
    CompressGetFormat,
    CompressGetSize {
        input: Option<&'a FrameDescriptor>,
        output: Option<&'a mut FrameDescriptor>,
    },
    CompressBegin {
        input: Option<&'a FrameDescriptor>,
        output: Option<&'a FrameDescriptor>,
    },
    Compress(CompressRequest<'a>),
    CompressEnd,
    DecompressQuery,
    DecompressGetFormat {
        input: Option<&'a FrameDescriptor>,
        output: Option<&'a mut FrameDescriptor>,
    },
    DecompressBegin {
        input: Option<&'a FrameDescriptor>,
        output: Option<&'a FrameDescriptor>,
    },
    Decompress(DecompressRequest<'a>),
    DecompressEnd,
    Configure,
    About,
    GetState,
    SetState,
    GetQuality,
    SetQuality,
}

impl CodecMessage<'_> {
    /// The operand-free codec messages, built from their identifier.
    pub fn simple(id: MessageId) -> Option<CodecMessage<'static>> {
        let message = match id {
            ICM_COMPRESS_QUERY => CodecMessage::CompressQuery,
            ICM_COMPRESS_GET_FORMAT => CodecMessage::CompressGetFormat,
            ICM_COMPRESS_END => CodecMessage::CompressEnd,
            ICM_DECOMPRESS_QUERY => CodecMessage::DecompressQuery,
            ICM_DECOMPRESS_END => CodecMessage::DecompressEnd,
            ICM_CONFIGURE => CodecMessage::Configure,
            ICM_ABOUT => CodecMessage::About,
            ICM_GETSTATE => CodecMessage::GetState,
            ICM_SETSTATE => CodecMessage::SetState,
            ICM_GETQUALITY => CodecMessage::GetQuality,
            ICM_SETQUALITY => CodecMessage::SetQuality,
            _ => return None,
        };
        Some(message)
    }

    pub fn id(&self) -> MessageId {
        match self {
            Self::GetInfo { .. } => ICM_GETINFO,
            Self::CompressQuery => ICM_COMPRESS_QUERY,
            Self::CompressGetFormat => ICM_COMPRESS_GET_FORMAT,
            Self::CompressGetSize { .. } => ICM_COMPRESS_GET_SIZE,
            Self::CompressBegin { .. } => ICM_COMPRESS_BEGIN,
            Self::Compress(_) => ICM_COMPRESS,
            Self::CompressEnd => ICM_COMPRESS_END,
            Self::DecompressQuery => ICM_DECOMPRESS_QUERY,
            Self::DecompressGetFormat { .. } => ICM_DECOMPRESS_GET_FORMAT,
            Self::DecompressBegin { .. } => ICM_DECOMPRESS_BEGIN,
            Self::Decompress(_) => ICM_DECOMPRESS,
            Self::DecompressEnd => ICM_DECOMPRESS_END,
            Self::Configure => ICM_CONFIGURE,
            Self::About => ICM_ABOUT,
            Self::GetState => ICM_GETSTATE,
            Self::SetState => ICM_SETSTATE,
            Self::GetQuality => ICM_GETQUALITY,
            Self::SetQuality => ICM_SETQUALITY,
        }
    }
}

/// A driver message with its operands.
#[derive(Debug)]
pub enum Message<'a> {
    Lifecycle(Lifecycle),
    /// `None` when the host sent no open record.
    Open(Option<&'a mut OpenParams>),
    Close,
    Codec(CodecMessage<'a>),
    Other(RawMessage),
}

impl Message<'_> {
    pub fn id(&self) -> MessageId {
        match self {
            Self::Lifecycle(lifecycle) => lifecycle.id(),
            Self::Open(_) => DRV_OPEN,
            Self::Close => DRV_CLOSE,
            Self::Codec(codec) => codec.id(),
            Self::Other(raw) => raw.id,
        }
    }

    pub fn class(&self) -> MessageClass {
        self.id().class()
    }
}
