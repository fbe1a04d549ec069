//! Driver message state machine for a pass-through video codec.
//!
//! The [`Driver`] answers the host's driver messages: lifecycle notifications,
//! open and close of instances, capability queries and the compress and
//! decompress transforms, which copy their input unchanged. Unknown messages
//! are handed to a [`DefaultResponder`] supplied by the host.
//!
//! [`CompressSession`] and [`DecompressSession`] drive a sequence of frames
//! through the same messages so callers do not have to.
//!
//! This crate holds no raw pointers. Decoding the host's raw operands into
//! [`Message`] values is the job of the ABI layer.

pub mod capability;
pub mod context;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod fourcc;
pub mod info;
pub mod message;
pub mod mode;
pub mod status;
pub mod stream;

pub use capability::{close_typed, open_typed, CapabilityHost, DriverProcFn, Hic, OpenRequest};
pub use context::{ContextTable, DriverContext, DriverId, Negotiated};
pub use descriptor::{FrameDescriptor, DESCRIPTOR_SIZE};
pub use dispatcher::{DefaultResponder, Driver, DriverConfig, NullResponder};
pub use error::{DriverError, Result, StreamError, StreamStage};
pub use fourcc::{FourCc, ParseFourCcError, BI_RGB, CHUNK_COMPRESSED, NULL_CODEC, VIDEO};
pub use info::{CodecInfo, INFO_SIZE};
pub use message::{
    CodecMessage, CompressRequest, DecompressRequest, FrameBuffers, Lifecycle, Message,
    MessageClass, MessageId, OpenParams, RawMessage,
};
pub use status::{Reply, Status};
pub use stream::{CompressSession, CompressedFrame, DecompressSession};
