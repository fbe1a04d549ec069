//! The driver message state machine.
//!
//! [`Driver::dispatch_with`] classifies a message by identifier before any
//! operand is read. Codec-class messages pass a single token gate; only then
//! are their operands decoded and handled. Lifecycle notifications never touch
//! state, open and close manage the [`ContextTable`], and everything the driver
//! does not recognize goes to the host's [`DefaultResponder`].

use tracing::{debug, trace, warn};

use crate::context::{ContextTable, DriverContext, DriverId, Negotiated};
use crate::descriptor::FrameDescriptor;
use crate::error::{DriverError, Result};
use crate::fourcc::{FourCc, CHUNK_COMPRESSED, NULL_CODEC, VIDEO};
use crate::info::{
    CodecInfo, ICVERSION, INFO_SIZE, VIDCF_FASTTEMPORALD, VIDCF_QUALITY, VIDCF_TEMPORAL,
};
use crate::message::{
    CodecMessage, CompressRequest, DecompressRequest, FrameBuffers, Message, MessageClass,
    MessageId, OpenParams, RawMessage, ICM_COMPRESS, ICM_COMPRESS_GET_SIZE, ICM_DECOMPRESS,
    ICM_GETINFO,
};
use crate::status::{Reply, Status, AVIIF_KEYFRAME, ICERR_OK};

/// Identity the driver reports through the capability query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Identity tag, also the compression tag of encoded frames.
    pub handler: FourCc,
    pub name: String,
    pub description: String,
    /// `VIDCF_*` capability flags.
    pub flags: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            handler: NULL_CODEC,
            name: "Null".to_string(),
            description: "Null pass-through codec".to_string(),
            flags: VIDCF_TEMPORAL | VIDCF_FASTTEMPORALD | VIDCF_QUALITY,
        }
    }
}

/// The host's handling for messages the driver does not recognize.
pub trait DefaultResponder {
    fn respond(&self, token: DriverId, message: &RawMessage) -> isize;
}

/// Answers `0` to everything. Used where no host handler exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResponder;

impl DefaultResponder for NullResponder {
    fn respond(&self, _token: DriverId, _message: &RawMessage) -> isize {
        0
    }
}

impl<F> DefaultResponder for F
where
    F: Fn(DriverId, &RawMessage) -> isize,
{
    fn respond(&self, token: DriverId, message: &RawMessage) -> isize {
        self(token, message)
    }
}

/// A pass-through codec driver.
#[derive(Debug)]
pub struct Driver<R = NullResponder> {
    config: DriverConfig,
    contexts: ContextTable,
    responder: R,
}

impl Driver<NullResponder> {
    pub fn new() -> Self {
        Self::with_responder(NullResponder)
    }
}

impl Default for Driver<NullResponder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: DefaultResponder> Driver<R> {
    pub fn with_responder(responder: R) -> Self {
        Self::with_config(DriverConfig::default(), responder)
    }

    pub fn with_config(config: DriverConfig, responder: R) -> Self {
        Self {
            config,
            contexts: ContextTable::new(),
            responder,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Number of instances opened and not yet closed.
    pub fn live_instances(&self) -> usize {
        self.contexts.len()
    }

    /// Copy of a live instance's context.
    pub fn context(&self, token: DriverId) -> Option<DriverContext> {
        self.contexts.snapshot(token)
    }

    /// Handle one fully decoded message.
    pub fn dispatch(&self, token: DriverId, message: Message<'_>) -> Reply {
        let id = message.id();
        self.dispatch_with(token, id, move || message)
    }

    /// Handle one message, decoding its operands only once it has passed the
    /// token gate.
    ///
    /// `decode` must produce a message whose identifier is `id`.
    pub fn dispatch_with<'a, F>(&self, token: DriverId, id: MessageId, decode: F) -> Reply
    where
        F: FnOnce() -> Message<'a>,
    {
        debug!(message = %id, %token, "dispatch");

        if id.class() == MessageClass::Codec && !self.contexts.contains(token) {
            return self.reject(token, DriverError::InvalidToken { token, message: id });
        }

        let message = decode();
        if message.id() != id {
            warn!(expected = %id, decoded = %message.id(), "operands decoded for another message");
            return Reply::Status(Status::BadParam);
        }

        match message {
            Message::Lifecycle(lifecycle) => {
                trace!(?lifecycle, "lifecycle notification");
                Reply::DriverOk
            }
            Message::Open(params) => self.open(params),
            Message::Close => self.close(token),
            Message::Codec(codec) => match self.codec(token, codec) {
                Ok(reply) => reply,
                Err(err) => self.reject(token, err),
            },
            Message::Other(raw) => {
                let answer = self.responder.respond(token, &raw);
                debug!(message = %id, answer, "deferred to default responder");
                Reply::Default(answer)
            }
        }
    }

    fn reject(&self, token: DriverId, err: DriverError) -> Reply {
        let status = err.status();
        warn!(%token, error = %err, ?status, "message rejected");
        Reply::Status(status)
    }

    fn open(&self, params: Option<&mut OpenParams>) -> Reply {
        let Some(params) = params else {
            debug!("open without open record");
            return Reply::Status(Status::InstanceInvalid);
        };

        match self.contexts.insert(DriverContext::new(params)) {
            Ok(token) => {
                params.error = ICERR_OK;
                debug!(
                    %token,
                    fcc_type = %params.fcc_type,
                    fcc_handler = %params.fcc_handler,
                    mode = crate::mode::mode_name(params.flags),
                    "instance opened"
                );
                Reply::Opened(token)
            }
            Err(err) => self.reject(DriverId::NULL, err),
        }
    }

    fn close(&self, token: DriverId) -> Reply {
        match self.contexts.remove(token) {
            Some(context) => debug!(
                %token,
                frames_compressed = context.frames_compressed,
                frames_decompressed = context.frames_decompressed,
                "instance closed"
            ),
            None => debug!(%token, "close of a token that is not live"),
        }
        Reply::DriverOk
    }

    fn codec(&self, token: DriverId, message: CodecMessage<'_>) -> Result<Reply> {
        match message {
            CodecMessage::GetInfo { info, size } => {
                self.get_info(info, size)?;
                Ok(Status::Ok.into())
            }
            CodecMessage::CompressGetSize { input, output } => {
                let input = input.ok_or(DriverError::MissingArgument {
                    message: ICM_COMPRESS_GET_SIZE,
                    operand: "input descriptor",
                })?;
                if let Some(output) = output {
                    *output = *input;
                }
                Ok(Reply::Size(input.image_size()))
            }
            CodecMessage::CompressBegin { input, output } => {
                let negotiated = negotiate(input, output);
                self.contexts.with(token, |context| context.compress = negotiated);
                Ok(Status::Ok.into())
            }
            CodecMessage::CompressEnd => {
                self.contexts.with(token, |context| context.compress = None);
                Ok(Status::Ok.into())
            }
            CodecMessage::Compress(request) => {
                compress(request)?;
                self.contexts
                    .with(token, |context| context.frames_compressed += 1);
                Ok(Status::Ok.into())
            }
            CodecMessage::DecompressGetFormat { input, output } => {
                if let (Some(input), Some(output)) = (input, output) {
                    *output = *input;
                }
                Ok(Status::Ok.into())
            }
            CodecMessage::DecompressBegin { input, output } => {
                let negotiated = negotiate(input, output);
                self.contexts
                    .with(token, |context| context.decompress = negotiated);
                Ok(Status::Ok.into())
            }
            CodecMessage::DecompressEnd => {
                self.contexts.with(token, |context| context.decompress = None);
                Ok(Status::Ok.into())
            }
            CodecMessage::Decompress(request) => {
                decompress(request)?;
                self.contexts
                    .with(token, |context| context.frames_decompressed += 1);
                Ok(Status::Ok.into())
            }
            CodecMessage::CompressQuery
            | CodecMessage::CompressGetFormat
            | CodecMessage::DecompressQuery
            | CodecMessage::Configure
            | CodecMessage::About
            | CodecMessage::GetState
            | CodecMessage::SetState
            | CodecMessage::GetQuality
            | CodecMessage::SetQuality => Ok(Status::Ok.into()),
        }
    }

    fn get_info(&self, info: Option<&mut CodecInfo>, size: usize) -> Result<()> {
        if size < INFO_SIZE {
            return Err(DriverError::InfoBufferTooSmall {
                size,
                required: INFO_SIZE,
            });
        }
        let info = info.ok_or(DriverError::MissingArgument {
            message: ICM_GETINFO,
            operand: "info record",
        })?;

        *info = CodecInfo::zeroed();
        info.size = INFO_SIZE as u32;
        info.fcc_type = VIDEO;
        info.fcc_handler = self.config.handler;
        info.flags = self.config.flags;
        info.version_icm = ICVERSION;
        info.set_name(&self.config.name);
        info.set_description(&self.config.description);
        Ok(())
    }
}

fn negotiate(
    input: Option<&FrameDescriptor>,
    output: Option<&FrameDescriptor>,
) -> Option<Negotiated> {
    input.map(|input| Negotiated {
        input: *input,
        output: output.copied(),
    })
}

fn compress(request: CompressRequest<'_>) -> Result<()> {
    let CompressRequest {
        input,
        output,
        buffers,
        chunk_id,
        frame_flags,
        frame_size,
        ..
    } = request;

    let input = input.ok_or(missing(ICM_COMPRESS, "input descriptor"))?;
    let output = output.ok_or(missing(ICM_COMPRESS, "output descriptor"))?;
    let required = input.image_size();
    let len = required as usize;
    let stated = frame_size as usize;

    match buffers {
        FrameBuffers::Missing => return Err(missing(ICM_COMPRESS, "frame buffer")),
        FrameBuffers::Split { input: src, output: dst } => {
            check_capacity(stated.min(dst.len()), len)?;
            check_source(src.len(), len)?;
            dst[..len].copy_from_slice(&src[..len]);
        }
        FrameBuffers::InPlace(buffer) => {
            check_capacity(stated.min(buffer.len()), len)?;
            trace!(len, "in-place compress, copy skipped");
        }
    }

    if let Some(chunk_id) = chunk_id {
        *chunk_id = CHUNK_COMPRESSED;
    }
    if let Some(frame_flags) = frame_flags {
        *frame_flags = AVIIF_KEYFRAME;
    }
    output.size_image = required;
    trace!(len, "frame compressed");
    Ok(())
}

fn decompress(request: DecompressRequest<'_>) -> Result<()> {
    let input = request
        .input
        .ok_or(missing(ICM_DECOMPRESS, "input descriptor"))?;
    let output = request
        .output
        .ok_or(missing(ICM_DECOMPRESS, "output descriptor"))?;
    let len = input.image_size() as usize;
    let stated = output.image_size() as usize;

    match request.buffers {
        FrameBuffers::Missing => return Err(missing(ICM_DECOMPRESS, "frame buffer")),
        FrameBuffers::Split { input: src, output: dst } => {
            check_capacity(stated.min(dst.len()), len)?;
            check_source(src.len(), len)?;
            dst[..len].copy_from_slice(&src[..len]);
        }
        FrameBuffers::InPlace(buffer) => {
            check_capacity(stated.min(buffer.len()), len)?;
            trace!(len, "in-place decompress, copy skipped");
        }
    }
    trace!(len, "frame decompressed");
    Ok(())
}

fn missing(message: MessageId, operand: &'static str) -> DriverError {
    DriverError::MissingArgument { message, operand }
}

fn check_capacity(capacity: usize, required: usize) -> Result<()> {
    if capacity < required {
        return Err(DriverError::InsufficientCapacity { capacity, required });
    }
    Ok(())
}

fn check_source(len: usize, declared: usize) -> Result<()> {
    if len < declared {
        return Err(DriverError::ShortSource { len, declared });
    }
    Ok(())
}
