//! Sequential frame streaming on top of the dispatcher.
//!
//! A [`CompressSession`] owns exactly one instance token from `start` until it
//! is ended or dropped. Every message it sends goes through
//! [`Driver::dispatch`], so a session produces the same bytes as driving the
//! messages by hand.

use tracing::{debug, trace};

use crate::context::DriverId;
use crate::descriptor::FrameDescriptor;
use crate::dispatcher::{DefaultResponder, Driver};
use crate::error::{StreamError, StreamStage};
use crate::fourcc::{FourCc, VIDEO};
use crate::message::{CodecMessage, CompressRequest, FrameBuffers, Message, OpenParams};
use crate::mode::ICMODE_COMPRESS;
use crate::status::{Reply, Status, AVIIF_KEYFRAME};

/// One encoded frame, borrowed from the session's output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressedFrame<'a> {
    pub data: &'a [u8],
    pub key_frame: bool,
    pub chunk_id: FourCc,
}

/// A compression stream over one driver instance.
pub struct CompressSession<'d, R: DefaultResponder> {
    driver: &'d Driver<R>,
    token: DriverId,
    input: FrameDescriptor,
    output: FrameDescriptor,
    buffer: Vec<u8>,
    frames: u64,
    begun: bool,
    closed: bool,
}

impl<'d, R: DefaultResponder> CompressSession<'d, R> {
    /// Open an instance, negotiate the output size and begin compression.
    ///
    /// On failure any instance already opened is closed before returning.
    pub fn start(driver: &'d Driver<R>, input: FrameDescriptor) -> Result<Self, StreamError> {
        let mut params = OpenParams::new(VIDEO, driver.config().handler, ICMODE_COMPRESS);
        let token = match driver.dispatch(DriverId::NULL, Message::Open(Some(&mut params))) {
            Reply::Opened(token) => token,
            reply => return Err(unexpected(StreamStage::Open, reply)),
        };

        // From here on, dropping the session closes the token.
        let mut session = Self {
            driver,
            token,
            input,
            output: FrameDescriptor::default(),
            buffer: Vec::new(),
            frames: 0,
            begun: false,
            closed: false,
        };
        session.negotiate()?;
        session.begin()?;

        debug!(
            %token,
            width = input.width,
            height = input.height,
            bit_count = input.bit_count,
            frame_size = session.buffer.len(),
            "compress stream started"
        );
        Ok(session)
    }

    fn negotiate(&mut self) -> Result<(), StreamError> {
        let mut output = FrameDescriptor::default();
        let reply = self.driver.dispatch(
            self.token,
            Message::Codec(CodecMessage::CompressGetSize {
                input: Some(&self.input),
                output: Some(&mut output),
            }),
        );
        let Reply::Size(size) = reply else {
            return Err(unexpected(StreamStage::Negotiate, reply));
        };
        if size == 0 {
            return Err(StreamError::Rejected {
                stage: StreamStage::Negotiate,
                status: Status::BadParam,
            });
        }

        let len = size as usize;
        self.buffer
            .try_reserve_exact(len)
            .map_err(|_| StreamError::Rejected {
                stage: StreamStage::Negotiate,
                status: Status::Memory,
            })?;
        self.buffer.resize(len, 0);

        output.compression = self.driver.config().handler;
        output.size_image = size;
        self.output = output;
        Ok(())
    }

    fn begin(&mut self) -> Result<(), StreamError> {
        let reply = self.driver.dispatch(
            self.token,
            Message::Codec(CodecMessage::CompressBegin {
                input: Some(&self.input),
                output: Some(&self.output),
            }),
        );
        expect_ok(StreamStage::Begin, reply)?;
        self.begun = true;
        Ok(())
    }

    /// Compress one frame.
    ///
    /// The returned data stays valid until the next call to `step`.
    pub fn step(&mut self, flags: u32, frame: &[u8]) -> Result<CompressedFrame<'_>, StreamError> {
        let driver = self.driver;
        let mut output = self.output;
        let mut chunk_id = FourCc::default();
        let mut frame_flags = 0u32;

        let reply = driver.dispatch(
            self.token,
            Message::Codec(CodecMessage::Compress(CompressRequest {
                flags,
                input: Some(&self.input),
                output: Some(&mut output),
                buffers: FrameBuffers::Split {
                    input: frame,
                    output: &mut self.buffer,
                },
                chunk_id: Some(&mut chunk_id),
                frame_flags: Some(&mut frame_flags),
                frame_num: i32::try_from(self.frames).unwrap_or(i32::MAX),
                frame_size: self.input.image_size(),
                quality: 0,
            })),
        );
        expect_ok(StreamStage::Compress, reply)?;

        self.frames += 1;
        let len = (output.size_image as usize).min(self.buffer.len());
        trace!(token = %self.token, frame = self.frames, len, "frame compressed");
        Ok(CompressedFrame {
            data: &self.buffer[..len],
            key_frame: frame_flags & AVIIF_KEYFRAME != 0,
            chunk_id,
        })
    }

    /// End compression and close the instance.
    pub fn end(mut self) -> Result<(), StreamError> {
        self.teardown()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn token(&self) -> DriverId {
        self.token
    }

    /// The negotiated input format.
    pub fn input(&self) -> &FrameDescriptor {
        &self.input
    }

    /// The negotiated output format.
    pub fn output(&self) -> &FrameDescriptor {
        &self.output
    }

    // Close runs even when end is refused, so the token never outlives the session.
    fn teardown(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let ended = if self.begun {
            let reply = self
                .driver
                .dispatch(self.token, Message::Codec(CodecMessage::CompressEnd));
            expect_ok(StreamStage::Compress, reply)
        } else {
            Ok(())
        };
        self.driver.dispatch(self.token, Message::Close);
        debug!(token = %self.token, frames = self.frames, "compress stream ended");
        ended
    }
}

impl<R: DefaultResponder> Drop for CompressSession<'_, R> {
    fn drop(&mut self) {
        let _ = self.teardown();
    }
}

impl<R: DefaultResponder> std::fmt::Debug for CompressSession<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressSession")
            .field("token", &self.token)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

/// A decompression stream.
///
/// The pass-through transform keeps no per-frame state, so no instance is
/// opened; each step is a bounds-checked copy of the encoded bytes.
#[derive(Debug)]
pub struct DecompressSession {
    input: FrameDescriptor,
    output: FrameDescriptor,
    buffer: Vec<u8>,
    frames: u64,
}

impl DecompressSession {
    /// Capacity per frame comes from `output.image_size()`.
    pub fn start(input: FrameDescriptor, output: FrameDescriptor) -> Result<Self, StreamError> {
        let capacity = output.image_size() as usize;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|_| StreamError::Rejected {
                stage: StreamStage::Begin,
                status: Status::Memory,
            })?;
        buffer.resize(capacity, 0);

        debug!(
            width = output.width,
            height = output.height,
            capacity,
            "decompress stream started"
        );
        Ok(Self {
            input,
            output,
            buffer,
            frames: 0,
        })
    }

    /// Decompress one frame, returning exactly `data.len()` bytes.
    pub fn step(&mut self, data: &[u8]) -> Result<&[u8], StreamError> {
        let capacity = self.buffer.len();
        if data.len() > capacity {
            return Err(StreamError::FrameTooLarge {
                stage: StreamStage::Decompress,
                len: data.len(),
                capacity,
            });
        }

        self.buffer[..data.len()].copy_from_slice(data);
        self.frames += 1;
        trace!(frame = self.frames, len = data.len(), "frame decompressed");
        Ok(&self.buffer[..data.len()])
    }

    pub fn end(self) {
        debug!(frames = self.frames, "decompress stream ended");
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn input(&self) -> &FrameDescriptor {
        &self.input
    }

    pub fn output(&self) -> &FrameDescriptor {
        &self.output
    }
}

fn expect_ok(stage: StreamStage, reply: Reply) -> Result<(), StreamError> {
    match reply {
        Reply::Status(Status::Ok) => Ok(()),
        reply => Err(unexpected(stage, reply)),
    }
}

fn unexpected(stage: StreamStage, reply: Reply) -> StreamError {
    match reply {
        Reply::Status(status) => StreamError::Rejected { stage, status },
        reply => StreamError::UnexpectedReply {
            stage,
            raw: reply.into_raw(),
        },
    }
}
