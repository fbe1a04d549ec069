//! Decoding of raw driver procedure operands into typed messages.
//!
//! Only called after the dispatcher has classified the identifier and, for
//! codec messages, accepted the token.

use std::ffi::c_void;

use nullvfw_driver::message::{
    CodecMessage, CompressRequest, DecompressRequest, FrameBuffers, Lifecycle, Message,
    MessageClass, MessageId, OpenParams, RawMessage, DRV_OPEN, ICM_COMPRESS,
    ICM_COMPRESS_BEGIN, ICM_COMPRESS_GET_SIZE, ICM_DECOMPRESS, ICM_DECOMPRESS_BEGIN,
    ICM_DECOMPRESS_GET_FORMAT, ICM_GETINFO,
};
use nullvfw_driver::{CodecInfo, FourCc, FrameDescriptor, INFO_SIZE};
use tracing::trace;

use crate::types::{IcCompress, IcDecompress};

/// Build the typed view of one raw message.
///
/// # Safety
/// Every non-null pointer operand must be valid for the record the host ABI
/// defines for `id`, and the buffers it references must hold the sizes their
/// descriptors state, for the whole lifetime `'a`.
pub(crate) unsafe fn decode<'a>(
    hdrvr: isize,
    id: MessageId,
    lparam1: isize,
    lparam2: isize,
) -> Message<'a> {
    let raw = RawMessage {
        hdrvr,
        id,
        lparam1,
        lparam2,
    };
    match id.class() {
        MessageClass::Lifecycle => match Lifecycle::from_id(id) {
            Some(lifecycle) => Message::Lifecycle(lifecycle),
            None => Message::Other(raw),
        },
        MessageClass::Instance if id == DRV_OPEN => {
            // SAFETY: a non-null second operand of an open is the host's open record.
            Message::Open(unsafe { (lparam2 as *mut OpenParams).as_mut() })
        }
        MessageClass::Instance => Message::Close,
        MessageClass::Codec => {
            // SAFETY: forwarded from this function's contract.
            match unsafe { decode_codec(id, lparam1, lparam2) } {
                Some(codec) => Message::Codec(codec),
                None => Message::Other(raw),
            }
        }
        MessageClass::Unknown => Message::Other(raw),
    }
}

unsafe fn decode_codec<'a>(
    id: MessageId,
    lparam1: isize,
    lparam2: isize,
) -> Option<CodecMessage<'a>> {
    if let Some(simple) = CodecMessage::simple(id) {
        return Some(simple);
    }

    // SAFETY (all arms): operand shapes follow the host ABI for `id`, and null
    // pointers become `None`.
    let codec = match id {
        ICM_GETINFO => {
            let size = usize::try_from(lparam2).unwrap_or(0);
            let info = if size >= INFO_SIZE {
                unsafe { (lparam1 as *mut CodecInfo).as_mut() }
            } else {
                None
            };
            CodecMessage::GetInfo { info, size }
        }
        ICM_COMPRESS_GET_SIZE => {
            let (input, output) = unsafe { echo_pair(lparam1, lparam2) };
            CodecMessage::CompressGetSize { input, output }
        }
        ICM_COMPRESS_BEGIN => CodecMessage::CompressBegin {
            input: unsafe { descriptor(lparam1) },
            output: unsafe { descriptor(lparam2) },
        },
        ICM_DECOMPRESS_GET_FORMAT => {
            let (input, output) = unsafe { echo_pair(lparam1, lparam2) };
            CodecMessage::DecompressGetFormat { input, output }
        }
        ICM_DECOMPRESS_BEGIN => CodecMessage::DecompressBegin {
            input: unsafe { descriptor(lparam1) },
            output: unsafe { descriptor(lparam2) },
        },
        ICM_COMPRESS => CodecMessage::Compress(unsafe { compress_request(lparam1) }),
        ICM_DECOMPRESS => CodecMessage::Decompress(unsafe { decompress_request(lparam1) }),
        _ => return None,
    };
    Some(codec)
}

unsafe fn descriptor<'a>(operand: isize) -> Option<&'a FrameDescriptor> {
    // SAFETY: caller guarantees a non-null operand points to a descriptor.
    unsafe { (operand as *const FrameDescriptor).as_ref() }
}

unsafe fn descriptor_mut<'a>(operand: isize) -> Option<&'a mut FrameDescriptor> {
    // SAFETY: caller guarantees a non-null operand points to a writable descriptor.
    unsafe { (operand as *mut FrameDescriptor).as_mut() }
}

/// Source and destination of a format echo. A destination at the source's
/// address is dropped: echoing a descriptor onto itself changes nothing.
unsafe fn echo_pair<'a>(
    input: isize,
    output: isize,
) -> (Option<&'a FrameDescriptor>, Option<&'a mut FrameDescriptor>) {
    let output = if output == input { 0 } else { output };
    // SAFETY: forwarded from the caller; the two operands no longer alias.
    unsafe { (descriptor(input), descriptor_mut(output)) }
}

unsafe fn compress_request<'a>(operand: isize) -> CompressRequest<'a> {
    // SAFETY: caller guarantees a non-null operand points to a compress record.
    let Some(record) = (unsafe { (operand as *const IcCompress).as_ref() }) else {
        return CompressRequest {
            flags: 0,
            input: None,
            output: None,
            buffers: FrameBuffers::Missing,
            chunk_id: None,
            frame_flags: None,
            frame_num: 0,
            frame_size: 0,
            quality: 0,
        };
    };

    // A descriptor shared by input and output cannot be both read and written.
    let lpbi_output = if record.lpbi_output == record.lpbi_input {
        std::ptr::null_mut()
    } else {
        record.lpbi_output
    };

    // SAFETY: record pointers are null or valid per the caller's contract.
    // `FourCc` is a transparent `u32`, so the chunk id slot can be viewed as one.
    let (input, output, chunk_id, frame_flags) = unsafe {
        (
            record.lpbi_input.cast_const().as_ref(),
            lpbi_output.as_mut(),
            record.lpckid.cast::<FourCc>().as_mut(),
            record.lpdw_flags.as_mut(),
        )
    };

    let buffers = match input {
        Some(input) => unsafe {
            // SAFETY: the source holds the declared payload and the
            // destination holds the stated frame size.
            frame_buffers(
                record.lp_input,
                input.image_size() as usize,
                record.lp_output,
                record.frame_size as usize,
            )
        },
        None => FrameBuffers::Missing,
    };

    CompressRequest {
        flags: record.flags,
        input,
        output,
        buffers,
        chunk_id,
        frame_flags,
        frame_num: record.frame_num,
        frame_size: record.frame_size,
        quality: record.quality,
    }
}

unsafe fn decompress_request<'a>(operand: isize) -> DecompressRequest<'a> {
    // SAFETY: caller guarantees a non-null operand points to a decompress record.
    let Some(record) = (unsafe { (operand as *const IcDecompress).as_ref() }) else {
        return DecompressRequest {
            flags: 0,
            input: None,
            output: None,
            buffers: FrameBuffers::Missing,
        };
    };

    // SAFETY: descriptor pointers are null or valid per the caller's contract.
    let (input, output) = unsafe {
        (
            record.lpbi_input.cast_const().as_ref(),
            record.lpbi_output.cast_const().as_ref(),
        )
    };

    let buffers = match (input, output) {
        (Some(input), Some(output)) => unsafe {
            // SAFETY: the source holds the declared payload and the
            // destination holds the output descriptor's image size.
            frame_buffers(
                record.lp_input,
                input.image_size() as usize,
                record.lp_output,
                output.image_size() as usize,
            )
        },
        _ => FrameBuffers::Missing,
    };

    DecompressRequest {
        flags: record.flags,
        input,
        output,
        buffers,
    }
}

/// View a source and destination as slices.
///
/// Equal pointers are one in-place buffer. Partially overlapping ranges cannot
/// be viewed as a shared and a mutable slice at once and are refused.
unsafe fn frame_buffers<'a>(
    src: *mut c_void,
    src_len: usize,
    dst: *mut c_void,
    dst_len: usize,
) -> FrameBuffers<'a> {
    if src.is_null() || dst.is_null() {
        return FrameBuffers::Missing;
    }

    let src = src.cast::<u8>();
    let dst = dst.cast::<u8>();
    if src == dst {
        // SAFETY: caller guarantees `dst_len` writable bytes at `dst`.
        return FrameBuffers::InPlace(unsafe { std::slice::from_raw_parts_mut(dst, dst_len) });
    }

    if overlaps(src as usize, src_len, dst as usize, dst_len) {
        trace!(src_len, dst_len, "overlapping frame buffers refused");
        return FrameBuffers::Missing;
    }

    // SAFETY: caller guarantees both lengths; the ranges are disjoint.
    unsafe {
        FrameBuffers::Split {
            input: std::slice::from_raw_parts(src.cast_const(), src_len),
            output: std::slice::from_raw_parts_mut(dst, dst_len),
        }
    }
}

fn overlaps(a: usize, a_len: usize, b: usize, b_len: usize) -> bool {
    a_len != 0 && b_len != 0 && a < b.saturating_add(b_len) && b < a.saturating_add(a_len)
}
