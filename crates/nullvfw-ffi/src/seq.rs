//! Sequential compress and decompress exports.
//!
//! A sequence lives in the `lp_state` field of the caller's [`CompVars`] from
//! its start call to its end call.

#![allow(non_snake_case)]

use std::ffi::c_void;

use nullvfw_driver::{CompressSession, DecompressSession, FrameDescriptor};
use tracing::debug;

use crate::error;
use crate::types::{Bool, CompVars, SeqState, FALSE, TRUE};

fn with_vars<T>(pc: *mut CompVars, on_error: T, f: impl FnOnce(&mut CompVars) -> T) -> T {
    // SAFETY: pointer validity is guaranteed by the caller.
    match unsafe { pc.as_mut() } {
        Some(vars) => f(vars),
        None => {
            error::set_invalid_argument("compression variables cannot be null");
            on_error
        }
    }
}

fn store_state(vars: &mut CompVars, state: SeqState) {
    vars.lp_state = Box::into_raw(Box::new(state)).cast();
    vars.cb_state = 0;
}

fn state_mut(vars: &mut CompVars) -> Option<&mut SeqState> {
    // SAFETY: a non-null `lp_state` was stored by `store_state` and not yet released.
    unsafe { vars.lp_state.cast::<SeqState>().as_mut() }
}

fn take_state(vars: &mut CompVars) -> Option<Box<SeqState>> {
    let ptr = std::mem::replace(&mut vars.lp_state, std::ptr::null_mut());
    if ptr.is_null() {
        return None;
    }
    // SAFETY: `ptr` came from `Box::into_raw` in `store_state` and the field
    // is cleared above, so it is released exactly once.
    Some(unsafe { Box::from_raw(ptr.cast::<SeqState>()) })
}

fn release(vars: &mut CompVars) {
    match take_state(vars).map(|state| *state) {
        Some(SeqState::Compress(session)) => {
            if let Err(err) = session.end() {
                error::set_stream_error(&err);
            }
        }
        Some(SeqState::Decompress(session)) => session.end(),
        None => debug!("sequence end without a sequence"),
    }
}

fn ensure_idle(vars: &CompVars) -> bool {
    if !vars.lp_state.is_null() {
        error::set_invalid_argument("a sequence is already in progress");
        return false;
    }
    true
}

/// Start a compression sequence for frames described by `lpbi_in`.
///
/// # Safety
/// `pc` must be null or point to a writable compression variables record whose
/// `lp_state` is null; `lpbi_in` must be null or point to a valid frame
/// descriptor.
#[no_mangle]
pub unsafe extern "system" fn ICSeqCompressFrameStart(
    pc: *mut CompVars,
    lpbi_in: *const FrameDescriptor,
) -> Bool {
    crate::ffi_boundary(FALSE, || {
        error::clear_error_state();
        with_vars(pc, FALSE, |vars| {
            if !ensure_idle(vars) {
                return FALSE;
            }
            // SAFETY: pointer validity is guaranteed by the caller.
            let Some(input) = (unsafe { lpbi_in.as_ref() }) else {
                error::set_invalid_argument("input format cannot be null");
                return FALSE;
            };

            match CompressSession::start(crate::driver(), *input) {
                Ok(session) => {
                    vars.hic = session.token().0 as isize;
                    vars.fcc_handler = session.output().compression;
                    vars.frame = 0;
                    store_state(vars, SeqState::Compress(session));
                    TRUE
                }
                Err(err) => {
                    error::set_stream_error(&err);
                    FALSE
                }
            }
        })
    })
}

/// Compress one frame of the running sequence.
///
/// Returns the encoded bytes, valid until the next call on the same sequence,
/// or null on failure.
///
/// # Safety
/// `pc` must have been started with [`ICSeqCompressFrameStart`]; `lp_bits`
/// must hold one full input frame; `pf_key` and `pl_size` must be null or
/// writable.
#[no_mangle]
pub unsafe extern "system" fn ICSeqCompressFrame(
    pc: *mut CompVars,
    ui_flags: u32,
    lp_bits: *const c_void,
    pf_key: *mut Bool,
    pl_size: *mut i32,
) -> *mut c_void {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();
        with_vars(pc, std::ptr::null_mut(), |vars| {
            let Some(SeqState::Compress(session)) = state_mut(vars) else {
                error::set_invalid_argument("no compression sequence in progress");
                return std::ptr::null_mut();
            };
            if lp_bits.is_null() {
                error::set_invalid_argument("frame bits cannot be null");
                return std::ptr::null_mut();
            }

            let len = session.input().image_size() as usize;
            // SAFETY: the caller supplies one full frame of `len` bytes.
            let frame = unsafe { std::slice::from_raw_parts(lp_bits.cast::<u8>(), len) };

            match session.step(ui_flags, frame) {
                Ok(encoded) => {
                    // SAFETY: out pointers are null or writable per the caller.
                    unsafe {
                        if let Some(key) = pf_key.as_mut() {
                            *key = if encoded.key_frame { TRUE } else { FALSE };
                        }
                        if let Some(size) = pl_size.as_mut() {
                            *size = i32::try_from(encoded.data.len()).unwrap_or(i32::MAX);
                        }
                    }
                    let data = encoded.data.as_ptr().cast_mut().cast::<c_void>();
                    vars.frame = vars.frame.saturating_add(1);
                    data
                }
                Err(err) => {
                    error::set_stream_error(&err);
                    std::ptr::null_mut()
                }
            }
        })
    })
}

/// End a compression sequence and release its state.
///
/// # Safety
/// `pc` must be null or a record passed to [`ICSeqCompressFrameStart`].
#[no_mangle]
pub unsafe extern "system" fn ICSeqCompressFrameEnd(pc: *mut CompVars) {
    crate::ffi_boundary((), || {
        with_vars(pc, (), release);
    });
}

/// Start a decompression sequence from `lpbi_in` encoded frames to `lpbi_out`.
///
/// # Safety
/// `pc` must be null or point to a writable compression variables record whose
/// `lp_state` is null; `lpbi_in` and `lpbi_out` must be null or point to valid
/// frame descriptors.
#[no_mangle]
pub unsafe extern "system" fn ICSeqDecompressFrameStart(
    pc: *mut CompVars,
    lpbi_in: *const FrameDescriptor,
    lpbi_out: *const FrameDescriptor,
) -> Bool {
    crate::ffi_boundary(FALSE, || {
        error::clear_error_state();
        with_vars(pc, FALSE, |vars| {
            if !ensure_idle(vars) {
                return FALSE;
            }
            // SAFETY: pointer validity is guaranteed by the caller.
            let (input, output) = unsafe { (lpbi_in.as_ref(), lpbi_out.as_ref()) };
            let (Some(input), Some(output)) = (input, output) else {
                error::set_invalid_argument("input and output formats cannot be null");
                return FALSE;
            };

            match DecompressSession::start(*input, *output) {
                Ok(session) => {
                    vars.frame = 0;
                    store_state(vars, SeqState::Decompress(session));
                    TRUE
                }
                Err(err) => {
                    error::set_stream_error(&err);
                    FALSE
                }
            }
        })
    })
}

/// Decompress one encoded frame of `cb_data` bytes.
///
/// Returns the decoded bytes, valid until the next call on the same sequence,
/// or null on failure. `pf_key` is set for every decoded frame and `pl_size`
/// receives the decoded length.
///
/// # Safety
/// `pc` must have been started with [`ICSeqDecompressFrameStart`]; `lp_data`
/// must hold `cb_data` readable bytes; `pf_key` and `pl_size` must be null or
/// writable.
#[no_mangle]
pub unsafe extern "system" fn ICSeqDecompressFrame(
    pc: *mut CompVars,
    lp_data: *const c_void,
    cb_data: i32,
    pf_key: *mut Bool,
    pl_size: *mut i32,
) -> *mut c_void {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();
        with_vars(pc, std::ptr::null_mut(), |vars| {
            let Some(SeqState::Decompress(session)) = state_mut(vars) else {
                error::set_invalid_argument("no decompression sequence in progress");
                return std::ptr::null_mut();
            };
            let Ok(len) = usize::try_from(cb_data) else {
                error::set_invalid_argument("byte count cannot be negative");
                return std::ptr::null_mut();
            };
            if lp_data.is_null() && len != 0 {
                error::set_invalid_argument("frame data cannot be null");
                return std::ptr::null_mut();
            }

            let data = if len == 0 {
                &[][..]
            } else {
                // SAFETY: the caller supplies `len` readable bytes.
                unsafe { std::slice::from_raw_parts(lp_data.cast::<u8>(), len) }
            };

            match session.step(data) {
                Ok(decoded) => {
                    // SAFETY: out pointers are null or writable per the caller.
                    if let Some(key) = unsafe { pf_key.as_mut() } {
                        *key = TRUE;
                    }
                    // SAFETY: as above.
                    if let Some(size) = unsafe { pl_size.as_mut() } {
                        *size = cb_data;
                    }
                    let out = decoded.as_ptr().cast_mut().cast::<c_void>();
                    vars.frame = vars.frame.saturating_add(1);
                    out
                }
                Err(err) => {
                    error::set_stream_error(&err);
                    std::ptr::null_mut()
                }
            }
        })
    })
}

/// End a decompression sequence and release its state.
///
/// # Safety
/// `pc` must be null or a record passed to [`ICSeqDecompressFrameStart`].
#[no_mangle]
pub unsafe extern "system" fn ICSeqDecompressFrameEnd(pc: *mut CompVars) {
    crate::ffi_boundary((), || {
        with_vars(pc, (), release);
    });
}
