use std::ffi::c_void;

use nullvfw_driver::{FourCc, FrameDescriptor};
use nullvfw_driver::stream::{CompressSession, DecompressSession};

use crate::host::HostResponder;

/// Host `BOOL`.
pub type Bool = i32;

pub const TRUE: Bool = 1;
pub const FALSE: Bool = 0;

/// Host handle to an open compressor instance.
pub type Hic = isize;

/// Layout-identical to the host's compress request record (`ICCOMPRESS`).
#[repr(C)]
#[derive(Debug)]
pub struct IcCompress {
    pub flags: u32,
    pub lpbi_output: *mut FrameDescriptor,
    pub lp_output: *mut c_void,
    pub lpbi_input: *mut FrameDescriptor,
    pub lp_input: *mut c_void,
    pub lpckid: *mut u32,
    pub lpdw_flags: *mut u32,
    pub frame_num: i32,
    pub frame_size: u32,
    pub quality: u32,
    pub lpbi_prev: *mut FrameDescriptor,
    pub lp_prev: *mut c_void,
}

impl Default for IcCompress {
    fn default() -> Self {
        Self {
            flags: 0,
            lpbi_output: std::ptr::null_mut(),
            lp_output: std::ptr::null_mut(),
            lpbi_input: std::ptr::null_mut(),
            lp_input: std::ptr::null_mut(),
            lpckid: std::ptr::null_mut(),
            lpdw_flags: std::ptr::null_mut(),
            frame_num: 0,
            frame_size: 0,
            quality: 0,
            lpbi_prev: std::ptr::null_mut(),
            lp_prev: std::ptr::null_mut(),
        }
    }
}

/// Layout-identical to the host's decompress request record (`ICDECOMPRESS`).
#[repr(C)]
#[derive(Debug)]
pub struct IcDecompress {
    pub flags: u32,
    pub lpbi_input: *mut FrameDescriptor,
    pub lp_input: *mut c_void,
    pub lpbi_output: *mut FrameDescriptor,
    pub lp_output: *mut c_void,
    pub ckid: u32,
}

impl Default for IcDecompress {
    fn default() -> Self {
        Self {
            flags: 0,
            lpbi_input: std::ptr::null_mut(),
            lp_input: std::ptr::null_mut(),
            lpbi_output: std::ptr::null_mut(),
            lp_output: std::ptr::null_mut(),
            ckid: 0,
        }
    }
}

/// Layout-identical to the host's compression variables record (`COMPVARS`).
///
/// The sequential exports keep their session in `lp_state`, which must be
/// null before a sequence starts.
#[repr(C)]
#[derive(Debug)]
pub struct CompVars {
    pub cb_size: i32,
    pub flags: u32,
    pub hic: Hic,
    pub fcc_type: FourCc,
    pub fcc_handler: FourCc,
    pub lpbi_in: *mut c_void,
    pub lpbi_out: *mut c_void,
    pub lp_bits_out: *mut c_void,
    pub lp_bits_prev: *mut c_void,
    pub frame: i32,
    pub key: i32,
    pub data_rate: i32,
    pub quality: i32,
    pub key_count: i32,
    pub lp_state: *mut c_void,
    pub cb_state: i32,
}

impl Default for CompVars {
    fn default() -> Self {
        Self {
            cb_size: std::mem::size_of::<Self>() as i32,
            flags: 0,
            hic: 0,
            fcc_type: FourCc::default(),
            fcc_handler: FourCc::default(),
            lpbi_in: std::ptr::null_mut(),
            lpbi_out: std::ptr::null_mut(),
            lp_bits_out: std::ptr::null_mut(),
            lp_bits_prev: std::ptr::null_mut(),
            frame: 0,
            key: 0,
            data_rate: 0,
            quality: 0,
            key_count: 0,
            lp_state: std::ptr::null_mut(),
            cb_state: 0,
        }
    }
}

/// What a [`CompVars`] holds between start and end of a sequence.
pub(crate) enum SeqState {
    Compress(CompressSession<'static, HostResponder>),
    Decompress(DecompressSession),
}
