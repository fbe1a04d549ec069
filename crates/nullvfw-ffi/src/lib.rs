//! nullvfw-ffi: driver procedure and sequential streaming exports.
//!
//! The host loads this library as a codec driver and calls [`DriverProc`] for
//! every message. Raw operands are decoded only after the dispatcher has
//! accepted the message, and every export catches panics at the boundary.

#![allow(non_snake_case)]

mod error;
mod host;
mod operands;
mod seq;
mod types;

use std::panic::AssertUnwindSafe;
use std::sync::OnceLock;

use nullvfw_driver::message::MessageId;
use nullvfw_driver::status::ICERR_INTERNAL;
use nullvfw_driver::{close_typed, open_typed, Driver, DriverId, FourCc, Hic as HostHandle};

pub use host::{HostCapability, HostResponder};
pub use seq::{
    ICSeqCompressFrame, ICSeqCompressFrameEnd, ICSeqCompressFrameStart, ICSeqDecompressFrame,
    ICSeqDecompressFrameEnd, ICSeqDecompressFrameStart,
};
pub use types::{Bool, CompVars, Hic, IcCompress, IcDecompress, FALSE, TRUE};

static DRIVER: OnceLock<Driver<HostResponder>> = OnceLock::new();

pub(crate) fn driver() -> &'static Driver<HostResponder> {
    DRIVER.get_or_init(|| Driver::with_responder(HostResponder))
}

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

/// The driver procedure the host calls for every message.
///
/// # Safety
/// Operands must follow the host ABI for `msg`: pointer operands are null or
/// point to the record the message defines, and frame buffers hold the sizes
/// their descriptors state.
#[no_mangle]
pub unsafe extern "system" fn DriverProc(
    driver_id: usize,
    hdrvr: isize,
    msg: u32,
    lparam1: isize,
    lparam2: isize,
) -> isize {
    ffi_boundary(ICERR_INTERNAL, || {
        let id = MessageId(msg);
        driver()
            .dispatch_with(DriverId(driver_id), id, || {
                // SAFETY: forwarded from this function's contract.
                unsafe { operands::decode(hdrvr, id, lparam1, lparam2) }
            })
            .into_raw()
    })
}

/// Open an instance of this driver through the host, bound to [`DriverProc`].
///
/// Returns a null handle if the host refuses or is unavailable.
#[no_mangle]
pub extern "system" fn ICOpen(fcc_type: u32, fcc_handler: u32, mode: u32) -> Hic {
    ffi_boundary(0, || {
        open_typed(
            &HostCapability,
            FourCc(fcc_type),
            FourCc(fcc_handler),
            mode,
            DriverProc,
        )
        .map_or(0, |hic| hic.0)
    })
}

/// Close an instance opened with [`ICOpen`].
#[no_mangle]
pub extern "system" fn ICClose(hic: Hic) -> isize {
    ffi_boundary(ICERR_INTERNAL, || {
        close_typed(driver(), HostHandle(hic)).into_raw()
    })
}

/// Text of the last error raised on this thread by a sequential export.
#[no_mangle]
pub extern "C" fn nullvfw_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}
