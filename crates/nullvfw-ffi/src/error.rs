use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

use nullvfw_driver::StreamError;
use tracing::warn;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::default();
    });
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let message = message.into();
    let sanitized = message.replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized).unwrap_or_default();
    });
}

pub(crate) fn set_invalid_argument(message: &str) {
    warn!(message, "invalid argument");
    set_error_message(message);
}

pub(crate) fn set_stream_error(err: &StreamError) {
    warn!(error = %err, "stream call failed");
    set_error_message(err.to_string());
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}
