//! Entry points borrowed from the host environment.
//!
//! `DefDriverProc` (winmm) answers messages the driver does not recognize and
//! `ICOpenFunction` (msvfw32) binds a callback to a new instance. Both are
//! resolved once, on first use. Off Windows neither exists: unknown messages
//! answer `0` and opens return a null handle.

use std::sync::OnceLock;

use nullvfw_driver::{
    CapabilityHost, DefaultResponder, DriverId, DriverProcFn, Hic, OpenRequest, RawMessage,
};
use tracing::debug;

type OpenFunctionFn = unsafe extern "system" fn(u32, u32, u32, DriverProcFn) -> isize;

struct HostProcs {
    def_driver_proc: Option<DriverProcFn>,
    open_function: Option<OpenFunctionFn>,
}

static HOST: OnceLock<HostProcs> = OnceLock::new();

fn host() -> &'static HostProcs {
    HOST.get_or_init(|| {
        let procs = resolve();
        debug!(
            def_driver_proc = procs.def_driver_proc.is_some(),
            open_function = procs.open_function.is_some(),
            "host entry points resolved"
        );
        procs
    })
}

#[cfg(windows)]
fn resolve() -> HostProcs {
    type FarProc = unsafe extern "system" fn() -> isize;

    // SAFETY: both exports have exactly these signatures in their libraries.
    unsafe {
        HostProcs {
            def_driver_proc: lookup(b"winmm.dll\0", b"DefDriverProc\0")
                .map(|address| std::mem::transmute::<FarProc, DriverProcFn>(address)),
            open_function: lookup(b"msvfw32.dll\0", b"ICOpenFunction\0")
                .map(|address| std::mem::transmute::<FarProc, OpenFunctionFn>(address)),
        }
    }
}

/// # Safety
/// `library` and `symbol` must be NUL-terminated.
#[cfg(windows)]
unsafe fn lookup(library: &[u8], symbol: &[u8]) -> Option<unsafe extern "system" fn() -> isize> {
    use windows_sys::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryA};

    // SAFETY: both strings are NUL-terminated per this function's contract.
    unsafe {
        let module = LoadLibraryA(library.as_ptr());
        if module.is_null() {
            return None;
        }
        GetProcAddress(module, symbol.as_ptr())
    }
}

#[cfg(not(windows))]
fn resolve() -> HostProcs {
    HostProcs {
        def_driver_proc: None,
        open_function: None,
    }
}

/// Forwards unknown messages to the host's default driver procedure.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostResponder;

impl DefaultResponder for HostResponder {
    fn respond(&self, token: DriverId, message: &RawMessage) -> isize {
        match host().def_driver_proc {
            // SAFETY: the host's default procedure accepts any message with the
            // operands it was delivered with.
            Some(def_driver_proc) => unsafe {
                def_driver_proc(
                    token.0,
                    message.hdrvr,
                    message.id.0,
                    message.lparam1,
                    message.lparam2,
                )
            },
            None => 0,
        }
    }
}

/// Binds callbacks through the host's `ICOpenFunction`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostCapability;

impl CapabilityHost for HostCapability {
    fn open_function(&self, request: &OpenRequest) -> Option<Hic> {
        let open_function = host().open_function?;
        // SAFETY: `handler` is a valid driver procedure for the process lifetime.
        let hic = unsafe {
            open_function(
                request.fcc_type.0,
                request.fcc_handler.0,
                request.mode,
                request.handler,
            )
        };
        Some(Hic(hic))
    }
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;
    use nullvfw_driver::message::MessageId;
    use nullvfw_driver::{NULL_CODEC, VIDEO};

    unsafe extern "system" fn never_called(_: usize, _: isize, _: u32, _: isize, _: isize) -> isize {
        unreachable!()
    }

    #[test]
    fn absent_default_procedure_answers_zero() {
        let raw = RawMessage {
            hdrvr: 0,
            id: MessageId(0x6001),
            lparam1: 5,
            lparam2: 6,
        };
        assert_eq!(HostResponder.respond(DriverId(3), &raw), 0);
    }

    #[test]
    fn absent_open_function_opens_nothing() {
        let request = OpenRequest {
            fcc_type: VIDEO,
            fcc_handler: NULL_CODEC,
            mode: 1,
            handler: never_called,
        };
        assert_eq!(HostCapability.open_function(&request), None);
    }
}
