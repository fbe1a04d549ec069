//! Typed open/close of a capability instance.
//!
//! Opening binds the driver's raw callback to a host-manufactured handle. The
//! host does the binding; this module only describes the request and closes
//! handles through the dispatcher.

use std::fmt;

use tracing::debug;

use crate::context::DriverId;
use crate::dispatcher::{DefaultResponder, Driver};
use crate::fourcc::FourCc;
use crate::message::Message;
use crate::mode::mode_name;
use crate::status::Reply;

/// Handle to an open capability instance, as manufactured by the host.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hic(pub isize);

impl Hic {
    pub const NULL: Self = Self(0);

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl fmt::Debug for Hic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hic({:#x})", self.0)
    }
}

/// The driver's raw four-operand entry point:
/// `(driver_id, hdrvr, message, lparam1, lparam2) -> result`.
pub type DriverProcFn = unsafe extern "system" fn(usize, isize, u32, isize, isize) -> isize;

/// A request to bind `handler` to a new instance.
#[derive(Clone, Copy)]
pub struct OpenRequest {
    pub fcc_type: FourCc,
    pub fcc_handler: FourCc,
    pub mode: u32,
    pub handler: DriverProcFn,
}

impl fmt::Debug for OpenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRequest")
            .field("fcc_type", &self.fcc_type)
            .field("fcc_handler", &self.fcc_handler)
            .field("mode", &mode_name(self.mode))
            .finish_non_exhaustive()
    }
}

/// The host primitive that opens an instance bound to a callback.
pub trait CapabilityHost {
    /// Returns `None` if the host refused or is unavailable.
    fn open_function(&self, request: &OpenRequest) -> Option<Hic>;
}

/// Open an instance through `host`, binding `handler` as its callback.
pub fn open_typed(
    host: &impl CapabilityHost,
    fcc_type: FourCc,
    fcc_handler: FourCc,
    mode: u32,
    handler: DriverProcFn,
) -> Option<Hic> {
    let request = OpenRequest {
        fcc_type,
        fcc_handler,
        mode,
        handler,
    };
    let hic = host.open_function(&request).filter(|hic| !hic.is_null());
    debug!(?request, ?hic, "capability open");
    hic
}

/// Close an instance by re-entering the dispatcher with a parameterless close.
pub fn close_typed<R: DefaultResponder>(driver: &Driver<R>, hic: Hic) -> Reply {
    debug!(?hic, "capability close");
    driver.dispatch(DriverId(hic.0 as usize), Message::Close)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::fourcc::{NULL_CODEC, VIDEO};
    use crate::message::OpenParams;
    use crate::mode::ICMODE_COMPRESS;

    unsafe extern "system" fn noop_proc(_: usize, _: isize, _: u32, _: isize, _: isize) -> isize {
        0
    }

    struct RecordingHost {
        answer: Option<Hic>,
        seen: RefCell<Vec<(FourCc, FourCc, u32)>>,
    }

    impl CapabilityHost for RecordingHost {
        fn open_function(&self, request: &OpenRequest) -> Option<Hic> {
            self.seen
                .borrow_mut()
                .push((request.fcc_type, request.fcc_handler, request.mode));
            self.answer
        }
    }

    #[test]
    fn open_forwards_request_to_host() {
        let host = RecordingHost {
            answer: Some(Hic(0x1234)),
            seen: RefCell::new(Vec::new()),
        };

        let hic = open_typed(&host, VIDEO, NULL_CODEC, ICMODE_COMPRESS, noop_proc);

        assert_eq!(hic, Some(Hic(0x1234)));
        assert_eq!(
            host.seen.borrow().as_slice(),
            &[(VIDEO, NULL_CODEC, ICMODE_COMPRESS)]
        );
    }

    #[test]
    fn null_handle_is_a_failed_open() {
        let host = RecordingHost {
            answer: Some(Hic::NULL),
            seen: RefCell::new(Vec::new()),
        };
        assert_eq!(
            open_typed(&host, VIDEO, NULL_CODEC, ICMODE_COMPRESS, noop_proc),
            None
        );
    }

    #[test]
    fn close_releases_the_instance() {
        let driver = Driver::new();
        let mut params = OpenParams::new(VIDEO, NULL_CODEC, ICMODE_COMPRESS);
        let token = match driver.dispatch(DriverId::NULL, Message::Open(Some(&mut params))) {
            Reply::Opened(token) => token,
            other => panic!("open failed: {other:?}"),
        };

        let hic = Hic(token.0 as isize);
        assert_eq!(close_typed(&driver, hic), Reply::DriverOk);
        assert_eq!(driver.live_instances(), 0);
        assert_eq!(close_typed(&driver, hic), Reply::DriverOk);
    }
}
