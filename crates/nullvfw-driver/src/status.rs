//! Status codes and replies surfaced to the host.
//!
//! Raw values follow the host ABI. Some raw values coincide across message
//! classes (a failed open and an unsupported codec message are both `-1`),
//! but the typed [`Status`] values are always distinct.

use crate::context::DriverId;

pub const ICERR_OK: isize = 0;
pub const ICERR_UNSUPPORTED: isize = -1;
pub const ICERR_BADFORMAT: isize = -2;
pub const ICERR_MEMORY: isize = -3;
pub const ICERR_INTERNAL: isize = -4;
pub const ICERR_BADPARAM: isize = -6;

pub const DRV_OK: isize = 1;
pub const DRV_CANCEL: isize = 0;

/// Returned by an open that was given no open record.
pub const INVALID_INSTANCE: isize = -1;

/// Frame flag marking a key frame.
pub const AVIIF_KEYFRAME: u32 = 0x0000_0010;

/// Compress flag asking for a key frame.
pub const ICCOMPRESS_KEYFRAME: u32 = 0x0000_0001;

/// The conditions a caller can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Unsupported,
    BadParam,
    /// Destination too small.
    Memory,
    /// Open was called without an open record.
    InstanceInvalid,
    /// Resources for a new instance could not be obtained.
    Cancel,
}

impl Status {
    pub fn into_raw(self) -> isize {
        match self {
            Self::Ok => ICERR_OK,
            Self::Unsupported => ICERR_UNSUPPORTED,
            Self::BadParam => ICERR_BADPARAM,
            Self::Memory => ICERR_MEMORY,
            Self::InstanceInvalid => INVALID_INSTANCE,
            Self::Cancel => DRV_CANCEL,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

/// What the dispatcher answers to one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Lifecycle notification or close acknowledged.
    DriverOk,
    /// A new instance was opened.
    Opened(DriverId),
    Status(Status),
    /// Required output buffer size.
    Size(u32),
    /// Answer of the host's default responder, passed through untouched.
    Default(isize),
}

impl Reply {
    pub fn into_raw(self) -> isize {
        match self {
            Self::DriverOk => DRV_OK,
            Self::Opened(id) => id.0 as isize,
            Self::Status(status) => status.into_raw(),
            Self::Size(size) => size as isize,
            Self::Default(raw) => raw,
        }
    }

    /// The status carried by this reply, if any.
    pub fn status(self) -> Option<Status> {
        match self {
            Self::Status(status) => Some(status),
            _ => None,
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Self::DriverOk | Self::Status(Status::Ok))
    }
}

impl From<Status> for Reply {
    fn from(status: Status) -> Self {
        Self::Status(status)
    }
}
