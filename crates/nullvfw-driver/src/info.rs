//! Capability info record returned by the capability query.

use crate::fourcc::FourCc;

/// Supports quality settings.
pub const VIDCF_QUALITY: u32 = 0x0001;
/// Supports crunching to a frame size.
pub const VIDCF_CRUNCH: u32 = 0x0002;
/// Supports inter-frame compression.
pub const VIDCF_TEMPORAL: u32 = 0x0004;
/// Wants the compress-frames bulk call.
pub const VIDCF_COMPRESSFRAMES: u32 = 0x0008;
/// Supports drawing.
pub const VIDCF_DRAW: u32 = 0x0010;
/// Can compress temporally without the previous frame.
pub const VIDCF_FASTTEMPORALC: u32 = 0x0020;
/// Can decompress temporally without the previous frame.
pub const VIDCF_FASTTEMPORALD: u32 = 0x0080;

/// Host interface version reported in [`CodecInfo::version_icm`].
pub const ICVERSION: u32 = 0x0104;

const NAME_LEN: usize = 16;
const DESCRIPTION_LEN: usize = 128;
const DRIVER_LEN: usize = 128;

/// Layout-identical to the host's 568-byte codec info record.
#[repr(C)]
#[derive(Clone, PartialEq, Eq)]
pub struct CodecInfo {
    pub size: u32,
    pub fcc_type: FourCc,
    pub fcc_handler: FourCc,
    pub flags: u32,
    pub version: u32,
    pub version_icm: u32,
    name: [u16; NAME_LEN],
    description: [u16; DESCRIPTION_LEN],
    driver: [u16; DRIVER_LEN],
}

/// Size of the info record in bytes.
pub const INFO_SIZE: usize = std::mem::size_of::<CodecInfo>();

impl CodecInfo {
    /// An all-zero record.
    pub const fn zeroed() -> Self {
        Self {
            size: 0,
            fcc_type: FourCc(0),
            fcc_handler: FourCc(0),
            flags: 0,
            version: 0,
            version_icm: 0,
            name: [0; NAME_LEN],
            description: [0; DESCRIPTION_LEN],
            driver: [0; DRIVER_LEN],
        }
    }

    pub fn name(&self) -> String {
        decode_wide(&self.name)
    }

    pub fn description(&self) -> String {
        decode_wide(&self.description)
    }

    pub fn driver(&self) -> String {
        decode_wide(&self.driver)
    }

    pub fn set_name(&mut self, text: &str) {
        encode_wide(&mut self.name, text);
    }

    pub fn set_description(&mut self, text: &str) {
        encode_wide(&mut self.description, text);
    }
}

impl Default for CodecInfo {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl std::fmt::Debug for CodecInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecInfo")
            .field("size", &self.size)
            .field("fcc_type", &self.fcc_type)
            .field("fcc_handler", &self.fcc_handler)
            .field("flags", &format_args!("{:#06x}", self.flags))
            .field("version", &self.version)
            .field("version_icm", &format_args!("{:#06x}", self.version_icm))
            .field("name", &self.name())
            .field("description", &self.description())
            .field("driver", &self.driver())
            .finish()
    }
}

fn decode_wide(field: &[u16]) -> String {
    let end = field.iter().position(|&c| c == 0).unwrap_or(field.len());
    String::from_utf16_lossy(&field[..end])
}

// Truncates on a code-unit boundary; the last slot always stays NUL.
fn encode_wide(field: &mut [u16], text: &str) {
    field.fill(0);
    let capacity = field.len().saturating_sub(1);
    for (slot, unit) in field[..capacity].iter_mut().zip(text.encode_utf16()) {
        *slot = unit;
    }
}
