use serde::Serialize;

use crate::fourcc::{FourCc, BI_RGB};

/// Geometry and encoding of one rectangular pixel buffer.
///
/// Layout-identical to the host's 40-byte bitmap info header, so a pointer
/// handed over by the host can be viewed as a `FrameDescriptor` directly.
/// `height` keeps its sign: negative means top-down row order.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameDescriptor {
    /// Size of this header in bytes.
    pub size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    /// Bits per pixel.
    pub bit_count: u16,
    pub compression: FourCc,
    /// Declared payload size in bytes. May be zero for uncompressed frames.
    pub size_image: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub clr_used: u32,
    pub clr_important: u32,
}

/// Size of the header as the host declares it.
pub const DESCRIPTOR_SIZE: u32 = std::mem::size_of::<FrameDescriptor>() as u32;

impl Default for FrameDescriptor {
    fn default() -> Self {
        Self {
            size: DESCRIPTOR_SIZE,
            width: 0,
            height: 0,
            planes: 1,
            bit_count: 0,
            compression: BI_RGB,
            size_image: 0,
            x_pels_per_meter: 0,
            y_pels_per_meter: 0,
            clr_used: 0,
            clr_important: 0,
        }
    }
}

impl FrameDescriptor {
    /// Describe a frame with an explicit payload size.
    pub fn new(
        width: i32,
        height: i32,
        bit_count: u16,
        compression: FourCc,
        size_image: u32,
    ) -> Self {
        Self {
            width,
            height,
            bit_count,
            compression,
            size_image,
            ..Self::default()
        }
    }

    /// Describe an uncompressed frame whose rows are tightly packed.
    ///
    /// Returns `None` if the packed size does not fit the 32-bit size field.
    pub fn uncompressed(width: i32, height: i32, bit_count: u16) -> Option<Self> {
        let size_image = packed_size(width, height, bit_count)?;
        Some(Self::new(width, height, bit_count, BI_RGB, size_image))
    }

    /// Copy of this descriptor carrying a different compression tag.
    pub fn with_compression(mut self, compression: FourCc) -> Self {
        self.compression = compression;
        self
    }

    /// Returns true if rows are stored top-down (negative height).
    pub fn is_top_down(&self) -> bool {
        self.height < 0
    }

    /// Tightly packed payload size, `width * |height| * (bit_count / 8)`.
    pub fn packed_image_size(&self) -> Option<u32> {
        packed_size(self.width, self.height, self.bit_count)
    }

    /// Payload size in bytes.
    ///
    /// The declared size wins. A zero declared size falls back to the
    /// DWORD-aligned stride size the host uses for uncompressed frames.
    pub fn image_size(&self) -> u32 {
        if self.size_image != 0 {
            return self.size_image;
        }
        stride_size(self.width, self.height, self.bit_count).unwrap_or(0)
    }
}

fn packed_size(width: i32, height: i32, bit_count: u16) -> Option<u32> {
    let width = u64::try_from(width).ok()?;
    let bytes_per_pixel = u64::from(bit_count / 8);
    let size = width
        .checked_mul(u64::from(height.unsigned_abs()))?
        .checked_mul(bytes_per_pixel)?;
    u32::try_from(size).ok()
}

fn stride_size(width: i32, height: i32, bit_count: u16) -> Option<u32> {
    let width = u64::try_from(width).ok()?;
    let row_bits = width.checked_mul(u64::from(bit_count))?;
    let stride = row_bits.checked_add(31)? / 32 * 4;
    let size = stride.checked_mul(u64::from(height.unsigned_abs()))?;
    u32::try_from(size).ok()
}
