//! Four-character codes.
//!
//! Codes are packed little-endian: the first character lives in the low byte,
//! matching how the host stores them in `DWORD` fields.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// A four-character code, ABI-identical to a `DWORD`.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FourCc(pub u32);

/// Identity tag of the null pass-through codec.
pub const NULL_CODEC: FourCc = FourCc::from_bytes(*b"null");

/// Media type of video compressors.
pub const VIDEO: FourCc = FourCc::from_bytes(*b"vidc");

/// Chunk identifier stamped on compressed video output (stream 0).
pub const CHUNK_COMPRESSED: FourCc = FourCc::from_bytes(*b"00dc");

/// Compression tag of an uncompressed frame.
pub const BI_RGB: FourCc = FourCc(0);

impl FourCc {
    /// Pack four characters.
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }

    /// Unpack into the four characters.
    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Returns true if every character is printable ASCII.
    pub fn is_printable(self) -> bool {
        self.to_bytes().iter().all(|b| (0x20..0x7f).contains(b))
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_printable() {
            for byte in self.to_bytes() {
                write!(f, "{}", byte as char)?;
            }
            Ok(())
        } else {
            write!(f, "0x{:08x}", self.0)
        }
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({self})")
    }
}

/// Error returned when parsing a four-character code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("four-character code must be exactly 4 ASCII characters, got {0:?}")]
pub struct ParseFourCcError(pub String);

impl FromStr for FourCc {
    type Err = ParseFourCcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| ParseFourCcError(s.to_string()))?;
        if !bytes.is_ascii() {
            return Err(ParseFourCcError(s.to_string()));
        }
        Ok(Self::from_bytes(bytes))
    }
}

impl Serialize for FourCc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_first_character_in_low_byte() {
        assert_eq!(NULL_CODEC.0, 0x6c6c_756e);
        assert_eq!(VIDEO.0 & 0xff, u32::from(b'v'));
        assert_eq!(CHUNK_COMPRESSED.to_bytes(), *b"00dc");
    }

    #[test]
    fn display_and_parse_agree() {
        let parsed: FourCc = "null".parse().unwrap();
        assert_eq!(parsed, NULL_CODEC);
        assert_eq!(NULL_CODEC.to_string(), "null");
    }

    #[test]
    fn unprintable_codes_display_as_hex() {
        assert_eq!(BI_RGB.to_string(), "0x00000000");
        assert!(!BI_RGB.is_printable());
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!("nul".parse::<FourCc>().is_err());
        assert!("nulls".parse::<FourCc>().is_err());
        assert!("nü1".parse::<FourCc>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&VIDEO).unwrap();
        assert_eq!(json, "\"vidc\"");
    }
}
