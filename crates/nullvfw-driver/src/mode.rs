//! Open modes.
//!
//! A mode travels in the `flags` field of the open record and tells the
//! driver what the caller intends to do with the instance.

/// Open for compression.
pub const ICMODE_COMPRESS: u32 = 1;

/// Open for decompression.
pub const ICMODE_DECOMPRESS: u32 = 2;

/// Open for real-time decompression.
pub const ICMODE_FASTDECOMPRESS: u32 = 3;

/// Open only to query capabilities.
pub const ICMODE_QUERY: u32 = 4;

/// Open for real-time compression.
pub const ICMODE_FASTCOMPRESS: u32 = 5;

/// Open for drawing.
pub const ICMODE_DRAW: u32 = 8;

/// Returns a human-readable name for an open mode.
pub fn mode_name(mode: u32) -> &'static str {
    match mode {
        ICMODE_COMPRESS => "compress",
        ICMODE_DECOMPRESS => "decompress",
        ICMODE_FASTDECOMPRESS => "fast-decompress",
        ICMODE_QUERY => "query",
        ICMODE_FASTCOMPRESS => "fast-compress",
        ICMODE_DRAW => "draw",
        _ => "unknown",
    }
}

/// Returns true if the mode opens an instance for compression.
pub fn is_compress(mode: u32) -> bool {
    matches!(mode, ICMODE_COMPRESS | ICMODE_FASTCOMPRESS)
}

/// Returns true if the mode opens an instance for decompression.
pub fn is_decompress(mode: u32) -> bool {
    matches!(mode, ICMODE_DECOMPRESS | ICMODE_FASTDECOMPRESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_cover_known_modes() {
        assert_eq!(mode_name(ICMODE_COMPRESS), "compress");
        assert_eq!(mode_name(ICMODE_DRAW), "draw");
        assert_eq!(mode_name(42), "unknown");
    }

    #[test]
    fn direction_predicates() {
        assert!(is_compress(ICMODE_FASTCOMPRESS));
        assert!(!is_compress(ICMODE_QUERY));
        assert!(is_decompress(ICMODE_FASTDECOMPRESS));
        assert!(!is_decompress(ICMODE_COMPRESS));
    }
}
