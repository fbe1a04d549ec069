//! Null pass-through video codec driver.
//!
//! The codec answers every compress and decompress request with a byte-exact
//! copy of its input, which makes it a reference point for testing capture and
//! playback pipelines.
//!
//! # Crate Structure
//!
//! - [`driver`]: message dispatcher, instance contexts and stream sessions
//! - [`chunk`]: length-prefixed container for streaming many encoded frames

/// Re-export driver types.
pub mod driver {
    pub use nullvfw_driver::*;
}

/// Re-export chunk container types.
pub mod chunk {
    pub use nullvfw_chunk::*;
}
