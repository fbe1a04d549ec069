use clap::{Args, Subcommand};
use std::path::PathBuf;

use nullvfw_driver::FrameDescriptor;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod info;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compress raw frames through the codec.
    Encode(TransformArgs),
    /// Decompress encoded frames back to raw pixels.
    Decode(TransformArgs),
    /// Query the codec's capability record.
    Info(InfoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct TransformArgs {
    /// File to read.
    pub input: PathBuf,
    /// File to write.
    pub output: PathBuf,
    /// Frame width in pixels.
    pub width: i32,
    /// Frame height in pixels. Negative means top-down rows.
    #[arg(allow_negative_numbers = true)]
    pub height: i32,
    /// Bits per pixel (8, 16, 24 or 32).
    pub bit_depth: u16,
    /// Treat the stream as many frames, each chunk length-prefixed.
    #[arg(long)]
    pub framed: bool,
}

impl TransformArgs {
    /// Tightly packed raw frame for the requested geometry.
    pub fn frame(&self) -> CliResult<FrameDescriptor> {
        if self.width <= 0 || self.height == 0 {
            return Err(CliError::new(
                USAGE,
                format!("invalid geometry {}x{}", self.width, self.height),
            ));
        }
        if !matches!(self.bit_depth, 8 | 16 | 24 | 32) {
            return Err(CliError::new(
                USAGE,
                format!("unsupported bit depth {}", self.bit_depth),
            ));
        }
        FrameDescriptor::uncompressed(self.width, self.height, self.bit_depth).ok_or_else(|| {
            CliError::new(
                USAGE,
                format!(
                    "frame {}x{}x{} is too large",
                    self.width, self.height, self.bit_depth
                ),
            )
        })
    }
}

#[derive(Args, Debug, Default)]
pub struct InfoArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(width: i32, height: i32, bit_depth: u16) -> TransformArgs {
        TransformArgs {
            input: PathBuf::from("in"),
            output: PathBuf::from("out"),
            width,
            height,
            bit_depth,
            framed: false,
        }
    }

    #[test]
    fn frame_size_uses_absolute_height() {
        let frame = args(4, -2, 24).frame().expect("geometry should be valid");
        assert_eq!(frame.size_image, 24);
        assert!(frame.is_top_down());
    }

    #[test]
    fn rejects_bad_geometry() {
        assert_eq!(args(0, 2, 24).frame().unwrap_err().code, USAGE);
        assert_eq!(args(4, 0, 24).frame().unwrap_err().code, USAGE);
        assert_eq!(args(4, 2, 12).frame().unwrap_err().code, USAGE);
    }
}
