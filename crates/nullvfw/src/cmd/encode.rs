use std::fs::{self, File};
use std::io::BufWriter;

use nullvfw_chunk::ChunkWriter;
use nullvfw_driver::status::ICCOMPRESS_KEYFRAME;
use nullvfw_driver::{CompressSession, Driver, FrameDescriptor, BI_RGB};
use tracing::info;

use crate::cmd::TransformArgs;
use crate::exit::{chunk_error, io_error, stream_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_report, OutputFormat, TransformReport};

pub fn run(args: TransformArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = args.frame()?;
    let raw = fs::read(&args.input)
        .map_err(|err| io_error(&format!("failed reading {}", args.input.display()), err))?;

    let report = if args.framed {
        encode_framed(&args, frame, &raw)?
    } else {
        encode_single(&args, frame, &raw)?
    };

    info!(
        frames = report.frames,
        bytes_in = report.bytes_in,
        bytes_out = report.bytes_out,
        "encode complete"
    );
    print_report(&report, format);
    Ok(SUCCESS)
}

/// The whole file is one frame whose declared size is the file length.
fn encode_single(
    args: &TransformArgs,
    frame: FrameDescriptor,
    raw: &[u8],
) -> CliResult<TransformReport> {
    if raw.is_empty() {
        return Err(CliError::new(DATA_INVALID, "input is empty"));
    }
    let declared = u32::try_from(raw.len())
        .map_err(|_| CliError::new(DATA_INVALID, "input exceeds the 32-bit frame size"))?;
    let input = FrameDescriptor::new(frame.width, frame.height, frame.bit_count, BI_RGB, declared);

    let driver = Driver::new();
    let mut session =
        CompressSession::start(&driver, input).map_err(|err| stream_error("encode failed", err))?;
    let encoded = session
        .step(ICCOMPRESS_KEYFRAME, raw)
        .map_err(|err| stream_error("encode failed", err))?;
    fs::write(&args.output, encoded.data)
        .map_err(|err| io_error(&format!("failed writing {}", args.output.display()), err))?;
    let bytes_out = encoded.data.len() as u64;
    session
        .end()
        .map_err(|err| stream_error("encode failed", err))?;

    Ok(report(args, 1, raw.len() as u64, bytes_out))
}

/// Fixed-size frames, each written as one length-prefixed chunk.
fn encode_framed(
    args: &TransformArgs,
    frame: FrameDescriptor,
    raw: &[u8],
) -> CliResult<TransformReport> {
    let frame_len = frame.size_image as usize;
    if raw.len() % frame_len != 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!(
                "input holds {} bytes, not a whole number of {frame_len}-byte frames",
                raw.len()
            ),
        ));
    }

    let file = File::create(&args.output)
        .map_err(|err| io_error(&format!("failed creating {}", args.output.display()), err))?;
    let mut writer = ChunkWriter::new(BufWriter::new(file));

    let driver = Driver::new();
    let mut session =
        CompressSession::start(&driver, frame).map_err(|err| stream_error("encode failed", err))?;
    let mut bytes_out = 0u64;
    for (index, pixels) in raw.chunks_exact(frame_len).enumerate() {
        let encoded = session
            .step(ICCOMPRESS_KEYFRAME, pixels)
            .map_err(|err| stream_error(&format!("encode failed at frame {index}"), err))?;
        writer
            .write_chunk(encoded.data)
            .map_err(|err| chunk_error("failed writing chunk", err))?;
        bytes_out += encoded.data.len() as u64;
    }
    let frames = session.frame_count();
    session
        .end()
        .map_err(|err| stream_error("encode failed", err))?;

    writer
        .flush()
        .map_err(|err| chunk_error("failed writing output", err))?;

    Ok(report(args, frames, raw.len() as u64, bytes_out))
}

fn report(args: &TransformArgs, frames: u64, bytes_in: u64, bytes_out: u64) -> TransformReport {
    TransformReport {
        schema_id: "nullvfw/cli/v1/transform-report",
        direction: "encode",
        frames,
        bytes_in,
        bytes_out,
        width: args.width,
        height: args.height,
        bit_depth: args.bit_depth,
        framed: args.framed,
    }
}
