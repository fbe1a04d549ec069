use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};

use nullvfw_chunk::ChunkReader;
use nullvfw_driver::{DecompressSession, DriverConfig, FrameDescriptor, BI_RGB};
use tracing::info;

use crate::cmd::TransformArgs;
use crate::exit::{chunk_error, io_error, stream_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_report, OutputFormat, TransformReport};

pub fn run(args: TransformArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = args.frame()?;
    let handler = DriverConfig::default().handler;
    let encoded = frame.with_compression(handler);

    let report = if args.framed {
        decode_framed(&args, encoded, frame)?
    } else {
        decode_single(&args, encoded, frame)?
    };

    info!(
        frames = report.frames,
        bytes_in = report.bytes_in,
        bytes_out = report.bytes_out,
        "decode complete"
    );
    print_report(&report, format);
    Ok(SUCCESS)
}

/// The whole file is one encoded frame; the raw frame takes its length.
fn decode_single(
    args: &TransformArgs,
    encoded: FrameDescriptor,
    frame: FrameDescriptor,
) -> CliResult<TransformReport> {
    let data = fs::read(&args.input)
        .map_err(|err| io_error(&format!("failed reading {}", args.input.display()), err))?;
    if data.is_empty() {
        return Err(CliError::new(DATA_INVALID, "input is empty"));
    }
    let declared = u32::try_from(data.len())
        .map_err(|_| CliError::new(DATA_INVALID, "input exceeds the 32-bit frame size"))?;

    let input = FrameDescriptor {
        size_image: declared,
        ..encoded
    };
    let output = FrameDescriptor::new(frame.width, frame.height, frame.bit_count, BI_RGB, declared);
    let mut session =
        DecompressSession::start(input, output).map_err(|err| stream_error("decode failed", err))?;
    let raw = session
        .step(&data)
        .map_err(|err| stream_error("decode failed", err))?;
    fs::write(&args.output, raw)
        .map_err(|err| io_error(&format!("failed writing {}", args.output.display()), err))?;
    let bytes_out = raw.len() as u64;
    session.end();

    Ok(report(args, 1, data.len() as u64, bytes_out))
}

/// Length-prefixed chunks, each decoding to exactly one raw frame.
fn decode_framed(
    args: &TransformArgs,
    encoded: FrameDescriptor,
    frame: FrameDescriptor,
) -> CliResult<TransformReport> {
    let file = File::open(&args.input)
        .map_err(|err| io_error(&format!("failed reading {}", args.input.display()), err))?;
    let mut reader = ChunkReader::new(BufReader::new(file));
    let out = File::create(&args.output)
        .map_err(|err| io_error(&format!("failed creating {}", args.output.display()), err))?;
    let mut writer = BufWriter::new(out);

    let frame_len = frame.size_image as usize;
    let mut session =
        DecompressSession::start(encoded, frame).map_err(|err| stream_error("decode failed", err))?;
    let mut bytes_in = 0u64;
    let mut bytes_out = 0u64;
    while let Some(chunk) = reader
        .read_chunk()
        .map_err(|err| chunk_error("failed reading chunk", err))?
    {
        let index = session.frame_count();
        let raw = session
            .step(&chunk)
            .map_err(|err| stream_error(&format!("decode failed at frame {index}"), err))?;
        if raw.len() != frame_len {
            return Err(CliError::new(
                DATA_INVALID,
                format!(
                    "frame {index} holds {} bytes, expected {frame_len}",
                    raw.len()
                ),
            ));
        }
        writer
            .write_all(raw)
            .map_err(|err| io_error("failed writing output", err))?;
        bytes_in += chunk.len() as u64;
        bytes_out += raw.len() as u64;
    }
    let frames = session.frame_count();
    session.end();

    writer
        .flush()
        .map_err(|err| io_error("failed writing output", err))?;

    Ok(report(args, frames, bytes_in, bytes_out))
}

fn report(args: &TransformArgs, frames: u64, bytes_in: u64, bytes_out: u64) -> TransformReport {
    TransformReport {
        schema_id: "nullvfw/cli/v1/transform-report",
        direction: "decode",
        frames,
        bytes_in,
        bytes_out,
        width: args.width,
        height: args.height,
        bit_depth: args.bit_depth,
        framed: args.framed,
    }
}
