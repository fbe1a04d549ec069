use std::thread;

use nullvfw_driver::message::{CODEC_MESSAGES, ICM_COMPRESS_BEGIN};
use nullvfw_driver::mode::{ICMODE_COMPRESS, ICMODE_DECOMPRESS};
use nullvfw_driver::status::{AVIIF_KEYFRAME, ICCOMPRESS_KEYFRAME};
use nullvfw_driver::{
    CodecInfo, CodecMessage, CompressRequest, CompressSession, DecompressRequest, Driver, DriverId,
    FourCc, FrameBuffers, FrameDescriptor, Message, OpenParams, Reply, Status, CHUNK_COMPRESSED,
    INFO_SIZE, NULL_CODEC, VIDEO,
};

fn open(driver: &Driver, mode: u32) -> DriverId {
    let mut params = OpenParams::new(VIDEO, NULL_CODEC, mode);
    match driver.dispatch(DriverId::NULL, Message::Open(Some(&mut params))) {
        Reply::Opened(token) => token,
        other => panic!("open should succeed, got {other:?}"),
    }
}

fn pattern(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

struct Compressed {
    reply: Reply,
    data: Vec<u8>,
    output: FrameDescriptor,
    chunk_id: FourCc,
    frame_flags: u32,
}

fn compress(
    driver: &Driver,
    token: DriverId,
    input: &FrameDescriptor,
    frame: &[u8],
    capacity: usize,
) -> Compressed {
    let mut output = FrameDescriptor::default();
    let mut data = vec![0u8; capacity];
    let mut chunk_id = FourCc::default();
    let mut frame_flags = 0;

    let reply = driver.dispatch(
        token,
        Message::Codec(CodecMessage::Compress(CompressRequest {
            flags: ICCOMPRESS_KEYFRAME,
            input: Some(input),
            output: Some(&mut output),
            buffers: FrameBuffers::Split {
                input: frame,
                output: &mut data,
            },
            chunk_id: Some(&mut chunk_id),
            frame_flags: Some(&mut frame_flags),
            frame_num: 0,
            frame_size: capacity as u32,
            quality: 0,
        })),
    );

    Compressed {
        reply,
        data,
        output,
        chunk_id,
        frame_flags,
    }
}

fn decompress(
    driver: &Driver,
    token: DriverId,
    input: &FrameDescriptor,
    output: &FrameDescriptor,
    chunk: &[u8],
) -> (Reply, Vec<u8>) {
    let mut data = vec![0u8; output.image_size() as usize];
    let reply = driver.dispatch(
        token,
        Message::Codec(CodecMessage::Decompress(DecompressRequest {
            flags: 0,
            input: Some(input),
            output: Some(output),
            buffers: FrameBuffers::Split {
                input: chunk,
                output: &mut data,
            },
        })),
    );
    (reply, data)
}

fn operand_free_or_empty(id: nullvfw_driver::MessageId) -> Message<'static> {
    if let Some(simple) = CodecMessage::simple(id) {
        return Message::Codec(simple);
    }
    let codec = match id.name() {
        "ICM_GETINFO" => CodecMessage::GetInfo { info: None, size: 0 },
        "ICM_COMPRESS_GET_SIZE" => CodecMessage::CompressGetSize {
            input: None,
            output: None,
        },
        "ICM_COMPRESS_BEGIN" => CodecMessage::CompressBegin {
            input: None,
            output: None,
        },
        "ICM_COMPRESS" => CodecMessage::Compress(CompressRequest {
            flags: 0,
            input: None,
            output: None,
            buffers: FrameBuffers::Missing,
            chunk_id: None,
            frame_flags: None,
            frame_num: 0,
            frame_size: 0,
            quality: 0,
        }),
        "ICM_DECOMPRESS_GET_FORMAT" => CodecMessage::DecompressGetFormat {
            input: None,
            output: None,
        },
        "ICM_DECOMPRESS_BEGIN" => CodecMessage::DecompressBegin {
            input: None,
            output: None,
        },
        "ICM_DECOMPRESS" => CodecMessage::Decompress(DecompressRequest {
            flags: 0,
            input: None,
            output: None,
            buffers: FrameBuffers::Missing,
        }),
        other => panic!("no operand-free form for {other}"),
    };
    Message::Codec(codec)
}

#[test]
fn identity_round_trip() {
    let driver = Driver::new();
    let encoder = open(&driver, ICMODE_COMPRESS);
    let decoder = open(&driver, ICMODE_DECOMPRESS);

    for (width, height, bits) in [(1, 1, 8), (7, 3, 24), (16, -9, 32), (640, 48, 24)] {
        let raw = FrameDescriptor::uncompressed(width, height, bits).unwrap();
        let frame = pattern(raw.size_image as usize, width as u32);

        let encoded = compress(&driver, encoder, &raw, &frame, frame.len());
        assert_eq!(encoded.reply, Reply::Status(Status::Ok));
        assert_eq!(encoded.output.size_image as usize, frame.len());

        let chunk_format = encoded.output.with_compression(NULL_CODEC);
        let (reply, decoded) = decompress(&driver, decoder, &chunk_format, &raw, &encoded.data);
        assert_eq!(reply, Reply::Status(Status::Ok));
        assert_eq!(decoded, frame, "{width}x{height}x{bits}");
    }
}

#[test]
fn in_place_transforms_keep_the_buffer() {
    let driver = Driver::new();
    let token = open(&driver, ICMODE_COMPRESS);
    let input = FrameDescriptor::uncompressed(5, 4, 24).unwrap();
    let original = pattern(60, 3);
    let mut buffer = original.clone();
    let mut output = FrameDescriptor::default();
    let mut chunk_id = FourCc::default();
    let mut frame_flags = 0;

    let reply = driver.dispatch(
        token,
        Message::Codec(CodecMessage::Compress(CompressRequest {
            flags: 0,
            input: Some(&input),
            output: Some(&mut output),
            buffers: FrameBuffers::InPlace(&mut buffer),
            chunk_id: Some(&mut chunk_id),
            frame_flags: Some(&mut frame_flags),
            frame_num: 0,
            frame_size: 60,
            quality: 0,
        })),
    );
    assert_eq!(reply, Reply::Status(Status::Ok));
    assert_eq!(output.size_image, 60);
    assert_eq!(chunk_id, CHUNK_COMPRESSED);
    assert_eq!(buffer, original);

    let reply = driver.dispatch(
        token,
        Message::Codec(CodecMessage::Decompress(DecompressRequest {
            flags: 0,
            input: Some(&output),
            output: Some(&input),
            buffers: FrameBuffers::InPlace(&mut buffer),
        })),
    );
    assert_eq!(reply, Reply::Status(Status::Ok));
    assert_eq!(buffer, original);
}

#[test]
fn capacity_is_enforced_before_any_write() {
    let driver = Driver::new();
    let token = open(&driver, ICMODE_COMPRESS);
    let input = FrameDescriptor::new(20, 1, 8, FourCc::default(), 20);
    let frame = pattern(20, 9);

    let result = compress(&driver, token, &input, &frame, 10);

    assert_eq!(result.reply, Reply::Status(Status::Memory));
    assert!(result.data.iter().all(|&b| b == 0));
    assert_eq!(result.chunk_id, FourCc::default());
    assert_eq!(result.frame_flags, 0);
    assert_eq!(result.output.size_image, 0);
}

#[test]
fn codec_messages_reject_reserved_tokens() {
    let driver = Driver::new();
    let live = open(&driver, ICMODE_COMPRESS);

    for token in [DriverId::NULL, DriverId::INVALID] {
        for id in CODEC_MESSAGES {
            let reply = driver.dispatch(token, operand_free_or_empty(id));
            assert_eq!(reply, Reply::Status(Status::BadParam), "{id} with {token}");
        }
    }

    // The live instance is untouched by the rejected traffic.
    assert_eq!(driver.live_instances(), 1);
    assert!(driver.context(live).unwrap().compress.is_none());
}

#[test]
fn gate_never_decodes_operands_for_reserved_tokens() {
    let driver = Driver::new();
    for token in [DriverId::NULL, DriverId::INVALID] {
        let reply = driver.dispatch_with(token, ICM_COMPRESS_BEGIN, || {
            panic!("operands must not be decoded for {token}")
        });
        assert_eq!(reply, Reply::Status(Status::BadParam));
    }
}

#[test]
fn open_close_balance() {
    let driver = Driver::new();

    let reply = driver.dispatch(DriverId::NULL, Message::Open(None));
    assert_eq!(reply, Reply::Status(Status::InstanceInvalid));
    assert_eq!(reply.into_raw(), -1);
    assert_eq!(driver.live_instances(), 0);

    let token = open(&driver, ICMODE_COMPRESS);
    assert_ne!(token, DriverId::INVALID);
    assert_ne!(token, DriverId::NULL);
    assert_eq!(driver.live_instances(), 1);

    assert_eq!(driver.dispatch(token, Message::Close), Reply::DriverOk);
    assert_eq!(driver.dispatch(token, Message::Close), Reply::DriverOk);
    assert_eq!(driver.live_instances(), 0);
}

#[test]
fn stream_matches_direct_dispatch() {
    let driver = Driver::new();
    let input = FrameDescriptor::uncompressed(32, 8, 24).unwrap();
    let frames: Vec<Vec<u8>> = (0..6).map(|seed| pattern(768, seed)).collect();

    let mut streamed = Vec::new();
    let mut session = CompressSession::start(&driver, input).unwrap();
    for frame in &frames {
        let encoded = session.step(ICCOMPRESS_KEYFRAME, frame).unwrap();
        streamed.push((encoded.data.to_vec(), encoded.chunk_id, encoded.key_frame));
    }
    session.end().unwrap();

    let mut direct = Vec::new();
    let token = open(&driver, ICMODE_COMPRESS);
    let mut output = FrameDescriptor::default();
    let size = driver.dispatch(
        token,
        Message::Codec(CodecMessage::CompressGetSize {
            input: Some(&input),
            output: Some(&mut output),
        }),
    );
    assert_eq!(size, Reply::Size(768));
    let begin = driver.dispatch(
        token,
        Message::Codec(CodecMessage::CompressBegin {
            input: Some(&input),
            output: Some(&output),
        }),
    );
    assert_eq!(begin, Reply::Status(Status::Ok));
    for frame in &frames {
        let encoded = compress(&driver, token, &input, frame, 768);
        assert_eq!(encoded.reply, Reply::Status(Status::Ok));
        direct.push((
            encoded.data,
            encoded.chunk_id,
            encoded.frame_flags & AVIIF_KEYFRAME != 0,
        ));
    }
    driver.dispatch(token, Message::Codec(CodecMessage::CompressEnd));
    driver.dispatch(token, Message::Close);

    assert_eq!(streamed, direct);
    assert_eq!(driver.live_instances(), 0);
}

#[test]
fn capability_query_correctness() {
    let driver = Driver::new();
    let token = open(&driver, ICMODE_COMPRESS);

    let mut info = CodecInfo::zeroed();
    let reply = driver.dispatch(
        token,
        Message::Codec(CodecMessage::GetInfo {
            info: Some(&mut info),
            size: INFO_SIZE,
        }),
    );
    assert_eq!(reply, Reply::Status(Status::Ok));
    assert_eq!(info.fcc_handler, NULL_CODEC);
    assert_eq!(info.fcc_type, VIDEO);
    assert!(!info.description().is_empty());

    let mut short = CodecInfo::zeroed();
    let reply = driver.dispatch(
        token,
        Message::Codec(CodecMessage::GetInfo {
            info: Some(&mut short),
            size: INFO_SIZE - 1,
        }),
    );
    assert_eq!(reply, Reply::Status(Status::BadParam));
}

#[test]
fn distinct_tokens_run_concurrently() {
    let driver = Driver::new();
    let input = FrameDescriptor::uncompressed(64, 16, 24).unwrap();

    thread::scope(|scope| {
        for seed in 0..4u32 {
            let driver = &driver;
            scope.spawn(move || {
                let mut session = CompressSession::start(driver, input).unwrap();
                for step in 0..20 {
                    let frame = pattern(input.size_image as usize, seed * 100 + step);
                    let encoded = session.step(0, &frame).unwrap();
                    assert_eq!(encoded.data, frame.as_slice());
                }
                session.end().unwrap();
            });
        }
    });

    assert_eq!(driver.live_instances(), 0);
}
