#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/nullvfw-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn nullvfw(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nullvfw"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("nullvfw should run")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

fn pixels(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 251) as u8).collect()
}

#[test]
fn single_frame_round_trip_is_identity() {
    let dir = unique_temp_dir("single");
    let raw = dir.join("in.raw");
    let encoded = dir.join("out.enc");
    let decoded = dir.join("back.raw");
    let original = pixels(4 * 2 * 3);
    std::fs::write(&raw, &original).expect("input should be writable");

    let out = nullvfw(&["encode", path_str(&raw), path_str(&encoded), "4", "2", "24"]);
    assert!(out.status.success(), "encode failed: {out:?}");
    assert_eq!(std::fs::read(&encoded).expect("encoded output"), original);

    let out = nullvfw(&["decode", path_str(&encoded), path_str(&decoded), "4", "2", "24"]);
    assert!(out.status.success(), "decode failed: {out:?}");
    assert_eq!(std::fs::read(&decoded).expect("decoded output"), original);

    let report: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("report should be JSON");
    assert_eq!(report["direction"], "decode");
    assert_eq!(report["frames"], 1);
}

#[test]
fn framed_round_trip_prefixes_each_chunk() {
    let dir = unique_temp_dir("framed");
    let raw = dir.join("in.raw");
    let encoded = dir.join("out.enc");
    let decoded = dir.join("back.raw");
    let frame_len = 4 * 2 * 4;
    let original = pixels(frame_len * 3);
    std::fs::write(&raw, &original).expect("input should be writable");

    let out = nullvfw(&[
        "encode",
        path_str(&raw),
        path_str(&encoded),
        "4",
        "-2",
        "32",
        "--framed",
    ]);
    assert!(out.status.success(), "encode failed: {out:?}");

    let bytes = std::fs::read(&encoded).expect("encoded output");
    assert_eq!(bytes.len(), 3 * (4 + frame_len));
    assert_eq!(&bytes[..4], &(frame_len as u32).to_le_bytes());
    assert_eq!(&bytes[4..4 + frame_len], &original[..frame_len]);

    let out = nullvfw(&[
        "decode",
        path_str(&encoded),
        path_str(&decoded),
        "4",
        "-2",
        "32",
        "--framed",
    ]);
    assert!(out.status.success(), "decode failed: {out:?}");
    assert_eq!(std::fs::read(&decoded).expect("decoded output"), original);

    let report: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("report should be JSON");
    assert_eq!(report["frames"], 3);
    assert_eq!(report["bytes_out"], original.len());
}

#[test]
fn framed_encode_rejects_partial_frame() {
    let dir = unique_temp_dir("partial");
    let raw = dir.join("in.raw");
    std::fs::write(&raw, pixels(4 * 2 * 3 + 5)).expect("input should be writable");

    let out = nullvfw(&[
        "encode",
        path_str(&raw),
        path_str(&dir.join("out.enc")),
        "4",
        "2",
        "24",
        "--framed",
    ]);
    assert_eq!(out.status.code(), Some(60));
}

#[test]
fn framed_decode_rejects_truncated_stream() {
    let dir = unique_temp_dir("truncated");
    let encoded = dir.join("in.enc");
    let mut bytes = 24u32.to_le_bytes().to_vec();
    bytes.extend_from_slice(&pixels(10));
    std::fs::write(&encoded, bytes).expect("input should be writable");

    let out = nullvfw(&[
        "decode",
        path_str(&encoded),
        path_str(&dir.join("out.raw")),
        "4",
        "2",
        "24",
        "--framed",
    ]);
    assert_eq!(out.status.code(), Some(60));
}

#[test]
fn framed_decode_rejects_oversized_chunk() {
    let dir = unique_temp_dir("oversized");
    let encoded = dir.join("in.enc");
    let mut bytes = 30u32.to_le_bytes().to_vec();
    bytes.extend_from_slice(&pixels(30));
    std::fs::write(&encoded, bytes).expect("input should be writable");

    let out = nullvfw(&[
        "decode",
        path_str(&encoded),
        path_str(&dir.join("out.raw")),
        "4",
        "2",
        "24",
        "--framed",
    ]);
    assert_eq!(out.status.code(), Some(60));
}

#[test]
fn bad_geometry_is_a_usage_error() {
    let dir = unique_temp_dir("geometry");
    let raw = dir.join("in.raw");
    std::fs::write(&raw, pixels(8)).expect("input should be writable");

    let out = nullvfw(&["encode", path_str(&raw), path_str(&dir.join("o")), "0", "2", "24"]);
    assert_eq!(out.status.code(), Some(64));
}

#[test]
fn missing_input_fails() {
    let dir = unique_temp_dir("missing");
    let out = nullvfw(&[
        "encode",
        path_str(&dir.join("absent.raw")),
        path_str(&dir.join("out.enc")),
        "4",
        "2",
        "24",
    ]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn info_reports_the_capability_record() {
    let out = nullvfw(&["info"]);
    assert!(out.status.success(), "info failed: {out:?}");
    let info: serde_json::Value = serde_json::from_slice(&out.stdout).expect("info should be JSON");
    assert_eq!(info["fcc_type"], "vidc");
    assert_eq!(info["fcc_handler"], "null");
    assert_eq!(info["description"], "Null pass-through codec");
    assert_eq!(info["mode"], "query");
}
