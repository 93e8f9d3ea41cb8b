mod common;

use common::{header, ImageBuilder};
use simread::image::{DecodeOptions, ImageError, SimImage};
use simread::render::{write_json, RenderOptions, TextRenderer};
use simread::{decode, DecodeError, Header, Record, Stage, StreamState};
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(bytes).unwrap();
    f.flush().unwrap();
    f
}

fn firmware() -> Vec<u8> {
    ImageBuilder::new(header(0x0000_0001, 6))
        .data(0x00, 0x0000, 0x0000_8000, &[0xDE, 0xAD, 0xBE, 0xEF])
        .data(0x01, 0x0010, 0x0000_9000, &[0x55, 0xAA])
        .entry(0x0000_8000, 0x00)
        .finish()
}

#[test]
fn test_reference_image() {
    let bytes: Vec<u8> = vec![
        0x00, 0x00, 0x00, 0x01,
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x04,
        0x01, 0x00,
        0x01, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x04,
        0xDE, 0xAD, 0xBE, 0xEF,
        0x03, 0x00, 0x00, 0x00, 0x00,
    ];

    let d = decode(&bytes).unwrap();
    assert_eq!(
        d.header,
        Header { magic_number: 1, program_flags: 0, program_byte_count: 4, version: 0x0100 }
    );
    assert_eq!(d.records.len(), 2);
    assert_eq!(
        d.records[0].record,
        Record::Data {
            segment_type:  0,
            flags:         0,
            start_address: 0,
            byte_count:    4,
            payload:       vec![0xDE, 0xAD, 0xBE, 0xEF],
        }
    );
    assert_eq!(d.records[1].record, Record::End { checksum: 0 });
    assert_eq!(d.checksum.embedded, 0);
    assert!(!d.checksum.matches);
}

#[test]
fn test_open_and_decode() {
    let bytes = firmware();
    let file  = write_temp(&bytes);

    let image = SimImage::open(file.path(), &DecodeOptions::default()).unwrap();
    assert_eq!(image.path(), Some(file.path()));
    assert_eq!(image.len(), bytes.len());

    let d = image.decode().unwrap();
    assert_eq!(d.file_size, bytes.len());
    assert_eq!(d.records.len(), 4);
    assert_eq!(d.records[1].offset, 14 + 16);
    assert_eq!(d.entry_address(), Some(0x8000));
    assert_eq!(d.data_byte_total(), u64::from(d.header.program_byte_count));
    assert!(d.checksum.matches);
    assert!(d.checksum.trailing_agrees());
    assert_eq!(image.calculated_checksum().unwrap(), d.checksum.calculated);
}

#[test]
fn test_unknown_tag_after_header() {
    let bytes = ImageBuilder::new(header(1, 0)).raw(&[0x07, 0, 0, 0, 0]).end(0);
    let err = decode(&bytes).unwrap_err();
    assert_eq!(err, DecodeError::UnknownRecordTag { index: 0, offset: 14, tag: 0x07 });
    assert_eq!(err.stage(), Stage::Record(0));
}

#[test]
fn test_header_only_image() {
    let bytes = common::encode_header(&header(0xCAFE_F00D, 0));
    assert_eq!(bytes.len(), 14);

    let image = SimImage::from_bytes(bytes.clone(), &DecodeOptions::default()).unwrap();
    assert_eq!(image.header().unwrap().magic_number, 0xCAFE_F00D);

    let err = decode(&bytes).unwrap_err();
    assert_eq!(
        err,
        DecodeError::TruncatedRecord { index: 0, offset: 14, needed: 1, available: 0 }
    );
}

#[test]
fn test_records_before_failure_are_yielded() {
    let bytes = ImageBuilder::new(header(1, 2))
        .data(0, 0, 0x100, &[1, 2])
        .entry(0x100, 0)
        .raw(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x40, 0xAA])
        .end(0);
    let image = SimImage::from_bytes(bytes, &DecodeOptions::default()).unwrap();

    let mut stream = image.records();
    assert!(stream.next().unwrap().is_ok());
    assert!(stream.next().unwrap().is_ok());
    let err = stream.next().unwrap().unwrap_err();
    assert!(matches!(err, DecodeError::TruncatedRecord { index: 2, needed: 76, .. }));
    assert!(matches!(stream.state(), StreamState::Failed(_)));
    assert!(stream.next().is_none());
}

#[test]
fn test_file_too_large_is_rejected_before_read() {
    let file = write_temp(&firmware());
    let opts = DecodeOptions { max_file_size: 16 };
    match SimImage::open(file.path(), &opts) {
        Err(ImageError::Decode(DecodeError::FileTooLarge { size, limit: 16 })) => {
            assert_eq!(size, firmware().len() as u64);
        }
        other => panic!("expected FileTooLarge, got {other:?}"),
    }
}

#[test]
fn test_missing_file() {
    let dir  = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.sim");
    let err  = SimImage::open(&path, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, ImageError::Io { .. }));
    assert!(err.to_string().contains("absent.sim"));
}

#[test]
fn test_checksum_mismatch_is_reported() {
    let mut bytes = firmware();
    bytes[20] ^= 0xFF;
    let d = decode(&bytes).unwrap();
    assert!(!d.checksum.matches);
    assert_ne!(d.checksum.calculated, d.checksum.embedded);
}

#[test]
fn test_trailing_bytes_after_end() {
    let mut bytes = firmware();
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    let d = decode(&bytes).unwrap();
    assert_eq!(d.trailing_bytes, 4);
    assert_eq!(d.checksum.trailing, 0);
    assert!(!d.checksum.trailing_agrees());
}

#[test]
fn test_text_render_full_image() {
    let d = decode(&firmware()).unwrap();
    let mut r = TextRenderer::new(Vec::new(), RenderOptions { hide_program_bytes: false });
    r.image(&d).unwrap();
    let text = String::from_utf8(r.into_inner()).unwrap();

    assert!(text.starts_with(&format!("\nFile size = {}\n", d.file_size)));
    assert_eq!(text.matches("Data record").count(), 2);
    assert!(text.contains("Program bytes = 0xde 0xad 0xbe 0xef \n"));
    assert!(text.contains("Entry address = 0x00008000"));
    assert!(text.contains("End record"));
    assert!(text.contains("Checksum OK"));
}

#[test]
fn test_json_render() {
    let d = decode(&firmware()).unwrap();
    let mut out = Vec::new();
    write_json(&mut out, &d).unwrap();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(v["header"]["magic_number"], 1);
    assert_eq!(v["records"][0]["kind"], "data");
    assert_eq!(v["records"][0]["payload"], "deadbeef");
    assert_eq!(v["records"][2]["kind"], "entry");
    assert_eq!(v["records"][3]["kind"], "end");
    assert_eq!(v["checksum"]["matches"], true);
}

#[test]
fn test_cli_hides_program_bytes() {
    let file = write_temp(&firmware());
    let out = Command::new(env!("CARGO_BIN_EXE_simread"))
        .arg(file.path())
        .arg("-H")
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("[Program bytes hidden]"));
    assert!(!stdout.contains("0xde"));
    assert!(stdout.contains("Calculated checksum = "));
}

#[test]
fn test_cli_strict_fails_on_mismatch() {
    let mut bytes = firmware();
    bytes[20] ^= 0xFF;
    let file = write_temp(&bytes);

    let lenient = Command::new(env!("CARGO_BIN_EXE_simread"))
        .arg(file.path())
        .output()
        .unwrap();
    assert!(lenient.status.success());

    let strict = Command::new(env!("CARGO_BIN_EXE_simread"))
        .arg(file.path())
        .arg("--strict")
        .output()
        .unwrap();
    assert!(!strict.status.success());
    assert!(String::from_utf8(strict.stdout).unwrap().contains("Checksum MISMATCH"));
}

#[test]
fn test_cli_reports_decode_failure() {
    let bytes = ImageBuilder::new(header(1, 0)).raw(&[0x07]).end(0);
    let file = write_temp(&bytes);
    let out = Command::new(env!("CARGO_BIN_EXE_simread"))
        .arg(file.path())
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stdout.contains("Magic number = 0x00000001"));
    assert!(stderr.contains("unknown record tag 0x07"));
    assert!(stderr.contains("offset 0x0000000e"));
}
