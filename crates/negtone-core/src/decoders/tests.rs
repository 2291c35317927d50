//! Tests for image decoders

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use tempfile::tempdir;

use super::*;

fn write_png8(path: &Path, width: u32, height: u32, color: ::png::ColorType, bytes: &[u8]) {
    let file = File::create(path).unwrap();
    let mut encoder = ::png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(color);
    encoder.set_depth(::png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(bytes).unwrap();
    writer.finish().unwrap();
}

#[test]
fn test_missing_file_is_input_not_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.png");

    let err = decode_image(&path).unwrap_err();
    assert!(matches!(err, Error::InputNotFound(p) if p == path));
}

#[test]
fn test_unknown_extension_is_decode_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("image.bmp");
    fs::write(&path, b"BM").unwrap();

    assert!(matches!(decode_image(&path), Err(Error::DecodeFailure(_))));
}

#[test]
fn test_raw_extension_is_rejected_by_image_decoder() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("capture.cr3");
    fs::write(&path, b"not really raw").unwrap();

    assert!(is_raw_path(&path));
    assert!(matches!(decode_image(&path), Err(Error::DecodeFailure(_))));
}

#[test]
fn test_png8_gray_widened_to_16_bit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gray8.png");
    write_png8(&path, 3, 1, ::png::ColorType::Grayscale, &[0, 128, 255]);

    let buffer = decode_image(&path).unwrap();
    assert_eq!(buffer.layout(), ColorLayout::Gray);
    assert_eq!(buffer.samples(), &[0, 128 * 257, 65535]);
}

#[test]
fn test_png8_rgba_keeps_fourth_sample() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rgba8.png");
    write_png8(&path, 1, 1, ::png::ColorType::Rgba, &[255, 0, 1, 2]);

    let buffer = decode_image(&path).unwrap();
    assert_eq!(buffer.layout(), ColorLayout::Rgba);
    assert_eq!(buffer.samples(), &[65535, 0, 257, 514]);
}

#[test]
fn test_corrupt_png_is_decode_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.png");
    fs::write(&path, b"definitely not a png").unwrap();

    assert!(matches!(decode_image(&path), Err(Error::DecodeFailure(_))));
}

#[test]
fn test_libraw_decoder_checks_input_first() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.nef");

    let err = LibRawDecoder
        .decode(&path, &DecodeParams::uncorrected())
        .unwrap_err();
    assert!(matches!(err, Error::InputNotFound(_)));
}

#[test]
fn test_into_buffer_rejects_unknown_channel_count() {
    assert!(matches!(
        into_buffer(1, 1, 2, vec![0, 0]),
        Err(Error::DecodeFailure(_))
    ));
    assert!(matches!(
        into_buffer(2, 2, 3, vec![0; 5]),
        Err(Error::InvalidBuffer(_))
    ));
}
