//! PNG image decoder

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::{into_buffer, widen_u8};
use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};

fn decode_error(context: &str, err: impl std::fmt::Display) -> Error {
    Error::DecodeFailure(format!("{}: {}", context, err))
}

/// Decode a PNG file
pub(crate) fn decode_png(path: &Path) -> Result<PixelBuffer> {
    let file = File::open(path).map_err(|e| decode_error("Failed to open PNG file", e))?;
    let decoder = png::Decoder::new(BufReader::new(file));
    let mut reader = decoder
        .read_info()
        .map_err(|e| decode_error("Failed to read PNG info", e))?;

    let info = reader.info();
    let width = info.width;
    let height = info.height;
    let color_type = info.color_type;
    let bit_depth = info.bit_depth;

    let buffer_size = reader
        .output_buffer_size()
        .ok_or_else(|| Error::DecodeFailure("Failed to determine PNG buffer size".to_string()))?;
    let mut buf = vec![0u8; buffer_size];
    let frame_info = reader
        .next_frame(&mut buf)
        .map_err(|e| decode_error("Failed to read PNG frame", e))?;

    let bytes = &buf[..frame_info.buffer_size()];

    let channels = match color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        other => {
            return Err(Error::DecodeFailure(format!(
                "Unsupported PNG color type: {:?}",
                other
            )));
        }
    };

    let data = match bit_depth {
        png::BitDepth::Eight => bytes.iter().map(|&v| widen_u8(v)).collect(),
        // PNG 16-bit is big-endian
        png::BitDepth::Sixteen => bytes
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect(),
        other => {
            return Err(Error::DecodeFailure(format!(
                "Unsupported PNG bit depth: {:?}",
                other
            )));
        }
    };

    into_buffer(width, height, channels, data)
}
