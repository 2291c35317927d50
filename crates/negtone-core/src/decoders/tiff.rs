//! TIFF image decoder

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{DecodingResult, Limits};

use super::{into_buffer, widen_u8};
use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};

/// Decode an 8- or 16-bit TIFF file
pub(crate) fn decode_tiff(path: &Path) -> Result<PixelBuffer> {
    let fail = |context: &str, err: tiff::TiffError| {
        Error::DecodeFailure(format!("{}: {}", context, err))
    };

    let file = File::open(path)
        .map_err(|e| Error::DecodeFailure(format!("Failed to open TIFF file: {}", e)))?;

    // Large film scans exceed the default limits
    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1024 * 1024 * 1024;
    limits.ifd_value_size = 1024 * 1024 * 1024;
    limits.intermediate_buffer_size = 1024 * 1024 * 1024;

    let mut decoder = tiff::decoder::Decoder::new(BufReader::new(file))
        .map_err(|e| fail("Failed to create TIFF decoder", e))?
        .with_limits(limits);

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| fail("Failed to get TIFF dimensions", e))?;
    let color_type = decoder
        .colortype()
        .map_err(|e| fail("Failed to get TIFF color type", e))?;

    let channels = match color_type {
        tiff::ColorType::Gray(_) => 1,
        tiff::ColorType::RGB(_) => 3,
        tiff::ColorType::RGBA(_) => 4,
        other => {
            return Err(Error::DecodeFailure(format!(
                "Unsupported TIFF color type: {:?}",
                other
            )));
        }
    };

    let data = match decoder
        .read_image()
        .map_err(|e| fail("Failed to read TIFF image data", e))?
    {
        DecodingResult::U8(buf) => buf.into_iter().map(widen_u8).collect(),
        DecodingResult::U16(buf) => buf,
        _ => {
            return Err(Error::DecodeFailure(
                "Only 8- and 16-bit unsigned TIFF samples are supported".to_string(),
            ));
        }
    };

    into_buffer(width, height, channels, data)
}
