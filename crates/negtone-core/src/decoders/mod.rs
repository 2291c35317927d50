//! Image decoders
//!
//! Non-raw inputs (PNG, TIFF) decode straight into a [`PixelBuffer`]; raw
//! captures go through a [`RawDecoder`] so the two-pass exposure loop can
//! decode the same file with different parameters.

mod png;
mod raw;
mod tiff;

#[cfg(test)]
mod tests;

use std::path::Path;

pub use raw::{DecodeParams, LibRawDecoder, RawDecoder};

use crate::buffer::{ColorLayout, PixelBuffer};
use crate::error::{Error, Result};

/// Lowercased extension of `path`, if any.
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// True when `path` names a raw capture the LibRaw backend understands.
pub fn is_raw_path(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| negtone_raw::is_raw_extension(&ext))
}

/// Fail with [`Error::InputNotFound`] unless `path` is an existing file.
pub(crate) fn require_input(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::InputNotFound(path.to_path_buf()))
    }
}

/// Decode a PNG or TIFF file into a 16-bit buffer.
pub fn decode_image<P: AsRef<Path>>(path: P) -> Result<PixelBuffer> {
    let path = path.as_ref();
    require_input(path)?;

    let extension = extension_of(path)
        .ok_or_else(|| Error::DecodeFailure("No file extension found".to_string()))?;

    let buffer = match extension.as_str() {
        "tif" | "tiff" => tiff::decode_tiff(path),
        "png" => png::decode_png(path),
        ext if negtone_raw::is_raw_extension(ext) => {
            return Err(Error::DecodeFailure(format!(
                "{} is a raw capture; decode it with a RawDecoder",
                path.display()
            )))
        }
        _ => return Err(Error::DecodeFailure(format!(
            "Unsupported file format: {}",
            extension
        ))),
    }?;

    tracing::debug!(
        path = %path.display(),
        width = buffer.width(),
        height = buffer.height(),
        layout = ?buffer.layout(),
        "decoded image"
    );
    Ok(buffer)
}

/// Wrap decoded samples, checking the sample count against the dimensions.
pub(crate) fn into_buffer(
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u16>,
) -> Result<PixelBuffer> {
    let layout = ColorLayout::from_channels(channels).ok_or_else(|| {
        Error::DecodeFailure(format!("Unsupported channel count: {}", channels))
    })?;
    PixelBuffer::new(width, height, layout, data)
}

/// Scale an 8-bit sample to 16 bits (0 -> 0, 255 -> 65535).
#[inline]
pub(crate) fn widen_u8(value: u8) -> u16 {
    value as u16 * 257
}
