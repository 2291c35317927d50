//! Raw capture decoding seam
//!
//! The two-pass exposure loop decodes the same capture twice with different
//! [`DecodeParams`]. Parameters are plain values rebuilt for every pass; the
//! decoder itself holds no per-pass state.

use std::path::Path;

use negtone_raw::RawSettings;

use super::{into_buffer, require_input};
use crate::auto_adjust::ExposureShift;
use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};

/// Per-pass raw decode parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecodeParams {
    /// Exposure correction in stops
    pub exposure_shift: ExposureShift,
}

impl DecodeParams {
    /// First-pass parameters: no exposure correction.
    pub fn uncorrected() -> Self {
        Self {
            exposure_shift: ExposureShift::NONE,
        }
    }

    /// Second-pass parameters carrying a measured shift.
    pub fn corrected(exposure_shift: ExposureShift) -> Self {
        Self { exposure_shift }
    }
}

/// Decodes a raw capture to a 16-bit RGB buffer
///
/// Implementations must be idempotent: decoding the same path with the same
/// parameters twice yields the same buffer.
pub trait RawDecoder {
    fn decode(&self, path: &Path, params: &DecodeParams) -> Result<PixelBuffer>;
}

/// LibRaw-backed [`RawDecoder`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LibRawDecoder;

impl RawDecoder for LibRawDecoder {
    fn decode(&self, path: &Path, params: &DecodeParams) -> Result<PixelBuffer> {
        require_input(path)?;

        let settings = RawSettings::with_exposure_shift(params.exposure_shift.stops() as f32);
        let raw = negtone_raw::decode_raw(path, &settings).map_err(Error::DecodeFailure)?;

        if raw.data.is_empty() {
            return Err(Error::InvalidBuffer(format!(
                "{} decoded to no pixel data",
                path.display()
            )));
        }

        into_buffer(raw.width, raw.height, raw.channels as usize, raw.data)
    }
}
