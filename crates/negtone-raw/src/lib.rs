//! RAW file decoding using LibRaw
//!
//! This crate isolates the rsraw/rsraw-sys dependencies to avoid rebuilding
//! LibRaw bindings when the tone engine changes.

use std::path::Path;

use rayon::prelude::*;

/// Largest exposure multiplier LibRaw accepts for `exp_shift` (3 stops).
const LIBRAW_MAX_EXPOSURE_GAIN: f32 = 8.0;

/// Minimum number of pixels to trigger parallel conversion
const PARALLEL_THRESHOLD: usize = 30_000;

/// Decoded RAW image data
#[derive(Debug, Clone)]
pub struct DecodedRaw {
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Interleaved 16-bit RGB samples
    pub data: Vec<u16>,

    /// Number of channels (always 3 for RGB output)
    pub channels: u8,
}

/// Per-pass decode settings.
///
/// Built fresh for every decode; the decoder never keeps state between passes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawSettings {
    /// Exposure correction in stops (0.0 = as shot)
    pub exposure_shift: f32,
}

impl RawSettings {
    /// Settings for an uncorrected decode.
    pub fn uncorrected() -> Self {
        Self::default()
    }

    /// Settings for a decode brightened by `stops`.
    pub fn with_exposure_shift(stops: f32) -> Self {
        Self {
            exposure_shift: stops,
        }
    }

    /// Split the requested gain into the part LibRaw applies and a residual
    /// linear gain applied to the 16-bit output.
    fn gains(&self) -> (f32, f32) {
        let total = 2f32.powf(self.exposure_shift.max(0.0));
        let libraw = total.min(LIBRAW_MAX_EXPOSURE_GAIN);
        (libraw, total / libraw)
    }
}

/// List of supported RAW file extensions
pub const RAW_EXTENSIONS: &[&str] = &[
    "cr2", "cr3", "nef", "nrw", "arw", "raf", "rw2", "orf", "pef", "dng", "3fr", "fff", "iiq",
    "rwl", "raw",
];

/// Check if a file extension is a supported RAW format
pub fn is_raw_extension(ext: &str) -> bool {
    RAW_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// Decode a RAW file using rsraw (LibRaw wrapper)
pub fn decode_raw<P: AsRef<Path>>(path: P, settings: &RawSettings) -> Result<DecodedRaw, String> {
    use rsraw::{RawImage, BIT_DEPTH_16};
    use std::convert::AsMut;

    let data =
        std::fs::read(path.as_ref()).map_err(|e| format!("Failed to read RAW file: {}", e))?;

    let mut raw = RawImage::open(&data).map_err(|e| format!("Failed to open RAW file: {:?}", e))?;

    let (libraw_gain, residual_gain) = settings.gains();

    // SAFETY: rsraw provides safe AsMut access to libraw_data_t
    {
        let libraw_data: &mut rsraw_sys::libraw_data_t = raw.as_mut();
        // AHD demosaic
        libraw_data.params.user_qual = 3;
        // Brightness is decided by the tone engine, not LibRaw
        libraw_data.params.no_auto_bright = 1;
        libraw_data.params.use_camera_wb = 1;
        if libraw_gain > 1.0 {
            libraw_data.params.exp_correc = 1;
            libraw_data.params.exp_shift = libraw_gain;
            libraw_data.params.exp_preser = 0.0;
        }
    }

    raw.unpack()
        .map_err(|e| format!("Failed to unpack RAW data: {:?}", e))?;

    let processed = raw
        .process::<BIT_DEPTH_16>()
        .map_err(|e| format!("Failed to process RAW: {:?}", e))?;

    let width = processed.width();
    let height = processed.height();
    let channels = processed.colors() as u8;

    let pixel_data: &[u16] = &processed;
    let mut data = convert_raw_u16_to_rgb(pixel_data, width, height, channels)?;
    apply_residual_gain(&mut data, residual_gain);

    Ok(DecodedRaw {
        width,
        height,
        data,
        channels: 3,
    })
}

/// Repack LibRaw output as interleaved RGB, dropping or expanding channels
fn convert_raw_u16_to_rgb(
    pixel_data: &[u16],
    width: u32,
    height: u32,
    channels: u8,
) -> Result<Vec<u16>, String> {
    let pixel_count = (width as usize) * (height as usize);
    let expected_len = pixel_count * channels as usize;

    if pixel_count == 0 {
        return Err("RAW image has no pixels".to_string());
    }

    if pixel_data.len() < expected_len {
        return Err(format!(
            "RAW buffer size mismatch: expected at least {}, got {}",
            expected_len,
            pixel_data.len()
        ));
    }

    let rgb_data = match channels {
        3 => pixel_data[..expected_len].to_vec(),
        4 => pixel_data[..expected_len]
            .chunks_exact(4)
            .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
            .collect(),
        1 => pixel_data[..pixel_count]
            .iter()
            .flat_map(|&gray| [gray, gray, gray])
            .collect(),
        _ => return Err(format!("Unexpected RAW channel count: {}", channels)),
    };

    Ok(rgb_data)
}

/// Saturating linear gain for exposure beyond what LibRaw applies
fn apply_residual_gain(data: &mut [u16], gain: f32) {
    if gain <= 1.0 {
        return;
    }

    let scale = |v: &mut u16| {
        *v = (*v as f32 * gain).round().min(u16::MAX as f32) as u16;
    };

    if data.len() / 3 >= PARALLEL_THRESHOLD {
        data.par_iter_mut().for_each(scale);
    } else {
        data.iter_mut().for_each(scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_raw_extension() {
        assert!(is_raw_extension("cr2"));
        assert!(is_raw_extension("CR3"));
        assert!(is_raw_extension("nef"));
        assert!(is_raw_extension("dng"));
        assert!(!is_raw_extension("tiff"));
        assert!(!is_raw_extension("png"));
        assert!(!is_raw_extension("jpg"));
    }

    #[test]
    fn test_gains_within_libraw_range() {
        let (libraw, residual) = RawSettings::with_exposure_shift(2.0).gains();
        assert!((libraw - 4.0).abs() < 1e-6);
        assert!((residual - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_gains_beyond_libraw_range() {
        // 6 stops = 64x, LibRaw handles 8x, the rest is applied afterwards
        let (libraw, residual) = RawSettings::with_exposure_shift(6.0).gains();
        assert!((libraw - 8.0).abs() < 1e-6);
        assert!((residual - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_uncorrected_has_unit_gain() {
        let (libraw, residual) = RawSettings::uncorrected().gains();
        assert_eq!(libraw, 1.0);
        assert_eq!(residual, 1.0);
    }

    #[test]
    fn test_convert_rgba_drops_fourth_sample() {
        let data = [1u16, 2, 3, 99, 4, 5, 6, 99];
        let rgb = convert_raw_u16_to_rgb(&data, 2, 1, 4).unwrap();
        assert_eq!(rgb, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_convert_gray_expands() {
        let data = [7u16, 9];
        let rgb = convert_raw_u16_to_rgb(&data, 2, 1, 1).unwrap();
        assert_eq!(rgb, vec![7, 7, 7, 9, 9, 9]);
    }

    #[test]
    fn test_convert_short_buffer_fails() {
        let data = [1u16, 2, 3];
        let err = convert_raw_u16_to_rgb(&data, 2, 1, 3).unwrap_err();
        assert!(err.contains("size mismatch"));
    }

    #[test]
    fn test_residual_gain_saturates() {
        let mut data = vec![1000u16, 40000, 0];
        apply_residual_gain(&mut data, 2.0);
        assert_eq!(data, vec![2000, u16::MAX, 0]);
    }
}
