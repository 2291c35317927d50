//! Image filter library
//!
//! The tone pipeline only talks to pixels through [`ImageFilterLibrary`], so
//! stages can be exercised against recording fakes in tests. [`NativeFilters`]
//! is the production implementation, built from the curves in [`tone`], the
//! colour operations in [`color`] and the sharpener in [`sharpen`].

pub mod color;
pub mod sharpen;
pub mod tone;

use serde::{Deserialize, Serialize};

use crate::buffer::{ColorLayout, PixelBuffer};
use crate::error::{Error, Result};

/// Colour handling at the end of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Render to single-channel Rec.709 luma
    Grayscale,
    /// Keep the buffer's colour layout
    Keep,
}

/// Parameterised, stateless pixel operations used by the tone pipeline
///
/// Everything except [`ImageFilterLibrary::convert_color_space`] mutates the
/// buffer in place.
pub trait ImageFilterLibrary {
    /// Multiply RGB by a 3x3 matrix.
    fn color_matrix_apply(&self, buffer: &mut PixelBuffer, matrix: &[[f32; 3]; 3]) -> Result<()>;

    fn sigmoidal_contrast_apply(
        &self,
        buffer: &mut PixelBuffer,
        strength: f64,
        midpoint: f64,
    ) -> Result<()>;

    /// Brightness, saturation and hue, all in percent (100 is neutral).
    fn modulate_apply(
        &self,
        buffer: &mut PixelBuffer,
        brightness: f64,
        saturation: f64,
        hue: f64,
    ) -> Result<()>;

    fn evaluate_multiply(&self, buffer: &mut PixelBuffer, factor: f64) -> Result<()>;

    fn normalize(&self, buffer: &mut PixelBuffer) -> Result<()>;

    fn adaptive_sharpen(&self, buffer: &mut PixelBuffer, radius: f64, sigma: f64) -> Result<()>;

    /// Remap the normalised range `[low, high]` to full scale with gamma `gamma`.
    fn level_remap(&self, buffer: &mut PixelBuffer, low: f64, high: f64, gamma: f64)
        -> Result<()>;

    fn gamma_apply(&self, buffer: &mut PixelBuffer, gamma: f64) -> Result<()>;

    fn contrast_enhance(&self, buffer: &mut PixelBuffer, sharpen: bool) -> Result<()>;

    fn negate(&self, buffer: &mut PixelBuffer) -> Result<()>;

    /// Produce the buffer in the requested colour mode.
    fn convert_color_space(&self, buffer: PixelBuffer, mode: ColorMode) -> Result<PixelBuffer>;
}

/// Pure-Rust implementation of [`ImageFilterLibrary`]
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFilters;

fn check_percent(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{} must be a non-negative percentage, got {}",
            name, value
        )))
    }
}

impl ImageFilterLibrary for NativeFilters {
    fn color_matrix_apply(&self, buffer: &mut PixelBuffer, matrix: &[[f32; 3]; 3]) -> Result<()> {
        if matrix.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter(
                "color matrix contains non-finite values".to_string(),
            ));
        }
        color::apply_color_matrix(buffer, matrix);
        Ok(())
    }

    fn sigmoidal_contrast_apply(
        &self,
        buffer: &mut PixelBuffer,
        strength: f64,
        midpoint: f64,
    ) -> Result<()> {
        tone::sigmoidal_contrast(buffer, strength, midpoint)
    }

    fn modulate_apply(
        &self,
        buffer: &mut PixelBuffer,
        brightness: f64,
        saturation: f64,
        hue: f64,
    ) -> Result<()> {
        check_percent("brightness", brightness)?;
        check_percent("saturation", saturation)?;
        check_percent("hue", hue)?;
        color::modulate(buffer, brightness as f32, saturation as f32, hue as f32);
        Ok(())
    }

    fn evaluate_multiply(&self, buffer: &mut PixelBuffer, factor: f64) -> Result<()> {
        tone::evaluate_multiply(buffer, factor)
    }

    fn normalize(&self, buffer: &mut PixelBuffer) -> Result<()> {
        tone::normalize(buffer)
    }

    fn adaptive_sharpen(&self, buffer: &mut PixelBuffer, radius: f64, sigma: f64) -> Result<()> {
        sharpen::adaptive_sharpen(buffer, radius, sigma)
    }

    fn level_remap(
        &self,
        buffer: &mut PixelBuffer,
        low: f64,
        high: f64,
        gamma: f64,
    ) -> Result<()> {
        tone::level_remap(buffer, low, high, gamma)
    }

    fn gamma_apply(&self, buffer: &mut PixelBuffer, gamma: f64) -> Result<()> {
        tone::gamma(buffer, gamma)
    }

    fn contrast_enhance(&self, buffer: &mut PixelBuffer, sharpen: bool) -> Result<()> {
        tone::contrast_enhance(buffer, sharpen);
        Ok(())
    }

    fn negate(&self, buffer: &mut PixelBuffer) -> Result<()> {
        tone::negate(buffer);
        Ok(())
    }

    fn convert_color_space(&self, buffer: PixelBuffer, mode: ColorMode) -> Result<PixelBuffer> {
        match mode {
            ColorMode::Keep => Ok(buffer),
            ColorMode::Grayscale if buffer.layout() == ColorLayout::Gray => Ok(buffer),
            ColorMode::Grayscale => Ok(color::to_grayscale(&buffer)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_mode_returns_same_buffer() {
        let buffer = PixelBuffer::new(1, 1, ColorLayout::Rgb, vec![1, 2, 3]).unwrap();
        let out = NativeFilters
            .convert_color_space(buffer.clone(), ColorMode::Keep)
            .unwrap();
        assert_eq!(out, buffer);
    }

    #[test]
    fn test_grayscale_mode_changes_layout() {
        let buffer = PixelBuffer::filled(2, 2, ColorLayout::Rgba, 5000).unwrap();
        let out = NativeFilters
            .convert_color_space(buffer, ColorMode::Grayscale)
            .unwrap();
        assert_eq!(out.layout(), ColorLayout::Gray);
        assert_eq!(out.samples(), &[5000; 4]);
    }

    #[test]
    fn test_modulate_rejects_negative_percent() {
        let mut buffer = PixelBuffer::filled(1, 1, ColorLayout::Rgb, 0).unwrap();
        assert!(NativeFilters
            .modulate_apply(&mut buffer, 100.0, -5.0, 100.0)
            .is_err());
    }

    #[test]
    fn test_color_matrix_rejects_nan() {
        let mut buffer = PixelBuffer::filled(1, 1, ColorLayout::Rgb, 0).unwrap();
        let mut matrix = color::IDENTITY_MATRIX;
        matrix[1][1] = f32::NAN;
        assert!(NativeFilters.color_matrix_apply(&mut buffer, &matrix).is_err());
    }

    #[test]
    fn test_identity_matrix_is_exact() {
        let mut buffer =
            PixelBuffer::new(2, 1, ColorLayout::Rgb, vec![0, 12345, 65535, 1, 2, 3]).unwrap();
        let before = buffer.clone();
        NativeFilters
            .color_matrix_apply(&mut buffer, &color::IDENTITY_MATRIX)
            .unwrap();
        assert_eq!(buffer, before);
    }
}
