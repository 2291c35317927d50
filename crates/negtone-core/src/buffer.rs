//! Owned 16-bit pixel buffers
//!
//! Every stage of the tone engine works on a [`PixelBuffer`]: a rectangular,
//! interleaved array of unsigned 16-bit samples whose shape is fixed at
//! construction. Point filters mutate a buffer in place; colour-space
//! conversion and statistics probes build new buffers and never touch the
//! caller's data.

use crate::error::{Error, Result};

/// Maximum representable sample value.
pub const FULL_SCALE: u16 = u16::MAX;

/// [`FULL_SCALE`] as a float, for normalising samples.
pub const FULL_SCALE_F: f32 = FULL_SCALE as f32;

/// Sample layout of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorLayout {
    /// Single luma sample
    Gray,
    /// Red, green, blue
    Rgb,
    /// Red, green, blue and a reserved fourth sample that is carried through unchanged
    Rgba,
}

impl ColorLayout {
    /// Samples stored per pixel.
    pub fn channels(self) -> usize {
        match self {
            ColorLayout::Gray => 1,
            ColorLayout::Rgb => 3,
            ColorLayout::Rgba => 4,
        }
    }

    /// Samples per pixel that carry colour (excludes the reserved sample).
    pub fn color_channels(self) -> usize {
        match self {
            ColorLayout::Gray => 1,
            ColorLayout::Rgb | ColorLayout::Rgba => 3,
        }
    }

    /// Layout for a raw channel count.
    pub fn from_channels(channels: usize) -> Option<Self> {
        match channels {
            1 => Some(ColorLayout::Gray),
            3 => Some(ColorLayout::Rgb),
            4 => Some(ColorLayout::Rgba),
            _ => None,
        }
    }
}

/// Rectangular interleaved 16-bit image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    layout: ColorLayout,
    data: Vec<u16>,
}

impl PixelBuffer {
    /// Wrap interleaved samples, validating the shape.
    pub fn new(width: u32, height: u32, layout: ColorLayout, data: Vec<u16>) -> Result<Self> {
        let pixels = width as usize * height as usize;
        if pixels == 0 {
            return Err(Error::InvalidBuffer(format!(
                "buffer has no pixels ({}x{})",
                width, height
            )));
        }

        let expected = pixels * layout.channels();
        if data.len() != expected {
            return Err(Error::InvalidBuffer(format!(
                "expected {} samples for {}x{} {:?}, got {}",
                expected,
                width,
                height,
                layout,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// Buffer with the same dimensions as `other` but a different layout.
    ///
    /// Callers guarantee `data` holds one `layout` pixel per pixel of `other`.
    pub(crate) fn reshaped(other: &PixelBuffer, layout: ColorLayout, data: Vec<u16>) -> Self {
        debug_assert_eq!(data.len(), other.pixel_count() * layout.channels());
        Self {
            width: other.width,
            height: other.height,
            layout,
            data,
        }
    }

    /// Buffer with every colour sample set to `value` (reserved sample set to full scale).
    pub fn filled(width: u32, height: u32, layout: ColorLayout, value: u16) -> Result<Self> {
        let pixels = width as usize * height as usize;
        let channels = layout.channels();
        let mut data = Vec::with_capacity(pixels * channels);
        for _ in 0..pixels {
            for c in 0..channels {
                data.push(if c < layout.color_channels() {
                    value
                } else {
                    FULL_SCALE
                });
            }
        }
        Self::new(width, height, layout, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> ColorLayout {
        self.layout
    }

    /// Samples stored per pixel.
    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Number of pixels (`width * height`).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[u16] {
        &self.data
    }

    /// Mutable interleaved samples. The shape cannot change through this view.
    pub fn samples_mut(&mut self) -> &mut [u16] {
        &mut self.data
    }

    /// Iterate pixels as sample slices.
    pub fn pixels(&self) -> std::slice::ChunksExact<'_, u16> {
        self.data.chunks_exact(self.layout.channels())
    }

    /// Sample at (`x`, `y`, `channel`).
    pub fn sample(&self, x: u32, y: u32, channel: usize) -> u16 {
        let idx = (y as usize * self.width as usize + x as usize) * self.channels() + channel;
        self.data[idx]
    }
}

/// Normalise a sample to 0.0-1.0.
#[inline]
pub fn to_unit(value: u16) -> f32 {
    value as f32 / FULL_SCALE_F
}

/// Quantise a 0.0-1.0 value back to a sample, clamping out-of-range input.
#[inline]
pub fn from_unit(value: f32) -> u16 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * FULL_SCALE_F).round() as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_length() {
        let err = PixelBuffer::new(2, 2, ColorLayout::Rgb, vec![0; 11]).unwrap_err();
        assert!(matches!(err, Error::InvalidBuffer(_)));

        let ok = PixelBuffer::new(2, 2, ColorLayout::Rgb, vec![0; 12]);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_new_rejects_empty() {
        let err = PixelBuffer::new(0, 4, ColorLayout::Gray, vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidBuffer(_)));
    }

    #[test]
    fn test_filled_rgba_keeps_reserved_sample() {
        let buffer = PixelBuffer::filled(1, 2, ColorLayout::Rgba, 100).unwrap();
        assert_eq!(buffer.samples(), &[100, 100, 100, FULL_SCALE, 100, 100, 100, FULL_SCALE]);
    }

    #[test]
    fn test_sample_indexing() {
        let buffer = PixelBuffer::new(2, 1, ColorLayout::Rgb, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(buffer.sample(1, 0, 2), 6);
        assert_eq!(buffer.sample(0, 0, 1), 2);
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(from_unit(1.5), FULL_SCALE);
        assert_eq!(from_unit(-0.2), 0);
        assert_eq!(from_unit(f32::NAN), 0);
        assert_eq!(from_unit(to_unit(32768)), 32768);
    }
}
