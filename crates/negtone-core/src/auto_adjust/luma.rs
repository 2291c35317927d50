//! Luma mean/contrast probe
//!
//! The feedback signal of the tone engine: a grayscale rendering of the
//! image reduced to its normalised mean and population standard deviation.

use serde::Serialize;

use crate::buffer::{PixelBuffer, FULL_SCALE};
use crate::filters::color::to_grayscale;

/// Normalised luma statistics, both in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LumaStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// Measures [`LumaStats`] on a grayscale copy of a buffer
#[derive(Debug, Clone, Copy, Default)]
pub struct LumaContrastProbe;

impl LumaContrastProbe {
    /// Measure `buffer`, optionally as if it were negated.
    ///
    /// The caller's buffer is never modified.
    pub fn measure(buffer: &PixelBuffer, negate: bool) -> LumaStats {
        let gray = to_grayscale(buffer);
        let samples = gray.samples();
        let n = samples.len() as f64;
        let full_scale = FULL_SCALE as f64;

        let value = |v: u16| -> f64 {
            if negate {
                (FULL_SCALE - v) as f64
            } else {
                v as f64
            }
        };

        let mean = samples.iter().map(|&v| value(v)).sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|&v| {
                let d = value(v) - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        LumaStats {
            mean: mean / full_scale,
            std_dev: variance.sqrt() / full_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ColorLayout;
    use approx::assert_abs_diff_eq;

    fn checkerboard(low: u16, high: u16) -> PixelBuffer {
        let data: Vec<u16> = (0..64)
            .flat_map(|i| {
                let v = if (i / 8 + i % 8) % 2 == 0 { low } else { high };
                [v, v, v]
            })
            .collect();
        PixelBuffer::new(8, 8, ColorLayout::Rgb, data).unwrap()
    }

    #[test]
    fn test_flat_buffer_has_zero_std() {
        let buffer = PixelBuffer::filled(16, 16, ColorLayout::Rgb, 32768).unwrap();
        let stats = LumaContrastProbe::measure(&buffer, false);

        assert_abs_diff_eq!(stats.mean, 32768.0 / 65535.0, epsilon = 1e-9);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_checkerboard_stats() {
        let stats = LumaContrastProbe::measure(&checkerboard(0, 65535), false);
        assert_abs_diff_eq!(stats.mean, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(stats.std_dev, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_negate_flips_mean_and_keeps_std() {
        let buffer = checkerboard(10000, 30000);
        let plain = LumaContrastProbe::measure(&buffer, false);
        let negated = LumaContrastProbe::measure(&buffer, true);

        assert_abs_diff_eq!(plain.mean + negated.mean, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(plain.std_dev, negated.std_dev, epsilon = 1e-12);
    }

    #[test]
    fn test_probe_is_deterministic_and_non_mutating() {
        let buffer = checkerboard(1234, 54321);
        let before = buffer.clone();

        let a = LumaContrastProbe::measure(&buffer, true);
        let b = LumaContrastProbe::measure(&buffer, true);

        assert_eq!(a.mean.to_bits(), b.mean.to_bits());
        assert_eq!(a.std_dev.to_bits(), b.std_dev.to_bits());
        assert_eq!(buffer, before);
    }

    #[test]
    fn test_gray_input_is_measured_directly() {
        let buffer = PixelBuffer::new(2, 1, ColorLayout::Gray, vec![0, 65535]).unwrap();
        let stats = LumaContrastProbe::measure(&buffer, false);
        assert_abs_diff_eq!(stats.mean, 0.5, epsilon = 1e-9);
    }
}
