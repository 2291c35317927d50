//! Percentile clip ceilings
//!
//! A clip ceiling is the level below which a target fraction of a channel's
//! pixels fall. Raw output is rescaled per channel so the ceiling maps to
//! full scale before the tone engine sees it.

use serde::{Deserialize, Serialize};

use super::histogram::{BelowThresholdEstimator, Histogram, HISTOGRAM_LEVELS};
use crate::buffer::{PixelBuffer, FULL_SCALE};
use crate::parallel::for_each_pixel_mut;

/// Per-channel clip ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClipCeiling(pub [u16; 3]);

impl ClipCeiling {
    /// Ceiling for `channel`.
    pub fn channel(&self, channel: usize) -> u16 {
        self.0[channel]
    }
}

/// Finds the level at which a channel's cumulative count reaches a percentile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileClipEstimator {
    /// Target fraction of pixels, in (0, 1)
    pub percentile: f64,
    /// Minimum ceiling; lower ceilings would amplify noise on normalisation
    pub floor: u16,
}

impl PercentileClipEstimator {
    pub fn new(percentile: f64, floor: u16) -> Self {
        Self { percentile, floor }
    }

    /// Ceiling for every channel of `histogram` (up to three).
    pub fn estimate(&self, histogram: &Histogram) -> ClipCeiling {
        let mut ceilings = [FULL_SCALE; 3];
        for (c, ceiling) in ceilings
            .iter_mut()
            .enumerate()
            .take(histogram.channel_count())
        {
            *ceiling = self.channel_ceiling(histogram, c);
        }
        // Gray histograms drive all three channels
        if histogram.channel_count() == 1 {
            ceilings = [ceilings[0]; 3];
        }
        ClipCeiling(ceilings)
    }

    fn channel_ceiling(&self, histogram: &Histogram, channel: usize) -> u16 {
        let target = self.percentile * histogram.pixel_count() as f64;
        let mut cumulative = 0u64;
        let mut ceiling = (HISTOGRAM_LEVELS - 1) as u16;

        for (level, &count) in histogram.channel(channel).iter().enumerate() {
            cumulative += count as u64;
            if cumulative as f64 >= target {
                ceiling = level as u16;
                break;
            }
        }

        ceiling.max(self.floor)
    }
}

/// Clip normalisation settings for raw decode output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipSettings {
    /// Normalise raw output to per-channel ceilings
    pub enabled: bool,
    /// Percentile used for typical frames
    pub percentile: f64,
    /// Lowest allowed ceiling
    pub floor: u16,
    /// Level below which a sample counts as deep shadow
    pub shadow_level: u16,
    /// Mean shadow fraction above which a frame is treated as dark-dominated
    pub dark_fraction: f64,
    /// Percentile used for dark-dominated frames
    pub dark_percentile: f64,
}

impl Default for ClipSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            percentile: 0.999,
            floor: 8192,
            shadow_level: 2048,
            dark_fraction: 0.5,
            dark_percentile: 0.995,
        }
    }
}

impl ClipSettings {
    /// Pick the clip percentile for `histogram` based on how much of the frame is deep shadow.
    pub fn select_percentile(&self, histogram: &Histogram) -> f64 {
        let fractions = BelowThresholdEstimator::fraction(histogram, self.shadow_level);
        let mean_fraction = fractions.iter().sum::<f64>() / fractions.len().max(1) as f64;

        if mean_fraction > self.dark_fraction {
            self.dark_percentile
        } else {
            self.percentile
        }
    }

    /// Estimator configured for `histogram`.
    pub fn estimator_for(&self, histogram: &Histogram) -> PercentileClipEstimator {
        PercentileClipEstimator::new(self.select_percentile(histogram), self.floor)
    }
}

/// Rescale every colour channel so its ceiling maps to full scale.
pub fn normalize_to_ceilings(buffer: &mut PixelBuffer, ceilings: &ClipCeiling) {
    let color_channels = buffer.layout().color_channels();
    let scales: [f64; 3] =
        std::array::from_fn(|c| FULL_SCALE as f64 / ceilings.channel(c).max(1) as f64);

    let channels = buffer.channels();
    for_each_pixel_mut(buffer.samples_mut(), channels, |pixel| {
        for c in 0..color_channels {
            let scaled = (pixel[c] as f64 * scales[c]).round();
            pixel[c] = scaled.min(FULL_SCALE as f64) as u16;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auto_adjust::histogram::HistogramBuilder;
    use crate::buffer::ColorLayout;

    /// One pixel at every 16-bit level on every channel.
    fn uniform_buffer() -> PixelBuffer {
        let data: Vec<u16> = (0..=u16::MAX).flat_map(|v| [v, v, v]).collect();
        PixelBuffer::new(256, 256, ColorLayout::Rgb, data).unwrap()
    }

    #[test]
    fn test_uniform_histogram_ceiling_tracks_percentile() {
        let histogram = HistogramBuilder::rgb().build(&uniform_buffer()).unwrap();

        for p in [0.1, 0.5, 0.9, 0.99] {
            let ceiling = PercentileClipEstimator::new(p, 0).estimate(&histogram);
            let expected = p * 65535.0;
            for c in 0..3 {
                let got = ceiling.channel(c) as f64;
                assert!(
                    (got - expected).abs() <= 1.0,
                    "p={} channel={} got={} expected={}",
                    p,
                    c,
                    got,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_floor_raises_low_ceilings() {
        let buffer = PixelBuffer::filled(8, 8, ColorLayout::Rgb, 100).unwrap();
        let histogram = HistogramBuilder::rgb().build(&buffer).unwrap();

        let ceiling = PercentileClipEstimator::new(0.99, 4096).estimate(&histogram);
        assert_eq!(ceiling, ClipCeiling([4096; 3]));
    }

    #[test]
    fn test_ceilings_never_below_floor() {
        let data: Vec<u16> = (0..300u32)
            .flat_map(|i| [(i * 3) as u16, 0, (i * 200) as u16])
            .collect();
        let buffer = PixelBuffer::new(30, 10, ColorLayout::Rgb, data).unwrap();
        let histogram = HistogramBuilder::rgb().build(&buffer).unwrap();

        for p in [0.01, 0.5, 0.999] {
            let ceiling = PercentileClipEstimator::new(p, 2500).estimate(&histogram);
            assert!(ceiling.0.iter().all(|&c| c >= 2500));
        }
    }

    #[test]
    fn test_unreachable_target_falls_back_to_top_of_range() {
        let buffer = PixelBuffer::filled(4, 4, ColorLayout::Rgb, 500).unwrap();
        let histogram = HistogramBuilder::rgb().build(&buffer).unwrap();

        let ceiling = PercentileClipEstimator::new(1.5, 0).estimate(&histogram);
        assert_eq!(ceiling, ClipCeiling([65535; 3]));
    }

    #[test]
    fn test_gray_histogram_fills_all_channels() {
        let buffer = PixelBuffer::filled(4, 4, ColorLayout::Gray, 30000).unwrap();
        let histogram = HistogramBuilder::for_buffer(&buffer).build(&buffer).unwrap();

        let ceiling = PercentileClipEstimator::new(0.5, 0).estimate(&histogram);
        assert_eq!(ceiling, ClipCeiling([30000; 3]));
    }

    #[test]
    fn test_normalize_to_ceilings() {
        let mut buffer =
            PixelBuffer::new(2, 1, ColorLayout::Rgb, vec![10000, 32767, 65535, 40000, 0, 1000])
                .unwrap();
        normalize_to_ceilings(&mut buffer, &ClipCeiling([32767, 32767, 65535]));

        // 10000 * 65535 / 32767 = 20000.3
        assert_eq!(buffer.samples(), &[20000, 65535, 65535, 65535, 0, 1000]);
    }

    #[test]
    fn test_normalize_rounds_to_nearest() {
        let mut buffer =
            PixelBuffer::new(1, 1, ColorLayout::Rgb, vec![10001, 9999, 20000]).unwrap();
        normalize_to_ceilings(&mut buffer, &ClipCeiling([20000, 20000, 20000]));

        // 32770.77, 32764.22 and exactly full scale
        assert_eq!(buffer.samples(), &[32771, 32764, 65535]);
    }

    #[test]
    fn test_dark_frames_use_dark_percentile() {
        let settings = ClipSettings::default();

        let dark = PixelBuffer::filled(4, 4, ColorLayout::Rgb, 100).unwrap();
        let dark_hist = HistogramBuilder::rgb().build(&dark).unwrap();
        assert_eq!(settings.select_percentile(&dark_hist), settings.dark_percentile);

        let bright = PixelBuffer::filled(4, 4, ColorLayout::Rgb, 30000).unwrap();
        let bright_hist = HistogramBuilder::rgb().build(&bright).unwrap();
        assert_eq!(settings.select_percentile(&bright_hist), settings.percentile);
    }
}
