//! Per-channel 16-bit histograms
//!
//! One histogram build feeds every histogram consumer (percentile clip
//! ceilings, below-threshold fractions, normalisation), so the pixel data is
//! scanned exactly once per measurement.

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};
use crate::parallel::fold_pixels;

/// Number of intensity levels in a 16-bit histogram
pub const HISTOGRAM_LEVELS: usize = 65536;

/// Read-only per-channel intensity histogram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    bins: Vec<Vec<u32>>,
    pixel_count: u64,
}

impl Histogram {
    /// Number of channels with a histogram.
    pub fn channel_count(&self) -> usize {
        self.bins.len()
    }

    /// Counts per level for `channel`.
    pub fn channel(&self, channel: usize) -> &[u32] {
        &self.bins[channel]
    }

    /// Number of pixels the histogram was built from.
    pub fn pixel_count(&self) -> u64 {
        self.pixel_count
    }

    /// Sum of counts for `channel`. Always equals [`Histogram::pixel_count`].
    pub fn channel_total(&self, channel: usize) -> u64 {
        self.bins[channel].iter().map(|&c| c as u64).sum()
    }

    /// Counts per level summed across all channels.
    pub fn combined(&self) -> Vec<u64> {
        let mut combined = vec![0u64; HISTOGRAM_LEVELS];
        for channel in &self.bins {
            for (total, &count) in combined.iter_mut().zip(channel.iter()) {
                *total += count as u64;
            }
        }
        combined
    }
}

/// Builds [`Histogram`]s over the colour channels of a buffer
#[derive(Debug, Clone, Copy)]
pub struct HistogramBuilder {
    channels: usize,
}

impl Default for HistogramBuilder {
    fn default() -> Self {
        Self::rgb()
    }
}

impl HistogramBuilder {
    /// Builder for the first `channels` samples of each pixel.
    pub fn new(channels: usize) -> Self {
        Self { channels }
    }

    /// Builder for red, green and blue.
    pub fn rgb() -> Self {
        Self::new(3)
    }

    /// Builder covering every colour channel of `buffer`.
    pub fn for_buffer(buffer: &PixelBuffer) -> Self {
        Self::new(buffer.layout().color_channels())
    }

    /// Single linear pass over `buffer`.
    pub fn build(&self, buffer: &PixelBuffer) -> Result<Histogram> {
        let available = buffer.layout().color_channels();
        if self.channels == 0 || self.channels > available {
            return Err(Error::InvalidBuffer(format!(
                "cannot build a {}-channel histogram from a {:?} buffer",
                self.channels,
                buffer.layout()
            )));
        }

        let wanted = self.channels;
        let stride = buffer.channels();

        let bins = fold_pixels(
            buffer.samples(),
            stride,
            || vec![vec![0u32; HISTOGRAM_LEVELS]; wanted],
            |mut acc, pixel| {
                for (c, bins) in acc.iter_mut().enumerate() {
                    bins[pixel[c] as usize] += 1;
                }
                acc
            },
            |mut a, b| {
                for (a_bins, b_bins) in a.iter_mut().zip(b.iter()) {
                    for (x, &y) in a_bins.iter_mut().zip(b_bins.iter()) {
                        *x += y;
                    }
                }
                a
            },
        );

        Ok(Histogram {
            bins,
            pixel_count: buffer.pixel_count() as u64,
        })
    }
}

/// Second histogram consumer: how much of each channel sits below a level
#[derive(Debug, Clone, Copy, Default)]
pub struct BelowThresholdEstimator;

impl BelowThresholdEstimator {
    /// Fraction of pixels per channel whose sample lies strictly below `level`.
    pub fn fraction(histogram: &Histogram, level: u16) -> Vec<f64> {
        let total = histogram.pixel_count().max(1) as f64;
        (0..histogram.channel_count())
            .map(|c| {
                let below: u64 = histogram.channel(c)[..level as usize]
                    .iter()
                    .map(|&n| n as u64)
                    .sum();
                below as f64 / total
            })
            .collect()
    }
}
