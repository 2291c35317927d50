//! Exposure shift estimation for the two-pass raw decode
//!
//! The first, uncorrected decode is measured here; the resulting shift (in
//! stops) is handed to the second decode. The estimator only ever brightens.

use serde::Serialize;

use crate::buffer::PixelBuffer;

/// Default target luminance on the 16-bit scale (roughly 18% grey)
pub const DEFAULT_TARGET_LUMINANCE: f64 = 12000.0;

/// Largest shift the estimator will ever request
pub const MAX_EXPOSURE_SHIFT: f64 = 6.0;

/// Measured luminance is never taken below this before dividing
const MIN_MEASURED_LUMINANCE: f64 = 1.0;

/// Exposure correction in stops, always within `[0, MAX_EXPOSURE_SHIFT]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
pub struct ExposureShift(f64);

impl ExposureShift {
    /// No correction.
    pub const NONE: ExposureShift = ExposureShift(0.0);

    /// Clamp `stops` into the valid range. NaN becomes no correction.
    pub fn clamped(stops: f64) -> Self {
        if stops.is_nan() {
            return Self::NONE;
        }
        Self(stops.clamp(0.0, MAX_EXPOSURE_SHIFT))
    }

    pub fn stops(self) -> f64 {
        self.0
    }
}

/// Computes an exposure shift from the mean luminance of an uncorrected decode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureEstimator {
    /// Target mean luminance on the 16-bit scale
    pub target_luminance: f64,
}

impl Default for ExposureEstimator {
    fn default() -> Self {
        Self {
            target_luminance: DEFAULT_TARGET_LUMINANCE,
        }
    }
}

impl ExposureEstimator {
    pub fn new(target_luminance: f64) -> Self {
        Self { target_luminance }
    }

    /// Mean of strictly positive samples per colour channel.
    ///
    /// Pure black samples are excluded so large unexposed areas do not drag
    /// the estimate down. A channel with no positive samples has mean 0.
    pub fn channel_means(buffer: &PixelBuffer) -> [f64; 3] {
        let color_channels = buffer.layout().color_channels();
        let mut sums = [0.0f64; 3];
        let mut counts = [0u64; 3];

        for pixel in buffer.pixels() {
            for c in 0..color_channels {
                let v = pixel[c];
                if v > 0 {
                    sums[c] += v as f64;
                    counts[c] += 1;
                }
            }
        }

        let mut means = [0.0f64; 3];
        for c in 0..color_channels {
            if counts[c] > 0 {
                means[c] = sums[c] / counts[c] as f64;
            }
        }
        if color_channels == 1 {
            means = [means[0]; 3];
        }
        means
    }

    /// Average of the three channel means.
    pub fn measured_luminance(buffer: &PixelBuffer) -> f64 {
        let means = Self::channel_means(buffer);
        (means[0] + means[1] + means[2]) / 3.0
    }

    /// Shift that would bring the measured luminance to the target.
    pub fn estimate(&self, buffer: &PixelBuffer) -> ExposureShift {
        let luminance = Self::measured_luminance(buffer).max(MIN_MEASURED_LUMINANCE);
        ExposureShift::clamped((self.target_luminance / luminance).log2())
    }
}
