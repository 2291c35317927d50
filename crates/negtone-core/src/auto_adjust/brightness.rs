//! Brightness modulation factor
//!
//! Converts a measured luma/contrast pair into the brightness percentage
//! handed to the modulate filter during fine adjustment.

/// Mean luma below which an image is treated as black
pub const DEGENERATE_MEAN: f64 = 1e-5;

/// Target luma reduction applied to already contrasty images
pub const HIGH_CONTRAST_TARGET_OFFSET: f64 = 0.03;

/// Sub-linear exponent damping the target/measured ratio
pub const BRIGHTNESS_EXPONENT: f64 = 0.75;

/// Default cap on the modulation percentage
pub const DEFAULT_MAX_BOOST_PERCENT: f64 = 150.0;

/// Computes a bounded brightness percentage from luma statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessModulator {
    /// Desired mean luma, 0.0-1.0
    pub target_luma: f64,
    /// Standard deviation above which the image counts as high contrast
    pub contrast_threshold: f64,
    /// Upper bound on the returned percentage
    pub max_boost_percent: f64,
}

impl BrightnessModulator {
    pub fn new(target_luma: f64, contrast_threshold: f64, max_boost_percent: f64) -> Self {
        Self {
            target_luma,
            contrast_threshold,
            max_boost_percent,
        }
    }

    /// Target luma after the high-contrast adjustment.
    pub fn effective_target(&self, gray_std_dev: f64) -> f64 {
        if gray_std_dev > self.contrast_threshold {
            self.target_luma - HIGH_CONTRAST_TARGET_OFFSET
        } else {
            self.target_luma
        }
    }

    /// Brightness percentage in `[0, max_boost_percent]`.
    pub fn modulate(&self, gray_mean: f64, gray_std_dev: f64) -> f64 {
        if gray_mean < DEGENERATE_MEAN {
            return self.max_boost_percent;
        }

        let target = self.effective_target(gray_std_dev);
        let factor = (target / gray_mean).powf(BRIGHTNESS_EXPONENT);

        // A negative target has no meaningful ratio
        if factor.is_nan() {
            return 0.0;
        }

        (factor * 100.0).min(self.max_boost_percent).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn modulator() -> BrightnessModulator {
        BrightnessModulator::new(0.45, 0.20, DEFAULT_MAX_BOOST_PERCENT)
    }

    #[test]
    fn test_near_black_returns_max_boost() {
        for std_dev in [0.0, 0.1, 0.5, 10.0] {
            for target in [0.0, 0.2, 0.45, 0.9] {
                let m = BrightnessModulator::new(target, 0.2, 150.0);
                assert_eq!(m.modulate(0.0, std_dev), 150.0);
                assert_eq!(m.modulate(9.9e-6, std_dev), 150.0);
            }
        }
    }

    #[test]
    fn test_target_equal_to_mean_is_unity() {
        assert_relative_eq!(modulator().modulate(0.45, 0.1), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_known_value() {
        // (0.45 / 0.3)^0.75 * 100
        let expected = 1.5f64.powf(0.75) * 100.0;
        assert_relative_eq!(modulator().modulate(0.3, 0.1), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_high_contrast_lowers_target() {
        let m = modulator();
        let high = m.modulate(0.4, 0.25);
        let shifted = BrightnessModulator::new(0.45 - 0.03, 0.20, 150.0).modulate(0.4, 0.0);
        assert_eq!(high.to_bits(), shifted.to_bits());
        assert!(high < m.modulate(0.4, 0.1));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let m = modulator();
        assert_eq!(m.effective_target(0.20), 0.45);
        assert_relative_eq!(m.effective_target(0.2000001), 0.42, epsilon = 1e-12);
    }

    #[test]
    fn test_capped_at_max_boost() {
        assert_eq!(modulator().modulate(0.01, 0.0), 150.0);
        let custom = BrightnessModulator::new(0.45, 0.2, 120.0);
        assert_eq!(custom.modulate(0.05, 0.0), 120.0);
    }

    #[test]
    fn test_output_always_bounded() {
        let m = modulator();
        for i in 0..=100 {
            let mean = i as f64 / 100.0;
            for std_dev in [0.0, 0.1, 0.2, 0.3, 0.6] {
                let p = m.modulate(mean, std_dev);
                assert!((0.0..=150.0).contains(&p), "mean={} std={} p={}", mean, std_dev, p);
            }
        }
    }

    #[test]
    fn test_zero_target_never_negative() {
        let m = BrightnessModulator::new(0.02, 0.2, 150.0);
        // Effective target -0.01: fractional power of a negative ratio
        assert_eq!(m.modulate(0.5, 0.9), 0.0);
    }
}
