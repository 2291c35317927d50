//! Statistics-driven measurements and decisions
//!
//! Histogram building, percentile clip ceilings, exposure estimation, the
//! luma/contrast probe and the brightness modulator. None of these touch
//! pixel data they were not explicitly handed mutably.

mod brightness;
mod clip;
mod exposure;
mod histogram;
mod luma;

pub use brightness::{
    BrightnessModulator, BRIGHTNESS_EXPONENT, DEFAULT_MAX_BOOST_PERCENT, DEGENERATE_MEAN,
    HIGH_CONTRAST_TARGET_OFFSET,
};
pub use clip::{normalize_to_ceilings, ClipCeiling, ClipSettings, PercentileClipEstimator};
pub use exposure::{
    ExposureEstimator, ExposureShift, DEFAULT_TARGET_LUMINANCE, MAX_EXPOSURE_SHIFT,
};
pub use histogram::{BelowThresholdEstimator, Histogram, HistogramBuilder, HISTOGRAM_LEVELS};
pub use luma::{LumaContrastProbe, LumaStats};
