//! Data models for negtone
//!
//! Parameter structures threaded through the tone pipeline. Both are loaded
//! once from configuration, optionally overridden from the command line,
//! validated, and then only ever read.

use serde::{Deserialize, Serialize};

use crate::auto_adjust::{
    BrightnessModulator, ClipSettings, ExposureEstimator, DEFAULT_MAX_BOOST_PERCENT,
    DEFAULT_TARGET_LUMINANCE,
};
use crate::error::{Error, Result};
use crate::filters::ColorMode;

/// Tone and colour parameters for a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneParameters {
    /// Mean luma the fine adjustment aims for (0.0 - 1.0)
    #[serde(default = "default_target_luma")]
    pub target_luma: f64,

    /// Luma standard deviation above which an image counts as high contrast
    #[serde(default = "default_contrast_threshold")]
    pub contrast_threshold: f64,

    /// Gamma applied during fine adjustment (output = input^(1/gamma))
    #[serde(default = "default_gamma")]
    pub gamma: f64,

    /// White point of the fine-adjust level remap, as a fraction of full scale
    #[serde(default = "default_level_max")]
    pub level_max: f64,

    /// Gamma of the fine-adjust level remap
    #[serde(default = "default_level_gamma")]
    pub level_gamma: f64,

    /// Invert the image (negative to positive)
    #[serde(default)]
    pub negate: bool,

    /// Keep colour instead of rendering to grayscale
    #[serde(default)]
    pub keep_color: bool,

    /// Per-channel white balance multipliers (R, G, B)
    #[serde(default = "default_white_balance")]
    pub white_balance: [f64; 3],

    /// Sigmoidal contrast strength; values near 0 disable the curve
    #[serde(default = "default_sigmoidal_strength")]
    pub sigmoidal_strength: f64,

    /// Sigmoidal contrast midpoint (0.0 - 1.0)
    #[serde(default = "default_sigmoidal_midpoint")]
    pub sigmoidal_midpoint: f64,

    /// Saturation in percent (100 = unchanged)
    #[serde(default = "default_percent")]
    pub saturation: f64,

    /// Hue in percent (100 = unchanged, 200 = half turn)
    #[serde(default = "default_percent")]
    pub hue: f64,

    /// Multiplier applied before normalisation
    #[serde(default = "default_evaluate_factor")]
    pub evaluate_factor: f64,

    /// Sharpen kernel radius in pixels, 0 = derive from sigma
    #[serde(default)]
    pub sharpen_radius: f64,

    /// Sharpen Gaussian sigma, 0 disables sharpening
    #[serde(default = "default_sharpen_sigma")]
    pub sharpen_sigma: f64,

    /// Upper bound on the fine-adjust brightness percentage
    #[serde(default = "default_max_boost_percent")]
    pub max_boost_percent: f64,
}

fn default_target_luma() -> f64 {
    0.45
}

fn default_contrast_threshold() -> f64 {
    0.20
}

fn default_gamma() -> f64 {
    1.225
}

fn default_level_max() -> f64 {
    0.98
}

fn default_level_gamma() -> f64 {
    1.2
}

fn default_white_balance() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

fn default_sigmoidal_strength() -> f64 {
    3.0
}

fn default_sigmoidal_midpoint() -> f64 {
    0.5
}

fn default_percent() -> f64 {
    100.0
}

fn default_evaluate_factor() -> f64 {
    1.0
}

fn default_sharpen_sigma() -> f64 {
    1.0
}

fn default_max_boost_percent() -> f64 {
    DEFAULT_MAX_BOOST_PERCENT
}

fn default_target_luminance() -> f64 {
    DEFAULT_TARGET_LUMINANCE
}

impl Default for ToneParameters {
    fn default() -> Self {
        Self {
            target_luma: default_target_luma(),
            contrast_threshold: default_contrast_threshold(),
            gamma: default_gamma(),
            level_max: default_level_max(),
            level_gamma: default_level_gamma(),
            negate: false,
            keep_color: false,
            white_balance: default_white_balance(),
            sigmoidal_strength: default_sigmoidal_strength(),
            sigmoidal_midpoint: default_sigmoidal_midpoint(),
            saturation: default_percent(),
            hue: default_percent(),
            evaluate_factor: default_evaluate_factor(),
            sharpen_radius: 0.0,
            sharpen_sigma: default_sharpen_sigma(),
            max_boost_percent: default_max_boost_percent(),
        }
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidParameter(message)
}

fn finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(format!("{} must be finite, got {}", name, value)))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if finite(name, value)? < 0.0 {
        return Err(invalid(format!("{} must be >= 0, got {}", name, value)));
    }
    Ok(())
}

fn positive(name: &str, value: f64) -> Result<()> {
    if finite(name, value)? <= 0.0 {
        return Err(invalid(format!("{} must be > 0, got {}", name, value)));
    }
    Ok(())
}

fn unit_interval(name: &str, value: f64) -> Result<()> {
    let value = finite(name, value)?;
    if value <= 0.0 || value > 1.0 {
        return Err(invalid(format!("{} must be in (0, 1], got {}", name, value)));
    }
    Ok(())
}

impl ToneParameters {
    /// Reject values no stage can work with.
    pub fn validate(&self) -> Result<()> {
        unit_interval("target_luma", self.target_luma)?;
        non_negative("contrast_threshold", self.contrast_threshold)?;
        positive("gamma", self.gamma)?;
        unit_interval("level_max", self.level_max)?;
        positive("level_gamma", self.level_gamma)?;

        for (channel, &m) in ["red", "green", "blue"].iter().zip(&self.white_balance) {
            non_negative(&format!("white_balance {}", channel), m)?;
        }

        finite("sigmoidal_strength", self.sigmoidal_strength)?;
        let midpoint = finite("sigmoidal_midpoint", self.sigmoidal_midpoint)?;
        if !(0.0..=1.0).contains(&midpoint) {
            return Err(invalid(format!(
                "sigmoidal_midpoint must be in [0, 1], got {}",
                midpoint
            )));
        }
        non_negative("saturation", self.saturation)?;
        non_negative("hue", self.hue)?;
        non_negative("evaluate_factor", self.evaluate_factor)?;
        non_negative("sharpen_radius", self.sharpen_radius)?;
        non_negative("sharpen_sigma", self.sharpen_sigma)?;
        positive("max_boost_percent", self.max_boost_percent)?;
        Ok(())
    }

    /// Diagonal colour matrix scaling each channel by its white balance multiplier.
    pub fn white_balance_matrix(&self) -> [[f32; 3]; 3] {
        let [r, g, b] = self.white_balance;
        [
            [r as f32, 0.0, 0.0],
            [0.0, g as f32, 0.0],
            [0.0, 0.0, b as f32],
        ]
    }

    /// Final colour handling implied by `keep_color`.
    pub fn color_mode(&self) -> ColorMode {
        if self.keep_color {
            ColorMode::Keep
        } else {
            ColorMode::Grayscale
        }
    }

    pub fn brightness_modulator(&self) -> BrightnessModulator {
        BrightnessModulator::new(
            self.target_luma,
            self.contrast_threshold,
            self.max_boost_percent,
        )
    }
}

/// Parameters for the raw two-pass decode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawParameters {
    /// Mean luminance (16-bit scale) the exposure estimator aims for
    #[serde(default = "default_target_luminance")]
    pub target_luminance: f64,

    /// Per-channel clip normalisation of the corrected decode
    #[serde(default)]
    pub clip: ClipSettings,
}

impl Default for RawParameters {
    fn default() -> Self {
        Self {
            target_luminance: default_target_luminance(),
            clip: ClipSettings::default(),
        }
    }
}

impl RawParameters {
    pub fn validate(&self) -> Result<()> {
        positive("target_luminance", self.target_luminance)?;
        unit_interval("clip.percentile", self.clip.percentile)?;
        unit_interval("clip.dark_percentile", self.clip.dark_percentile)?;

        let dark_fraction = finite("clip.dark_fraction", self.clip.dark_fraction)?;
        if !(0.0..=1.0).contains(&dark_fraction) {
            return Err(invalid(format!(
                "clip.dark_fraction must be in [0, 1], got {}",
                dark_fraction
            )));
        }
        Ok(())
    }

    pub fn exposure_estimator(&self) -> ExposureEstimator {
        ExposureEstimator::new(self.target_luminance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let params = ToneParameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.target_luma, 0.45);
        assert_eq!(params.gamma, 1.225);
        assert_eq!(params.max_boost_percent, 150.0);
        assert!(RawParameters::default().validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let params: ToneParameters =
            serde_yaml::from_str("target_luma: 0.5\nnegate: true\n").unwrap();
        assert_eq!(params.target_luma, 0.5);
        assert!(params.negate);
        assert_eq!(params.level_max, 0.98);
        assert_eq!(params.white_balance, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let cases: Vec<Box<dyn Fn(&mut ToneParameters)>> = vec![
            Box::new(|p| p.target_luma = 0.0),
            Box::new(|p| p.target_luma = 1.5),
            Box::new(|p| p.level_max = 1.01),
            Box::new(|p| p.gamma = 0.0),
            Box::new(|p| p.level_gamma = -1.0),
            Box::new(|p| p.white_balance[2] = -0.1),
            Box::new(|p| p.saturation = f64::NAN),
            Box::new(|p| p.evaluate_factor = -2.0),
            Box::new(|p| p.max_boost_percent = 0.0),
            Box::new(|p| p.sharpen_sigma = -0.5),
            Box::new(|p| p.sigmoidal_midpoint = 5.0),
            Box::new(|p| p.sigmoidal_midpoint = -0.01),
        ];

        for mutate in cases {
            let mut params = ToneParameters::default();
            mutate(&mut params);
            assert!(matches!(params.validate(), Err(Error::InvalidParameter(_))));
        }
    }

    #[test]
    fn test_sigmoidal_midpoint_bounds_are_inclusive() {
        for midpoint in [0.0, 1.0] {
            let params = ToneParameters {
                sigmoidal_midpoint: midpoint,
                ..Default::default()
            };
            assert!(params.validate().is_ok());
        }
    }

    #[test]
    fn test_white_balance_matrix_is_diagonal() {
        let params = ToneParameters {
            white_balance: [1.5, 1.0, 0.5],
            ..Default::default()
        };
        let m = params.white_balance_matrix();
        assert_eq!(m[0], [1.5, 0.0, 0.0]);
        assert_eq!(m[2], [0.0, 0.0, 0.5]);
    }

    #[test]
    fn test_color_mode_follows_keep_color() {
        let mut params = ToneParameters::default();
        assert_eq!(params.color_mode(), ColorMode::Grayscale);
        params.keep_color = true;
        assert_eq!(params.color_mode(), ColorMode::Keep);
    }

    #[test]
    fn test_raw_parameters_reject_bad_clip() {
        let mut raw = RawParameters::default();
        raw.clip.percentile = 0.0;
        assert!(raw.validate().is_err());

        let mut raw = RawParameters::default();
        raw.target_luminance = -5.0;
        assert!(raw.validate().is_err());
    }
}
