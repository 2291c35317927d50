//! Point tone curves
//!
//! Every curve here maps one 16-bit sample to one 16-bit sample, so each is
//! evaluated once per level into a lookup table and then applied to the
//! colour channels. The reserved fourth sample of RGBA buffers is never
//! touched.

use std::f64::consts::PI;

use crate::auto_adjust::HistogramBuilder;
use crate::buffer::{PixelBuffer, FULL_SCALE};
use crate::error::{Error, Result};
use crate::parallel::for_each_pixel_mut;

/// Fraction of samples clipped to black by [`normalize`]
pub const NORMALIZE_BLACK_FRACTION: f64 = 0.02;

/// Fraction of samples at or below the white point of [`normalize`]
pub const NORMALIZE_WHITE_FRACTION: f64 = 0.99;

/// Strength below which the sigmoidal curve is the identity
const SIGMOIDAL_IDENTITY_STRENGTH: f64 = 1e-4;

type Lut = Vec<u16>;

#[inline]
fn quantize(value: f64) -> u16 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * FULL_SCALE as f64).round() as u16
}

/// Evaluate `curve` at every 16-bit level, on normalised input.
fn build_lut<F>(curve: F) -> Lut
where
    F: Fn(f64) -> f64,
{
    let full_scale = FULL_SCALE as f64;
    (0..=FULL_SCALE)
        .map(|level| quantize(curve(level as f64 / full_scale)))
        .collect()
}

/// Replace every colour sample through `lut`.
fn apply_lut(buffer: &mut PixelBuffer, lut: &[u16]) {
    let color_channels = buffer.layout().color_channels();
    let channels = buffer.channels();
    for_each_pixel_mut(buffer.samples_mut(), channels, |pixel| {
        for v in pixel.iter_mut().take(color_channels) {
            *v = lut[*v as usize];
        }
    });
}

fn require_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{} must be finite, got {}",
            name, value
        )))
    }
}

#[inline]
fn sigmoid(strength: f64, midpoint: f64, x: f64) -> f64 {
    1.0 / (1.0 + (strength * (midpoint - x)).exp())
}

/// S-shaped contrast curve around `midpoint`, rescaled so 0 and 1 are fixed.
pub fn sigmoidal_contrast(buffer: &mut PixelBuffer, strength: f64, midpoint: f64) -> Result<()> {
    require_finite("sigmoidal strength", strength)?;
    require_finite("sigmoidal midpoint", midpoint)?;

    if strength.abs() < SIGMOIDAL_IDENTITY_STRENGTH {
        return Ok(());
    }

    let sig_0 = sigmoid(strength, midpoint, 0.0);
    let sig_1 = sigmoid(strength, midpoint, 1.0);
    let range = sig_1 - sig_0;
    if !range.is_finite() || range.abs() < f64::EPSILON {
        tracing::debug!(strength, midpoint, "sigmoidal curve is flat over [0, 1], skipping");
        return Ok(());
    }

    let lut = build_lut(|x| (sigmoid(strength, midpoint, x) - sig_0) / range);
    apply_lut(buffer, &lut);
    Ok(())
}

/// Multiply every colour sample by `factor`, clamping at full scale.
pub fn evaluate_multiply(buffer: &mut PixelBuffer, factor: f64) -> Result<()> {
    require_finite("evaluate factor", factor)?;
    if factor < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "evaluate factor must be non-negative, got {}",
            factor
        )));
    }

    let lut = build_lut(|x| x * factor);
    apply_lut(buffer, &lut);
    Ok(())
}

/// First level at which the cumulative count reaches `fraction` of `total`.
fn percentile_level(combined: &[u64], total: u64, fraction: f64) -> u16 {
    let target = fraction * total as f64;
    let mut cumulative = 0u64;
    for (level, &count) in combined.iter().enumerate() {
        cumulative += count;
        if cumulative > 0 && cumulative as f64 >= target {
            return level as u16;
        }
    }
    FULL_SCALE
}

/// Stretch the combined-channel range between the 2% and 99% points to full scale.
pub fn normalize(buffer: &mut PixelBuffer) -> Result<()> {
    let histogram = HistogramBuilder::for_buffer(buffer).build(buffer)?;
    let combined = histogram.combined();
    let total: u64 = combined.iter().sum();

    let black = percentile_level(&combined, total, NORMALIZE_BLACK_FRACTION);
    let white = percentile_level(&combined, total, NORMALIZE_WHITE_FRACTION);

    tracing::debug!(black, white, "normalize points");

    if white <= black {
        return Ok(());
    }

    let full_scale = FULL_SCALE as f64;
    let low = black as f64 / full_scale;
    let span = (white - black) as f64 / full_scale;
    let lut = build_lut(|x| (x - low) / span);
    apply_lut(buffer, &lut);
    Ok(())
}

/// Map `[low, high]` (normalised) onto the full range, then apply `1/gamma`.
pub fn level_remap(buffer: &mut PixelBuffer, low: f64, high: f64, gamma: f64) -> Result<()> {
    require_finite("level low", low)?;
    require_finite("level high", high)?;
    require_finite("level gamma", gamma)?;

    if high <= low {
        return Err(Error::InvalidParameter(format!(
            "level high ({}) must exceed level low ({})",
            high, low
        )));
    }
    if gamma <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "level gamma must be positive, got {}",
            gamma
        )));
    }

    let span = high - low;
    let exponent = 1.0 / gamma;
    let lut = build_lut(|x| ((x - low) / span).clamp(0.0, 1.0).powf(exponent));
    apply_lut(buffer, &lut);
    Ok(())
}

/// Raise every colour sample to `1/gamma`.
pub fn gamma(buffer: &mut PixelBuffer, value: f64) -> Result<()> {
    require_finite("gamma", value)?;
    if value <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "gamma must be positive, got {}",
            value
        )));
    }

    let exponent = 1.0 / value;
    let lut = build_lut(|x| x.powf(exponent));
    apply_lut(buffer, &lut);
    Ok(())
}

/// Sinusoidal contrast step. `sharpen` increases contrast, otherwise it is reduced.
pub fn contrast_enhance(buffer: &mut PixelBuffer, sharpen: bool) {
    let sign = if sharpen { 1.0 } else { -1.0 };
    let lut = build_lut(|x| {
        let curve = 0.5 * ((PI * (x - 0.5)).sin() + 1.0);
        x + sign * 0.5 * (curve - x)
    });
    apply_lut(buffer, &lut);
}

/// Invert every colour sample.
pub fn negate(buffer: &mut PixelBuffer) {
    let color_channels = buffer.layout().color_channels();
    let channels = buffer.channels();
    for_each_pixel_mut(buffer.samples_mut(), channels, |pixel| {
        for v in pixel.iter_mut().take(color_channels) {
            *v = FULL_SCALE - *v;
        }
    });
}
