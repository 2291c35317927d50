//! Adaptive tone pipeline
//!
//! Turns a decoded negative into a positive by alternating measurements and
//! filter stages:
//!
//! - raw entry only: uncorrected decode, exposure estimation, corrected decode
//!   and per-channel clip normalisation
//! - base tone transforms (white balance, sigmoidal contrast, saturation/hue,
//!   evaluate + normalise, sharpening)
//! - post-transform probe deciding between fine adjustment and a plain
//!   optional negation
//! - colour finalisation
//!
//! Every run is single-threaded stage to stage and deterministic; the same
//! input and parameters always produce the same bytes.

mod state;


pub use state::{
    FineAdjustDecision, PipelineState, FINE_ADJUST_MEAN_RANGE, FINE_ADJUST_MIN_STDDEV,
};

use std::path::Path;

use serde::Serialize;

use crate::auto_adjust::{
    normalize_to_ceilings, ClipCeiling, ExposureEstimator, ExposureShift, HistogramBuilder,
    LumaContrastProbe, LumaStats,
};
use crate::buffer::PixelBuffer;
use crate::decoders::{DecodeParams, RawDecoder};
use crate::error::Result;
use crate::filters::{ImageFilterLibrary, NativeFilters};
use crate::models::{RawParameters, ToneParameters};
use state::StateTrace;

/// Measurements and decisions made during one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToneReport {
    /// Luma statistics of the pipeline input
    pub pre_transform: LumaStats,
    /// Luma statistics after the base tone transforms, before any negation
    pub post_transform: LumaStats,
    /// Branch taken after the post-transform probe
    pub decision: FineAdjustDecision,
    /// Statistics the brightness modulation was computed from (fine adjustment only)
    pub fine_adjust_stats: Option<LumaStats>,
    /// Brightness percentage applied (fine adjustment only)
    pub brightness_percent: Option<f64>,
    /// Mean luminance of the uncorrected raw decode
    pub first_pass_luminance: Option<f64>,
    /// Exposure correction used for the second raw decode
    pub exposure_shift: Option<ExposureShift>,
    /// Per-channel ceilings the corrected raw decode was normalised to
    pub clip_ceiling: Option<ClipCeiling>,
    /// Visited states, in order
    pub states: Vec<PipelineState>,
}

/// Final buffer and the report describing how it was produced
#[derive(Debug, Clone)]
pub struct ToneOutcome {
    pub buffer: PixelBuffer,
    pub report: ToneReport,
}

/// Raw-path measurements carried into the report
#[derive(Debug, Clone, Copy, Default)]
struct RawPassInfo {
    first_pass_luminance: Option<f64>,
    exposure_shift: Option<ExposureShift>,
    clip_ceiling: Option<ClipCeiling>,
}

/// Orchestrates decoding, measurement and filter stages for one image at a time
#[derive(Debug, Clone)]
pub struct AdaptiveTonePipeline<F = NativeFilters> {
    params: ToneParameters,
    filters: F,
}

impl AdaptiveTonePipeline<NativeFilters> {
    /// Pipeline using the built-in filters.
    pub fn native(params: ToneParameters) -> Result<Self> {
        Self::new(params, NativeFilters)
    }
}

impl<F: ImageFilterLibrary> AdaptiveTonePipeline<F> {
    /// Validate `params` and build a pipeline around `filters`.
    pub fn new(params: ToneParameters, filters: F) -> Result<Self> {
        params.validate()?;
        Ok(Self { params, filters })
    }

    pub fn params(&self) -> &ToneParameters {
        &self.params
    }

    pub fn filters(&self) -> &F {
        &self.filters
    }

    /// Direct entry point: run the tone stages on an already decoded buffer.
    pub fn run_image(&self, buffer: PixelBuffer) -> Result<ToneOutcome> {
        self.run_tone(buffer, StateTrace::default(), RawPassInfo::default())
    }

    /// Raw entry point: two-pass decode of `path`, then the tone stages.
    pub fn run_raw<D: RawDecoder + ?Sized>(
        &self,
        decoder: &D,
        path: &Path,
        raw_params: &RawParameters,
    ) -> Result<ToneOutcome> {
        raw_params.validate()?;
        let mut trace = StateTrace::default();

        trace.enter(PipelineState::RawDecodeFirstPass);
        let first = decoder.decode(path, &DecodeParams::uncorrected())?;

        trace.enter(PipelineState::ExposureEstimation);
        let first_pass_luminance = ExposureEstimator::measured_luminance(&first);
        let shift = raw_params.exposure_estimator().estimate(&first);
        tracing::debug!(
            luminance = first_pass_luminance,
            target = raw_params.target_luminance,
            stops = shift.stops(),
            "exposure estimated"
        );
        drop(first);

        trace.enter(PipelineState::RawDecodeSecondPass);
        let mut buffer = decoder.decode(path, &DecodeParams::corrected(shift))?;

        let clip_ceiling = if raw_params.clip.enabled {
            let histogram = HistogramBuilder::for_buffer(&buffer).build(&buffer)?;
            let estimator = raw_params.clip.estimator_for(&histogram);
            let ceiling = estimator.estimate(&histogram);
            tracing::debug!(
                percentile = estimator.percentile,
                ceiling = ?ceiling.0,
                "clip ceilings"
            );
            normalize_to_ceilings(&mut buffer, &ceiling);
            Some(ceiling)
        } else {
            None
        };

        let raw_info = RawPassInfo {
            first_pass_luminance: Some(first_pass_luminance),
            exposure_shift: Some(shift),
            clip_ceiling,
        };
        self.run_tone(buffer, trace, raw_info)
    }

    fn run_tone(
        &self,
        mut buffer: PixelBuffer,
        mut trace: StateTrace,
        raw_info: RawPassInfo,
    ) -> Result<ToneOutcome> {
        let params = &self.params;

        let pre_transform = LumaContrastProbe::measure(&buffer, false);
        tracing::debug!(
            mean = pre_transform.mean,
            std_dev = pre_transform.std_dev,
            "pre-transform luma"
        );

        trace.enter(PipelineState::BaseToneTransforms);
        self.base_tone_transforms(&mut buffer)?;

        // Measured un-negated: negation keeps the std and mirrors the mean
        // about 0.5, and the accepted mean range is symmetric about 0.5
        trace.enter(PipelineState::PostTransformProbe);
        let post_transform = LumaContrastProbe::measure(&buffer, false);
        let decision = FineAdjustDecision::from_stats(&post_transform);
        tracing::debug!(
            mean = post_transform.mean,
            std_dev = post_transform.std_dev,
            ?decision,
            "post-transform luma"
        );

        trace.enter(decision.state());
        let (fine_adjust_stats, brightness_percent) = match decision {
            FineAdjustDecision::Apply => {
                let (stats, brightness) = self.fine_adjust(&mut buffer)?;
                (Some(stats), Some(brightness))
            }
            FineAdjustDecision::Skip => {
                if params.negate {
                    self.filters.negate(&mut buffer)?;
                }
                (None, None)
            }
        };

        trace.enter(PipelineState::ColorFinalization);
        let buffer = self
            .filters
            .convert_color_space(buffer, params.color_mode())?;

        trace.enter(PipelineState::Output);

        Ok(ToneOutcome {
            buffer,
            report: ToneReport {
                pre_transform,
                post_transform,
                decision,
                fine_adjust_stats,
                brightness_percent,
                first_pass_luminance: raw_info.first_pass_luminance,
                exposure_shift: raw_info.exposure_shift,
                clip_ceiling: raw_info.clip_ceiling,
                states: trace.into_states(),
            },
        })
    }

    /// Fixed-order colour and tone stages; each assumes the previous one ran.
    fn base_tone_transforms(&self, buffer: &mut PixelBuffer) -> Result<()> {
        let params = &self.params;
        let filters = &self.filters;

        filters.color_matrix_apply(buffer, &params.white_balance_matrix())?;
        filters.sigmoidal_contrast_apply(
            buffer,
            params.sigmoidal_strength,
            params.sigmoidal_midpoint,
        )?;
        filters.modulate_apply(buffer, 100.0, params.saturation, params.hue)?;
        filters.evaluate_multiply(buffer, params.evaluate_factor)?;
        filters.normalize(buffer)?;
        filters.adaptive_sharpen(buffer, params.sharpen_radius, params.sharpen_sigma)?;
        Ok(())
    }

    /// Negate, level and gamma, then modulate brightness toward the target luma.
    ///
    /// The brightness factor is measured on the levelled image.
    fn fine_adjust(&self, buffer: &mut PixelBuffer) -> Result<(LumaStats, f64)> {
        let params = &self.params;
        let filters = &self.filters;

        if params.negate {
            filters.negate(buffer)?;
        }
        filters.level_remap(buffer, 0.0, params.level_max, params.level_gamma)?;
        filters.gamma_apply(buffer, params.gamma)?;

        let stats = LumaContrastProbe::measure(buffer, false);
        let brightness = params
            .brightness_modulator()
            .modulate(stats.mean, stats.std_dev);
        tracing::debug!(
            mean = stats.mean,
            std_dev = stats.std_dev,
            brightness,
            "fine adjustment"
        );

        filters.modulate_apply(buffer, brightness, 100.0, 100.0)?;
        filters.contrast_enhance(buffer, true)?;
        Ok((stats, brightness))
    }
}
