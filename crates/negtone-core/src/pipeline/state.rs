//! Pipeline states and the fine-adjust decision

use serde::Serialize;

use crate::auto_adjust::LumaStats;

/// Post-transform mean luma range inside which fine adjustment can be skipped
pub const FINE_ADJUST_MEAN_RANGE: (f64, f64) = (0.30, 0.70);

/// Post-transform luma standard deviation below which an image is too flat
pub const FINE_ADJUST_MIN_STDDEV: f64 = 0.15;

/// Stages of a single pipeline run
///
/// The raw states only occur on the raw entry point; the direct image entry
/// point starts at [`PipelineState::BaseToneTransforms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    RawDecodeFirstPass,
    ExposureEstimation,
    RawDecodeSecondPass,
    BaseToneTransforms,
    PostTransformProbe,
    FineAdjustment,
    SkipFineAdjustment,
    ColorFinalization,
    Output,
}

/// Branch taken after the post-transform probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FineAdjustDecision {
    /// Too dark, too bright or too flat: remap levels and modulate brightness
    Apply,
    /// Already well exposed: only the optional negation runs
    Skip,
}

impl FineAdjustDecision {
    /// Decide from post-transform luma statistics.
    pub fn from_stats(stats: &LumaStats) -> Self {
        let (low, high) = FINE_ADJUST_MEAN_RANGE;
        let out_of_range = stats.mean < low || stats.mean > high;
        let too_flat = stats.std_dev < FINE_ADJUST_MIN_STDDEV;

        if out_of_range || too_flat {
            FineAdjustDecision::Apply
        } else {
            FineAdjustDecision::Skip
        }
    }

    /// State the pipeline enters for this decision.
    pub fn state(self) -> PipelineState {
        match self {
            FineAdjustDecision::Apply => PipelineState::FineAdjustment,
            FineAdjustDecision::Skip => PipelineState::SkipFineAdjustment,
        }
    }
}

/// Ordered record of visited states
#[derive(Debug, Clone, Default)]
pub(crate) struct StateTrace {
    states: Vec<PipelineState>,
}

impl StateTrace {
    pub(crate) fn enter(&mut self, state: PipelineState) {
        tracing::debug!(?state, "entering pipeline state");
        self.states.push(state);
    }

    pub(crate) fn into_states(self) -> Vec<PipelineState> {
        self.states
    }
}
