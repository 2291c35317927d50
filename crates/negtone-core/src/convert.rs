//! File-to-file conversion
//!
//! Glue between decoders, the tone pipeline and the output codecs: raw
//! captures go through the two-pass entry point, PNG and TIFF through the
//! direct one.

use std::path::Path;

use crate::config::PipelineConfig;
use crate::decoders::{decode_image, is_raw_path, LibRawDecoder, RawDecoder};
use crate::error::Result;
use crate::exporters::codec_for_path;
use crate::filters::NativeFilters;
use crate::pipeline::{AdaptiveTonePipeline, ToneReport};

/// Convert `input` to `output` with the built-in filters and LibRaw.
pub fn convert_file(input: &Path, output: &Path, config: &PipelineConfig) -> Result<ToneReport> {
    convert_file_with(&LibRawDecoder, input, output, config)
}

/// Convert `input` to `output`, decoding raw captures with `decoder`.
pub fn convert_file_with<D: RawDecoder + ?Sized>(
    decoder: &D,
    input: &Path,
    output: &Path,
    config: &PipelineConfig,
) -> Result<ToneReport> {
    config.validate()?;

    // Fail on an unusable output path before spending time on the image
    let codec = codec_for_path(output)?;
    let pipeline = AdaptiveTonePipeline::new(config.tone.clone(), NativeFilters)?;

    tracing::info!(input = %input.display(), "converting");
    let outcome = if is_raw_path(input) {
        pipeline.run_raw(decoder, input, &config.raw)?
    } else {
        pipeline.run_image(decode_image(input)?)?
    };

    tracing::info!(
        decision = ?outcome.report.decision,
        brightness = ?outcome.report.brightness_percent,
        "tone pipeline finished"
    );

    codec.write(&outcome.buffer, output)?;
    Ok(outcome.report)
}
