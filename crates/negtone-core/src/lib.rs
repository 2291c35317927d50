//! Negtone Core Library
//!
//! Adaptive tone engine for turning photographic negatives into positives:
//! two-pass raw decoding with exposure estimation, a fixed chain of tone
//! filters, and a luma/contrast feedback loop deciding how much fine
//! adjustment an image needs.

pub mod auto_adjust;
pub mod buffer;
pub mod config;
pub mod convert;
pub mod decoders;
pub mod error;
pub mod exporters;
pub mod filters;
pub mod models;
pub mod pipeline;

pub(crate) mod parallel;

// Re-export commonly used types
pub use buffer::{ColorLayout, PixelBuffer, FULL_SCALE};
pub use config::{load_pipeline_config, PipelineConfig, PipelineConfigHandle};
pub use convert::{convert_file, convert_file_with};
pub use decoders::{decode_image, is_raw_path, DecodeParams, LibRawDecoder, RawDecoder};
pub use error::{Error, Result};
pub use exporters::{codec_for_path, write_image, ImageCodec, PngCodec, TiffCodec};
pub use filters::{ColorMode, ImageFilterLibrary, NativeFilters};
pub use models::{RawParameters, ToneParameters};
pub use pipeline::{
    AdaptiveTonePipeline, FineAdjustDecision, PipelineState, ToneOutcome, ToneReport,
};
