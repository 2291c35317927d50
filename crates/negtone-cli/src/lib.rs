//! Shared utilities for negtone-cli
//!
//! Argument definitions, option parsers and the conversion driver used by
//! the `negtone` binary.

pub mod args;
pub mod parsers;
pub mod processing;

// Re-export commonly used items at the crate root for convenience
pub use args::Cli;
pub use parsers::{parse_sigmoidal, parse_white_balance};
pub use processing::{apply_overrides, build_config, determine_output_path, resolve_input, run};
