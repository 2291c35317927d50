//! Error types for the tone engine and its collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for decoding, processing and encoding.
#[derive(Error, Debug)]
pub enum Error {
    /// Input file does not exist.
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// Raw unpack/process or image decode failed.
    #[error("decode failed: {0}")]
    DecodeFailure(String),

    /// A decoder or filter produced no usable pixel data.
    #[error("invalid buffer: {0}")]
    InvalidBuffer(String),

    /// Output could not be written.
    #[error("encode failed: {0}")]
    EncodeFailure(String),

    /// A tone or raw parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A requested configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for tone engine operations.
pub type Result<T> = std::result::Result<T, Error>;
