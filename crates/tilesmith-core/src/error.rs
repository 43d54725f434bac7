//! Error types for the Tilesmith pipeline.
//!
//! Errors are organized by stage so every message names the offending path
//! and the underlying cause. Missing or malformed embedded metadata is not an
//! error at all; see [`crate::pipeline::metadata`].

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Tilesmith operations.
#[derive(Error, Debug)]
pub enum TilesmithError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A caller passed a value outside the operation's domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Thumbnail could not be resized or saved
    #[error("Thumbnail failed for {path}: {message}")]
    Thumbnail { path: PathBuf, message: String },

    /// Cropping, encoding, hashing or renaming a tile failed
    #[error("Tiling failed for {path}: {message}")]
    Tiling { path: PathBuf, message: String },

    /// The per-image sidecar could not be written
    #[error("Sidecar write failed for {path}: {message}")]
    Sidecar { path: PathBuf, message: String },

    /// A second input shares an earlier input's file stem, and so its output directory
    #[error("{path} has the same stem as {first}; both would write to images/{stem}")]
    StemCollision {
        path: PathBuf,
        first: PathBuf,
        stem: String,
    },

    /// The output root could not be created
    #[error("Cannot create output directory {path}: {source}")]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tag sidecar, the tag index or the image index could not be written
    #[error("Index write failed for {path}: {message}")]
    IndexWrite { path: PathBuf, message: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience type alias for Tilesmith results.
pub type Result<T> = std::result::Result<T, TilesmithError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
