//! Tilesmith Core - image tiling and metadata library.
//!
//! Tilesmith turns a batch of images into a static, content-addressed tile
//! pyramid base plus YAML/JSON sidecars describing each image and each tag
//! found in the images' embedded XMP metadata.
//!
//! # Architecture
//!
//! ```text
//! Image → Decode → Extract XMP → Thumbnail → (Resize) → Partition → Tiles → Sidecar
//!                                                                          ↓
//!                                         Tag sidecars + tag index + image index
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use tilesmith_core::{BatchRunner, Config};
//!
//! fn main() -> tilesmith_core::Result<()> {
//!     let config = Config::load()?;
//!     let runner = BatchRunner::new(&config, &config.output_root())?;
//!     let files = runner.discover("./photos".as_ref());
//!     let report = runner.run(&files, |_, _| {})?;
//!     println!("Tags: {:?}", report.indexes.tags.keys());
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod index;
pub mod output;
pub mod pipeline;
pub mod types;

pub use batch::{BatchReport, BatchRunner, FileOutcome};
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, Result, TilesmithError};
pub use index::{IndexEmitter, TagAggregator};
pub use output::{SidecarFormat, SidecarWriter};
pub use pipeline::{DiscoveredFile, FileDiscovery, Hasher, ImageProcessor};
pub use types::{
    BatchIndexes, ImageMetadata, ImageSidecar, ProcessedImage, ProcessingStats, TagSidecar,
    TileFileRef, TileGrid, TileRect,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
