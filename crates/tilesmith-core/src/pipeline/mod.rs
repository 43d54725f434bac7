//! Image processing pipeline components.
//!
//! The stages a single file passes through:
//! - **decode**: Load and decode images, locating any embedded XMP packet
//! - **xmp**: Parse XMP packets into a navigable value tree
//! - **metadata**: Pull tags, description and capture date out of that tree
//! - **thumbnail**: Bounded, aspect-preserving resizing
//! - **partition**: Split an image's extent into a grid of tile rectangles
//! - **tiles**: Encode tiles under content-addressed names
//! - **hash**: SHA-1 content hashing
//! - **discovery**: Find image files in directories
//! - **processor**: Orchestrates the full per-image pipeline

pub mod decode;
pub mod discovery;
pub mod hash;
pub mod metadata;
pub mod partition;
pub mod processor;
pub mod thumbnail;
pub mod tiles;
pub mod xmp;

pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use hash::Hasher;
pub use metadata::MetadataExtractor;
pub use partition::partition;
pub use processor::{ImageProcessor, JobStage};
pub use thumbnail::ThumbnailGenerator;
pub use tiles::TileWriter;
pub use xmp::MetaValue;
