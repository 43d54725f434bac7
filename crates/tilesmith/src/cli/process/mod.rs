//! The `tilesmith process` command for tiling images.

mod batch;
mod setup;
pub mod types;

pub use types::SidecarFormatArg;

use clap::Args;
use std::path::PathBuf;
use tilesmith_core::Config;

use batch::process_batch;
use setup::setup_runner;

/// Arguments for the `process` command.
///
/// Every option left unset keeps the value from the config file.
#[derive(Args, Debug, Default)]
pub struct ProcessArgs {
    /// Image file or directory to process
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output directory (defaults to `output.dir` from the config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Tile edge length in pixels
    #[arg(short = 's', long)]
    pub tile_size: Option<u32>,

    /// Downscale images so neither edge exceeds this before tiling
    #[arg(long)]
    pub resize_max: Option<u32>,

    /// Thumbnail size in pixels
    #[arg(long)]
    pub thumbnail_size: Option<u32>,

    /// Encode tiles and thumbnails with this extension instead of the source's
    #[arg(long, value_name = "EXT")]
    pub tile_format: Option<String>,

    /// Sidecar format
    #[arg(short, long, value_enum)]
    pub format: Option<SidecarFormatArg>,

    /// Log failing images and keep going instead of stopping the batch
    #[arg(long)]
    pub ignore_errors: bool,

    /// Reuse images whose sidecar already exists
    #[arg(long)]
    pub skip_existing: bool,
}

/// Execute the process command.
pub fn execute(args: ProcessArgs, config: Config) -> anyhow::Result<()> {
    let (runner, config) = setup_runner(&args, config)?;

    let files = runner.discover(&args.input);
    if files.is_empty() {
        tracing::warn!("No supported image files found at {:?}", args.input);
    } else {
        tracing::info!("Found {} image(s) to process", files.len());
    }

    process_batch(runner, &config, files)
}
