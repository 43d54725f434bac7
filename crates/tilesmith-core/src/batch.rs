//! Batch orchestration: runs many files through the pipeline, applies the
//! error policy, and writes the tag and image indexes at the end.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::index::{IndexEmitter, TagAggregator};
use crate::output::SidecarWriter;
use crate::pipeline::processor::image_stem;
use crate::pipeline::{DiscoveredFile, ImageProcessor};
use crate::types::{BatchIndexes, ProcessedImage, ProcessingStats};

/// What happened to one file of a batch.
#[derive(Debug)]
pub enum FileOutcome {
    /// The file was processed and its outputs written
    Processed(Box<ProcessedImage>),
    /// An existing sidecar was reused
    Reused(Box<ProcessedImage>),
    /// The file failed and the batch carries on without it
    Failed(PipelineError),
}

/// Result of a finished batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub indexes: BatchIndexes,
    pub stats: ProcessingStats,
}

/// Runs a batch of files and collects what the indexes need.
///
/// Files are processed strictly one after another, in the order given. Each
/// file stem owns one output directory per run: a later file with a stem that
/// is already taken fails with [`PipelineError::StemCollision`].
pub struct BatchRunner {
    processor: ImageProcessor,
    emitter: IndexEmitter,
    aggregator: TagAggregator,
    image_dirs: Vec<String>,
    claimed_stems: HashMap<String, PathBuf>,
    stats: ProcessingStats,
    output_root: PathBuf,
    canonical_root: PathBuf,
    ignore_errors: bool,
}

impl BatchRunner {
    /// Create a runner writing under `output_root`, creating it if needed.
    pub fn new(config: &Config, output_root: &Path) -> PipelineResult<Self> {
        std::fs::create_dir_all(output_root).map_err(|source| PipelineError::OutputRoot {
            path: output_root.to_path_buf(),
            source,
        })?;

        let writer = SidecarWriter::new(config.sidecar_format(), config.output.pretty);
        let ignore_errors = config.processing.ignore_errors;
        let canonical_root = output_root
            .canonicalize()
            .unwrap_or_else(|_| output_root.to_path_buf());

        Ok(Self {
            processor: ImageProcessor::new(config, output_root),
            emitter: IndexEmitter::new(output_root, writer, ignore_errors),
            aggregator: TagAggregator::new(),
            image_dirs: Vec::new(),
            claimed_stems: HashMap::new(),
            stats: ProcessingStats::default(),
            output_root: output_root.to_path_buf(),
            canonical_root,
            ignore_errors,
        })
    }

    /// Discover input files under `path`, leaving out anything under the
    /// output root.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        let mut files = self.processor.discover(path);
        let found = files.len();
        files.retain(|file| !self.is_output(&file.path));
        if files.len() < found {
            tracing::debug!(
                "Ignoring {} files under the output root {:?}",
                found - files.len(),
                self.output_root
            );
        }
        files
    }

    fn is_output(&self, path: &Path) -> bool {
        path.canonicalize()
            .map(|path| path.starts_with(&self.canonical_root))
            .unwrap_or(false)
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// Process one file and fold its tags and directory into the batch.
    ///
    /// With `ignore_errors` a failure is logged and returned as
    /// [`FileOutcome::Failed`]; otherwise it is returned as `Err` and the
    /// caller must stop.
    pub fn process_file(&mut self, file: &DiscoveredFile) -> PipelineResult<FileOutcome> {
        let result = self
            .claim_stem(&file.path)
            .and_then(|()| self.processor.process(&file.path));
        match result {
            Ok(processed) => {
                self.aggregator
                    .record_image(&processed.stem, &processed.sidecar.tags);
                self.image_dirs.push(processed.output_dir.clone());

                if processed.reused {
                    self.stats.skipped += 1;
                    Ok(FileOutcome::Reused(Box::new(processed)))
                } else {
                    self.stats.succeeded += 1;
                    self.stats.total_bytes += file.size;
                    self.stats.tiles_written += processed
                        .sidecar
                        .tiles
                        .iter()
                        .map(|row| row.len() as u64)
                        .sum::<u64>();
                    Ok(FileOutcome::Processed(Box::new(processed)))
                }
            }
            Err(e) => {
                self.stats.failed += 1;
                if self.ignore_errors {
                    tracing::error!("Failed: {:?} - {}", file.path, e);
                    Ok(FileOutcome::Failed(e))
                } else {
                    tracing::error!("Stopping batch at {:?}: {}", file.path, e);
                    Err(e)
                }
            }
        }
    }

    /// Reserve the output directory of `path` for the rest of the run. The
    /// stem stays claimed even if processing then fails.
    fn claim_stem(&mut self, path: &Path) -> PipelineResult<()> {
        let stem = image_stem(path);
        if let Some(first) = self.claimed_stems.get(&stem) {
            return Err(PipelineError::StemCollision {
                path: path.to_path_buf(),
                first: first.clone(),
                stem,
            });
        }
        self.claimed_stems.insert(stem, path.to_path_buf());
        Ok(())
    }

    /// Write the tag sidecars and both indexes.
    pub fn finish(self) -> PipelineResult<BatchReport> {
        let indexes = self
            .emitter
            .emit(&self.aggregator.snapshot(), &self.image_dirs)?;
        Ok(BatchReport {
            indexes,
            stats: self.stats,
        })
    }

    /// Process every file in order, then write the indexes.
    ///
    /// `on_file` runs after each file, whatever its outcome.
    pub fn run<F>(mut self, files: &[DiscoveredFile], mut on_file: F) -> PipelineResult<BatchReport>
    where
        F: FnMut(&DiscoveredFile, &FileOutcome),
    {
        for file in files {
            let outcome = self.process_file(file)?;
            on_file(file, &outcome);
        }
        self.finish()
    }
}
