//! Cross-image tag aggregation and the end-of-batch index files.
//!
//! Layout under the output root:
//!
//! ```text
//! tags.yaml            tag -> tags/<tag>.yaml
//! images.yaml          [images/<stem>, ...] in processing order
//! tags/<tag>.yaml      name, description, images
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::output::SidecarWriter;
use crate::types::{BatchIndexes, TagSidecar};

/// Subdirectory of the output root holding one sidecar per tag.
pub const TAGS_DIR: &str = "tags";
/// Stem of the tag → sidecar index file.
pub const TAG_INDEX_STEM: &str = "tags";
/// Stem of the image directory index file.
pub const IMAGE_INDEX_STEM: &str = "images";

/// Accumulates tag → image stems across a batch.
///
/// Appends are unconditional: recording the same pair twice lists the image
/// twice.
#[derive(Debug, Default, Clone)]
pub struct TagAggregator {
    tags: BTreeMap<String, Vec<String>>,
}

impl TagAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `image_stem` to the list for `tag`.
    pub fn record(&mut self, tag: &str, image_stem: &str) {
        self.tags
            .entry(tag.to_string())
            .or_default()
            .push(image_stem.to_string());
    }

    /// Record `image_stem` under each of `tags`.
    pub fn record_image(&mut self, image_stem: &str, tags: &[String]) {
        for tag in tags {
            self.record(tag, image_stem);
        }
    }

    /// Every tag seen so far with its image stems, in recording order.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.tags.clone()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Writes tag sidecars plus the tag and image indexes.
pub struct IndexEmitter {
    output_root: PathBuf,
    writer: SidecarWriter,
    continue_on_error: bool,
}

impl IndexEmitter {
    pub fn new(output_root: &Path, writer: SidecarWriter, continue_on_error: bool) -> Self {
        Self {
            output_root: output_root.to_path_buf(),
            writer,
            continue_on_error,
        }
    }

    /// Sidecar file name for a tag: spaces and path separators become `_`.
    pub fn tag_file_name(&self, tag: &str) -> String {
        self.writer.file_name(&tag_file_stem(tag))
    }

    /// Like [`Self::tag_file_name`], but never one already in `taken`: a
    /// clash gets the first free `_2`, `_3`, ... suffix.
    fn unique_tag_file_name(&self, tag: &str, taken: &HashSet<String>) -> String {
        let file_name = self.tag_file_name(tag);
        if !taken.contains(&file_name) {
            return file_name;
        }

        let stem = tag_file_stem(tag);
        let mut n = 2;
        loop {
            let candidate = self.writer.file_name(&format!("{stem}_{n}"));
            if !taken.contains(&candidate) {
                tracing::warn!(
                    "Tag '{}' maps to {} like an earlier tag; writing {} instead",
                    tag,
                    file_name,
                    candidate
                );
                return candidate;
            }
            n += 1;
        }
    }

    /// Write every index artifact for the batch.
    ///
    /// A failed tag sidecar aborts the remaining steps unless
    /// `continue_on_error` is set; then the tag is left out of the tag index
    /// and emission carries on. Existing files are overwritten.
    pub fn emit(
        &self,
        tags: &BTreeMap<String, Vec<String>>,
        image_dirs: &[String],
    ) -> PipelineResult<BatchIndexes> {
        let tags_dir = self.output_root.join(TAGS_DIR);
        std::fs::create_dir_all(&tags_dir).map_err(|e| PipelineError::IndexWrite {
            path: tags_dir.clone(),
            message: e.to_string(),
        })?;

        let mut indexes = BatchIndexes {
            tags: BTreeMap::new(),
            images: image_dirs.to_vec(),
        };

        let mut taken = HashSet::new();
        for (tag, images) in tags {
            let file_name = self.unique_tag_file_name(tag, &taken);
            taken.insert(file_name.clone());
            let sidecar = TagSidecar {
                name: tag.clone(),
                description: String::new(),
                images: images.clone(),
            };

            match self.write(&tags_dir.join(&file_name), &sidecar) {
                Ok(()) => {
                    indexes
                        .tags
                        .insert(tag.clone(), format!("{TAGS_DIR}/{file_name}"));
                }
                Err(e) if self.continue_on_error => {
                    tracing::error!("{e}; leaving tag '{tag}' out of the tag index");
                }
                Err(e) => return Err(e),
            }
        }
        tracing::debug!("Wrote {} tag sidecars", indexes.tags.len());

        self.write(&self.tag_index_path(), &indexes.tags)?;
        self.write(&self.image_index_path(), &indexes.images)?;

        tracing::info!(
            "Wrote indexes for {} tags and {} images to {:?}",
            indexes.tags.len(),
            indexes.images.len(),
            self.output_root
        );
        Ok(indexes)
    }

    pub fn tag_index_path(&self) -> PathBuf {
        self.output_root
            .join(self.writer.file_name(TAG_INDEX_STEM))
    }

    pub fn image_index_path(&self) -> PathBuf {
        self.output_root
            .join(self.writer.file_name(IMAGE_INDEX_STEM))
    }

    fn write<T: serde::Serialize>(&self, path: &Path, item: &T) -> PipelineResult<()> {
        self.writer
            .write(path, item)
            .map_err(|e| PipelineError::IndexWrite {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }
}

fn tag_file_stem(tag: &str) -> String {
    tag.chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SidecarFormat;

    fn yaml() -> SidecarWriter {
        SidecarWriter::new(SidecarFormat::Yaml, false)
    }

    #[test]
    fn test_aggregation_follows_processing_order() {
        let mut aggregator = TagAggregator::new();
        aggregator.record_image("A", &["x".to_string(), "y".to_string()]);
        aggregator.record_image("B", &["y".to_string()]);

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["x"], vec!["A".to_string()]);
        assert_eq!(snapshot["y"], vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_record_does_not_deduplicate() {
        let mut aggregator = TagAggregator::new();
        aggregator.record("x", "A");
        aggregator.record("x", "A");
        assert_eq!(aggregator.snapshot()["x"], vec!["A".to_string(), "A".to_string()]);
    }

    #[test]
    fn test_tag_file_name() {
        let emitter = IndexEmitter::new(Path::new("out"), yaml(), false);
        assert_eq!(emitter.tag_file_name("polar bear"), "polar_bear.yaml");
        assert_eq!(emitter.tag_file_name("AC/DC"), "AC_DC.yaml");
    }

    #[test]
    fn test_emit_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut aggregator = TagAggregator::new();
        aggregator.record_image("A", &["polar bear".to_string(), "ice".to_string()]);
        aggregator.record_image("B", &["ice".to_string()]);
        let image_dirs = vec!["images/A".to_string(), "images/B".to_string()];

        let emitter = IndexEmitter::new(dir.path(), yaml(), false);
        let indexes = emitter.emit(&aggregator.snapshot(), &image_dirs).unwrap();

        assert_eq!(indexes.tags["polar bear"], "tags/polar_bear.yaml");
        assert_eq!(indexes.images, image_dirs);

        let sidecar: TagSidecar = yaml()
            .read(&dir.path().join("tags").join("ice.yaml"))
            .unwrap();
        assert_eq!(sidecar.name, "ice");
        assert_eq!(sidecar.images, vec!["A".to_string(), "B".to_string()]);

        let tag_index: BTreeMap<String, String> =
            yaml().read(&dir.path().join("tags.yaml")).unwrap();
        assert_eq!(tag_index, indexes.tags);
        let image_index: Vec<String> = yaml().read(&dir.path().join("images.yaml")).unwrap();
        assert_eq!(image_index, image_dirs);
    }

    #[test]
    fn test_emit_twice_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let mut aggregator = TagAggregator::new();
        aggregator.record_image("A", &["x".to_string(), "y".to_string()]);
        aggregator.record_image("B", &["y".to_string()]);
        let snapshot = aggregator.snapshot();
        let image_dirs = vec!["images/A".to_string(), "images/B".to_string()];

        let emitter = IndexEmitter::new(dir.path(), yaml(), false);
        emitter.emit(&snapshot, &image_dirs).unwrap();
        let tags_first = std::fs::read(emitter.tag_index_path()).unwrap();
        let images_first = std::fs::read(emitter.image_index_path()).unwrap();

        emitter.emit(&snapshot, &image_dirs).unwrap();
        assert_eq!(std::fs::read(emitter.tag_index_path()).unwrap(), tags_first);
        assert_eq!(std::fs::read(emitter.image_index_path()).unwrap(), images_first);
    }

    #[test]
    fn test_failed_tag_sidecar_policy() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the sidecar path makes that one write fail.
        std::fs::create_dir_all(dir.path().join("tags").join("blocked.yaml")).unwrap();

        let mut tags = BTreeMap::new();
        tags.insert("blocked".to_string(), vec!["A".to_string()]);
        tags.insert("fine".to_string(), vec!["A".to_string()]);
        let image_dirs = vec!["images/A".to_string()];

        let strict = IndexEmitter::new(dir.path(), yaml(), false);
        let err = strict.emit(&tags, &image_dirs).unwrap_err();
        assert!(matches!(err, PipelineError::IndexWrite { .. }));
        assert!(!strict.tag_index_path().exists());

        let lenient = IndexEmitter::new(dir.path(), yaml(), true);
        let indexes = lenient.emit(&tags, &image_dirs).unwrap();
        assert!(!indexes.tags.contains_key("blocked"));
        assert!(indexes.tags.contains_key("fine"));
        assert!(lenient.image_index_path().exists());
    }

    #[test]
    fn test_clashing_tag_file_names_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut aggregator = TagAggregator::new();
        aggregator.record_image("A", &["AC/DC".to_string()]);
        aggregator.record_image("B", &["AC_DC".to_string()]);

        let emitter = IndexEmitter::new(dir.path(), yaml(), false);
        let indexes = emitter.emit(&aggregator.snapshot(), &[]).unwrap();

        // "AC/DC" sorts first and keeps the plain name.
        assert_eq!(indexes.tags["AC/DC"], "tags/AC_DC.yaml");
        assert_eq!(indexes.tags["AC_DC"], "tags/AC_DC_2.yaml");

        let first: TagSidecar = yaml().read(&dir.path().join("tags/AC_DC.yaml")).unwrap();
        let second: TagSidecar = yaml().read(&dir.path().join("tags/AC_DC_2.yaml")).unwrap();
        assert_eq!((first.name.as_str(), first.images), ("AC/DC", vec!["A".to_string()]));
        assert_eq!((second.name.as_str(), second.images), ("AC_DC", vec!["B".to_string()]));
    }
}
