//! Tag, description and capture-date extraction from embedded XMP.
//!
//! Nothing in here fails: a missing packet, malformed XML or an unparseable
//! date all come back as "no tags / no value", with a warning logged.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

use super::decode::DecodedImage;
use super::xmp::{self, MetaValue};
use crate::types::ImageMetadata;

/// Keys holding a creation timestamp, most specific first.
const DATE_KEYS: &[&str] = &["DateCreated", "CreateDate", "DateTimeOriginal", "ModifyDate"];

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y:%m:%d %H:%M:%S%.f%:z",
    "%Y:%m:%d %H:%M:%S%.f%z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y:%m:%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y:%m:%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Extracts tags, description and creation date from an image's XMP block.
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Extract all three fields, parsing the XMP packet once.
    pub fn extract(image: &DecodedImage) -> ImageMetadata {
        let Some(block) = Self::merged_block(image) else {
            return ImageMetadata::default();
        };

        let metadata = ImageMetadata {
            tags: Self::tags_from(&block, &image.path),
            description: Self::description_from(&block, &image.path),
            date: Self::date_from(&block, &image.path),
        };
        tracing::debug!(
            "Extracted {} tags from {:?}: {:?}",
            metadata.tags.len(),
            image.path,
            metadata.tags
        );
        metadata
    }

    /// Subject keywords that look like words (see [`Self::is_tag`]).
    pub fn extract_tags(image: &DecodedImage) -> Vec<String> {
        Self::merged_block(image)
            .map(|block| Self::tags_from(&block, &image.path))
            .unwrap_or_default()
    }

    /// First alternative-language value of the description field.
    pub fn extract_description(image: &DecodedImage) -> Option<String> {
        Self::merged_block(image).and_then(|block| Self::description_from(&block, &image.path))
    }

    /// Creation timestamp, parsed permissively.
    pub fn extract_date(image: &DecodedImage) -> Option<DateTime<FixedOffset>> {
        Self::merged_block(image).and_then(|block| Self::date_from(&block, &image.path))
    }

    /// Accept entries that start with an ASCII letter followed by at least
    /// one more character.
    pub fn is_tag(candidate: &str) -> bool {
        let mut chars = candidate.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic()) && chars.next().is_some()
    }

    /// Merge every `rdf:Description` block left to right; later keys win.
    pub fn merge_blocks(tree: &MetaValue) -> Option<BTreeMap<String, MetaValue>> {
        let blocks = tree.path(&["xmpmeta", "RDF", "Description"])?;
        let maps: Vec<_> = blocks
            .as_list()
            .into_iter()
            .filter_map(MetaValue::as_map)
            .collect();
        if maps.is_empty() {
            return None;
        }

        Some(maps.into_iter().fold(BTreeMap::new(), |mut merged, block| {
            merged.extend(block.iter().map(|(k, v)| (k.clone(), v.clone())));
            merged
        }))
    }

    fn merged_block(image: &DecodedImage) -> Option<MetaValue> {
        let Some(packet) = image.metadata_block() else {
            tracing::warn!("No XMP metadata in {:?}", image.path);
            return None;
        };

        let tree = match xmp::parse_packet(packet) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!("Ignoring XMP metadata in {:?}: {}", image.path, e);
                return None;
            }
        };

        match Self::merge_blocks(&tree) {
            Some(block) => Some(MetaValue::Map(block)),
            None => {
                tracing::warn!("XMP metadata in {:?} has no rdf:Description block", image.path);
                None
            }
        }
    }

    fn tags_from(block: &MetaValue, path: &Path) -> Vec<String> {
        let Some(items) = block.path(&["subject", "Bag", "li"]) else {
            tracing::warn!("No subject keywords in {:?}; assuming there are no tags", path);
            return Vec::new();
        };

        items
            .as_list()
            .into_iter()
            .filter_map(MetaValue::as_text)
            .filter(|subject| Self::is_tag(subject))
            .map(str::to_string)
            .collect()
    }

    fn description_from(block: &MetaValue, path: &Path) -> Option<String> {
        let first = block
            .path(&["description", "Alt", "li"])
            .and_then(|alt| alt.as_list().into_iter().next());

        let text = match first {
            Some(MetaValue::Text(text)) => Some(text.as_str()),
            Some(item) => item.get("text").and_then(MetaValue::as_text),
            None => None,
        };

        if text.is_none() {
            tracing::warn!("No description in {:?}", path);
        }
        text.map(str::to_string)
    }

    fn date_from(block: &MetaValue, path: &Path) -> Option<DateTime<FixedOffset>> {
        let Some(raw) = DATE_KEYS
            .iter()
            .find_map(|key| block.get(key).and_then(MetaValue::as_text))
        else {
            tracing::warn!("No creation date in {:?}", path);
            return None;
        };

        let parsed = parse_date(raw);
        if parsed.is_none() {
            tracing::warn!("Unrecognized date '{}' in {:?}", raw, path);
        }
        parsed
    }
}

/// Parse a date or timestamp in any of the common text notations.
///
/// Values without an offset are taken to be UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }

    let zulu;
    let text = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(stripped) => {
            zulu = format!("{stripped}+00:00");
            zulu.as_str()
        }
        None => raw,
    };

    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
    {
        return Some(parsed);
    }

    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| parse_naive_date(text).and_then(|date| date.and_hms_opt(0, 0, 0)))?;

    FixedOffset::east_opt(0).map(|utc| utc.from_utc_datetime(&naive))
}

fn parse_naive_date(text: &str) -> Option<NaiveDate> {
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Some(date);
    }

    // Reduced precision: "YYYY-MM" and "YYYY".
    let mut parts = text.splitn(2, ['-', ':', '/']);
    let year: i32 = parts.next()?.parse().ok()?;
    if text.len() == 4 {
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    let month: u32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}
