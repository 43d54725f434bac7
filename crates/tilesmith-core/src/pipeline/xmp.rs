//! XMP packet discovery and a loosely-typed view of its contents.
//!
//! For JPEG the packet lives in an APP1 segment that starts with the Adobe
//! XMP namespace header. Every other container (PNG iTXt, TIFF tag 700, WebP
//! XMP chunk) stores it uncompressed, so a scan for the `x:xmpmeta` element is
//! enough there.
//!
//! The parsed packet is a [`MetaValue`] tree keyed by XML local names:
//! attributes become keys, repeated child elements become a list, and a leaf
//! element becomes text.

use std::collections::BTreeMap;

use roxmltree::{Document, Node};
use thiserror::Error;

const XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const XMP_OPEN: &[u8] = b"<x:xmpmeta";
const XMP_CLOSE: &[u8] = b"</x:xmpmeta>";

/// A node of a parsed XMP packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Text(String),
    List(Vec<MetaValue>),
    Map(BTreeMap<String, MetaValue>),
}

impl MetaValue {
    /// Look up a key; `None` unless this is a map containing it.
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        match self {
            MetaValue::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Follow a chain of keys, stopping with `None` at the first miss.
    pub fn path(&self, keys: &[&str]) -> Option<&MetaValue> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, MetaValue>> {
        match self {
            MetaValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// View this node as a list. A single element is a one-item list, since
    /// XMP writers do not emit a list wrapper for one repeated child.
    pub fn as_list(&self) -> Vec<&MetaValue> {
        match self {
            MetaValue::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }
}

/// Why a packet could not be turned into a tree.
#[derive(Error, Debug)]
pub enum XmpError {
    #[error("XMP packet is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("XMP packet is not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Find the raw XMP packet in an encoded image file.
pub fn find_packet(data: &[u8]) -> Option<&[u8]> {
    if data.starts_with(&[0xFF, 0xD8]) {
        if let Some(packet) = find_jpeg_app1_xmp(data) {
            return Some(packet);
        }
    }
    scan_for_xmpmeta(data)
}

/// Walk JPEG marker segments up to the start of scan, returning the payload
/// of the first APP1 segment carrying XMP.
fn find_jpeg_app1_xmp(data: &[u8]) -> Option<&[u8]> {
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // Fill bytes between segments.
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // SOS or EOI: no more metadata segments.
        if marker == 0xDA || marker == 0xD9 {
            return None;
        }

        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if length < 2 || pos + 2 + length > data.len() {
            return None;
        }
        let segment = &data[pos + 4..pos + 2 + length];
        if marker == 0xE1 && segment.starts_with(XMP_HEADER) {
            return Some(&segment[XMP_HEADER.len()..]);
        }
        pos += 2 + length;
    }
    None
}

fn scan_for_xmpmeta(data: &[u8]) -> Option<&[u8]> {
    let start = find_subslice(data, XMP_OPEN)?;
    let end = find_subslice(&data[start..], XMP_CLOSE)? + start + XMP_CLOSE.len();
    Some(&data[start..end])
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Parse a raw packet into a tree rooted at a map holding the document element.
pub fn parse_packet(packet: &[u8]) -> Result<MetaValue, XmpError> {
    let text = std::str::from_utf8(packet)?;
    // Packet wrappers (`<?xpacket ...?>`) are processing instructions that
    // roxmltree skips, but a trailing NUL or padding after them is common.
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    let doc = Document::parse(text)?;

    let root = doc.root_element();
    let mut map = BTreeMap::new();
    map.insert(root.tag_name().name().to_string(), element_to_value(root));
    Ok(MetaValue::Map(map))
}

fn element_to_value(node: Node<'_, '_>) -> MetaValue {
    let mut map: BTreeMap<String, MetaValue> = BTreeMap::new();

    for attr in node.attributes() {
        map.insert(
            attr.name().to_string(),
            MetaValue::Text(attr.value().to_string()),
        );
    }

    let mut has_children = false;
    for child in node.children().filter(|c| c.is_element()) {
        has_children = true;
        let key = child.tag_name().name().to_string();
        let value = element_to_value(child);
        let merged = match map.remove(&key) {
            None => value,
            Some(MetaValue::List(mut items)) => {
                items.push(value);
                MetaValue::List(items)
            }
            Some(existing) => MetaValue::List(vec![existing, value]),
        };
        map.insert(key, merged);
    }

    let text = node.text().map(str::trim).unwrap_or("").to_string();
    if has_children {
        MetaValue::Map(map)
    } else if map.is_empty() {
        MetaValue::Text(text)
    } else {
        if !text.is_empty() {
            map.insert("text".to_string(), MetaValue::Text(text));
        }
        MetaValue::Map(map)
    }
}
