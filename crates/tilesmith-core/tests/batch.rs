//! End-to-end batch runs over generated images with embedded XMP.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tilesmith_core::{
    BatchRunner, Config, FileOutcome, ImageSidecar, SidecarFormat, SidecarWriter, TagSidecar,
};

const XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

fn packet(subjects: &[&str], description: &str, date: &str) -> String {
    let items: String = subjects
        .iter()
        .map(|s| format!("<rdf:li>{s}</rdf:li>"))
        .collect();
    format!(
        r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about="" xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:xmp="http://ns.adobe.com/xap/1.0/">
   <dc:subject><rdf:Bag>{items}</rdf:Bag></dc:subject>
   <dc:description><rdf:Alt><rdf:li xml:lang="x-default">{description}</rdf:li></rdf:Alt></dc:description>
   <xmp:CreateDate>{date}</xmp:CreateDate>
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>"#
    )
}

/// Encode a JPEG and splice an XMP APP1 segment in right after SOI.
fn write_jpeg_with_xmp(path: &Path, width: u32, height: u32, xmp: &str) {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }));
    let mut encoded = Cursor::new(Vec::new());
    image.write_to(&mut encoded, ImageFormat::Jpeg).unwrap();
    let encoded = encoded.into_inner();

    let payload_len = XMP_HEADER.len() + xmp.len();
    let segment_len = u16::try_from(payload_len + 2).unwrap();
    let mut bytes = Vec::with_capacity(encoded.len() + payload_len + 4);
    bytes.extend_from_slice(&encoded[..2]);
    bytes.extend_from_slice(&[0xFF, 0xE1]);
    bytes.extend_from_slice(&segment_len.to_be_bytes());
    bytes.extend_from_slice(XMP_HEADER);
    bytes.extend_from_slice(xmp.as_bytes());
    bytes.extend_from_slice(&encoded[2..]);
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn test_batch_builds_tag_and_image_indexes() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    write_jpeg_with_xmp(
        &input.path().join("a.jpg"),
        600,
        400,
        &packet(&["Ocean", "42", "Mountain"], "Waves at dusk", "2021-06-01T10:20:30+02:00"),
    );
    write_jpeg_with_xmp(
        &input.path().join("b.jpg"),
        300,
        300,
        &packet(&["Ocean"], "Quiet bay", "2020:01:02 03:04:05"),
    );
    // No metadata at all: processed, contributes no tags.
    RgbImage::new(64, 64)
        .save(input.path().join("c.png"))
        .unwrap();

    let config = Config::default();
    let runner = BatchRunner::new(&config, out.path()).unwrap();
    let files = runner.discover(input.path());
    assert_eq!(files.len(), 3);

    let mut processed = 0;
    let report = runner
        .run(&files, |_, outcome| {
            if matches!(outcome, FileOutcome::Processed(_)) {
                processed += 1;
            }
        })
        .unwrap();
    assert_eq!(processed, 3);
    assert_eq!(report.stats.failed, 0);

    let yaml = SidecarWriter::new(SidecarFormat::Yaml, true);

    let a: ImageSidecar = yaml
        .read(&out.path().join("images/a/a.yaml"))
        .unwrap();
    assert_eq!(a.tags, vec!["Ocean".to_string(), "Mountain".to_string()]);
    assert_eq!(a.description.as_deref(), Some("Waves at dusk"));
    assert_eq!(a.date.map(|d| d.to_rfc3339()).as_deref(), Some("2021-06-01T10:20:30+02:00"));
    assert_eq!((a.width, a.height, a.columns, a.rows), (600, 400, 3, 2));
    for name in a.tiles.iter().flatten() {
        assert!(out.path().join("images/a/tiles").join(name).is_file());
    }
    assert!(out.path().join("images/a/thumbnail.jpg").is_file());

    let c: ImageSidecar = yaml
        .read(&out.path().join("images/c/c.yaml"))
        .unwrap();
    assert!(c.tags.is_empty());
    assert!(c.description.is_none());
    assert!(c.date.is_none());

    let ocean: TagSidecar = yaml.read(&out.path().join("tags/Ocean.yaml")).unwrap();
    assert_eq!(ocean.images, vec!["a".to_string(), "b".to_string()]);

    let tag_index: BTreeMap<String, String> = yaml.read(&out.path().join("tags.yaml")).unwrap();
    assert_eq!(tag_index.len(), 2);
    assert_eq!(tag_index["Mountain"], "tags/Mountain.yaml");

    let image_index: Vec<String> = yaml.read(&out.path().join("images.yaml")).unwrap();
    assert_eq!(image_index, vec!["images/a", "images/b", "images/c"]);
}

#[test]
fn test_rerun_produces_identical_outputs() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_jpeg_with_xmp(
        &input.path().join("scene.jpg"),
        520,
        260,
        &packet(&["Forest"], "Pines", "2019-05-05"),
    );

    let mut config = Config::default();
    config.output.format = "json".to_string();

    let run = || {
        let runner = BatchRunner::new(&config, out.path()).unwrap();
        let files = runner.discover(input.path());
        runner.run(&files, |_, _| {}).unwrap()
    };

    let first = run();
    let tags_first = std::fs::read(out.path().join("tags.json")).unwrap();
    let sidecar_first = std::fs::read(out.path().join("images/scene/scene.json")).unwrap();

    let second = run();
    assert_eq!(first.indexes, second.indexes);
    assert_eq!(std::fs::read(out.path().join("tags.json")).unwrap(), tags_first);
    assert_eq!(
        std::fs::read(out.path().join("images/scene/scene.json")).unwrap(),
        sidecar_first
    );
}
