//! Sidecar serialization to YAML or JSON files.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::Path;

/// Sidecar file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidecarFormat {
    Yaml,
    Json,
}

impl SidecarFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// File extension for sidecars in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

/// Writes and reads structured sidecar files.
///
/// Writing to an existing path replaces the file and logs a warning.
#[derive(Debug, Clone, Copy)]
pub struct SidecarWriter {
    format: SidecarFormat,
    pretty: bool,
}

impl SidecarWriter {
    /// Create a new sidecar writer.
    ///
    /// `pretty` only affects JSON; YAML is always block-formatted.
    pub fn new(format: SidecarFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }

    pub fn format(&self) -> SidecarFormat {
        self.format
    }

    /// `<stem>.<ext>` for this writer's format.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.format.extension())
    }

    /// Serialize `item` to a string in this writer's format.
    pub fn to_string<T: Serialize>(&self, item: &T) -> io::Result<String> {
        match self.format {
            SidecarFormat::Yaml => serde_yaml::to_string(item).map_err(io::Error::other),
            SidecarFormat::Json => {
                let mut json = if self.pretty {
                    serde_json::to_string_pretty(item)
                } else {
                    serde_json::to_string(item)
                }
                .map_err(io::Error::other)?;
                json.push('\n');
                Ok(json)
            }
        }
    }

    /// Serialize `item` and write it to `path`, replacing any existing file.
    pub fn write<T: Serialize>(&self, path: &Path, item: &T) -> io::Result<()> {
        let content = self.to_string(item)?;
        if path.exists() {
            tracing::warn!("Overwriting existing file {:?}", path);
        }
        std::fs::write(path, content)
    }

    /// Read a sidecar previously written in this writer's format.
    pub fn read<T: DeserializeOwned>(&self, path: &Path) -> io::Result<T> {
        let content = std::fs::read_to_string(path)?;
        match self.format {
            SidecarFormat::Yaml => serde_yaml::from_str(&content).map_err(io::Error::other),
            SidecarFormat::Json => serde_json::from_str(&content).map_err(io::Error::other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TestItem {
        name: String,
        value: i32,
    }

    #[test]
    fn test_write_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("item.yaml");
        let writer = SidecarWriter::new(SidecarFormat::Yaml, false);

        writer
            .write(
                &path,
                &TestItem {
                    name: "test".to_string(),
                    value: 42,
                },
            )
            .unwrap();

        let output = std::fs::read_to_string(&path).unwrap();
        assert!(output.contains("name: test"));
        assert!(output.contains("value: 42"));
    }

    #[test]
    fn test_write_json_compact() {
        let writer = SidecarWriter::new(SidecarFormat::Json, false);
        let mut map = BTreeMap::new();
        map.insert("b", 2);
        map.insert("a", 1);

        let output = writer.to_string(&map).unwrap();
        assert_eq!(output, "{\"a\":1,\"b\":2}\n");
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.yaml");
        let writer = SidecarWriter::new(SidecarFormat::Yaml, false);

        writer.write(&path, &vec!["a", "b", "c"]).unwrap();
        writer.write(&path, &vec!["z"]).unwrap();

        let back: Vec<String> = writer.read(&path).unwrap();
        assert_eq!(back, vec!["z".to_string()]);
    }

    #[test]
    fn test_read_back_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("item.json");
        let writer = SidecarWriter::new(SidecarFormat::Json, true);
        let item = TestItem {
            name: "round".to_string(),
            value: -1,
        };

        writer.write(&path, &item).unwrap();
        assert_eq!(writer.read::<TestItem>(&path).unwrap(), item);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(SidecarFormat::parse("yaml"), Some(SidecarFormat::Yaml));
        assert_eq!(SidecarFormat::parse("YML"), Some(SidecarFormat::Yaml));
        assert_eq!(SidecarFormat::parse("json"), Some(SidecarFormat::Json));
        assert_eq!(SidecarFormat::parse("toml"), None);
        assert_eq!(SidecarFormat::Yaml.extension(), "yaml");
    }
}
