//! CLI enum types for the process command.

use clap::ValueEnum;

/// Sidecar file formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SidecarFormatArg {
    /// YAML documents (`.yaml`)
    Yaml,
    /// JSON documents (`.json`)
    Json,
}

impl std::fmt::Display for SidecarFormatArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SidecarFormatArg::Yaml => write!(f, "yaml"),
            SidecarFormatArg::Json => write!(f, "json"),
        }
    }
}
