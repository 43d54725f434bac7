//! Runner setup: input validation and config overrides.

use tilesmith_core::{BatchRunner, Config};

use super::ProcessArgs;

/// Validate input, fold command-line overrides into the config, and create
/// the batch runner (which creates the output root).
pub fn setup_runner(args: &ProcessArgs, config: Config) -> anyhow::Result<(BatchRunner, Config)> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }

    let config = apply_overrides(args, config)?;
    let output_root = args
        .output
        .clone()
        .unwrap_or_else(|| config.output_root());
    tracing::debug!("Writing output under {:?}", output_root);

    let runner = BatchRunner::new(&config, &output_root)?;
    Ok((runner, config))
}

/// Apply command-line overrides and re-validate the result.
pub fn apply_overrides(args: &ProcessArgs, mut config: Config) -> anyhow::Result<Config> {
    if args.recursive {
        config.processing.recursive = true;
    }
    if args.ignore_errors {
        config.processing.ignore_errors = true;
    }
    if args.skip_existing {
        config.processing.skip_existing = true;
    }
    if let Some(tile_size) = args.tile_size {
        config.tiling.tile_size = tile_size;
    }
    if let Some(resize_max) = args.resize_max {
        config.tiling.resize_max = Some(resize_max);
    }
    if let Some(size) = args.thumbnail_size {
        config.thumbnail.size = size;
    }
    if let Some(ext) = &args.tile_format {
        config.tiling.format = Some(ext.trim_start_matches('.').to_lowercase());
    }
    if let Some(format) = args.format {
        config.output.format = format.to_string();
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::process::SidecarFormatArg;
    use std::path::PathBuf;

    #[test]
    fn overrides_replace_config_values() {
        let args = ProcessArgs {
            recursive: true,
            tile_size: Some(512),
            tile_format: Some(".PNG".to_string()),
            format: Some(SidecarFormatArg::Json),
            ..ProcessArgs::default()
        };
        let config = apply_overrides(&args, Config::default()).unwrap();

        assert!(config.processing.recursive);
        assert_eq!(config.tiling.tile_size, 512);
        assert_eq!(config.tiling.format.as_deref(), Some("png"));
        assert_eq!(config.output.format, "json");
        assert_eq!(config.thumbnail.size, 256);
    }

    #[test]
    fn zero_tile_size_is_rejected() {
        let args = ProcessArgs {
            tile_size: Some(0),
            ..ProcessArgs::default()
        };
        assert!(apply_overrides(&args, Config::default()).is_err());
    }

    #[test]
    fn missing_input_is_rejected() {
        let args = ProcessArgs {
            input: PathBuf::from("/nonexistent/photos"),
            ..ProcessArgs::default()
        };
        let err = setup_runner(&args, Config::default()).err().unwrap();
        assert!(err.to_string().contains("does not exist"));
    }
}
