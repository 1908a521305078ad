//! Data-driven factory configuration.
//!
//! Feature-gated behind `data-loader`. Reads a [`FactoryConfig`] from RON,
//! TOML or JSON, picking the format from the file extension, and validates
//! it before returning.

use std::path::{Path, PathBuf};

use crate::config::{ConfigError, FactoryConfig};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Format detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse and validate a config held in memory. `origin` only labels errors.
pub fn load_config_str(
    content: &str,
    format: Format,
    origin: &Path,
) -> Result<FactoryConfig, DataLoadError> {
    let parse_err = |detail: String| DataLoadError::Parse {
        file: origin.to_path_buf(),
        detail,
    };
    let config: FactoryConfig = match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?,
    };
    config.validate()?;
    log::debug!(
        "loaded factory config from {}: {}x{} grid, {} tile definitions",
        origin.display(),
        config.grid.grid_width,
        config.grid.grid_height,
        config.tiles.len()
    );
    Ok(config)
}

/// Read a config file, detecting its format from the extension.
pub fn load_config_file(path: &Path) -> Result<FactoryConfig, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    load_config_str(&content, format, path)
}
