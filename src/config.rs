use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use pagedeck_core::{ConversionKind, ConvertOptions, Quality};

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "PAGEDECK_CONFIG";

/// Persisted user preferences. Every field is optional; missing ones keep the defaults.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Conversion kind (`hybrid` or `image_only`).
    pub mode: Option<ConversionKind>,
    /// `fast`, `good` or `high`.
    pub quality: Option<String>,
    /// Explicit DPI; wins over `quality`.
    pub dpi: Option<u32>,
    pub redaction_margin: Option<f32>,
    pub pdfium_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn to_options(&self) -> ConvertOptions {
        let mut options = ConvertOptions::default();
        if let Some(kind) = self.mode {
            options.kind = kind;
        }
        if let Some(quality) = &self.quality {
            options.dpi = Quality::from_name(quality).dpi();
        }
        if let Some(dpi) = self.dpi {
            options.dpi = dpi;
        }
        if let Some(margin) = self.redaction_margin {
            options.redaction_margin = margin;
        }
        options.pdfium_dir = self.pdfium_dir.clone();
        options
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn config_path() -> PathBuf {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from("pagedeck").join("config.json"),
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        log::debug!("[Config] {} not found, using defaults", path.display());
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)?;
    let config = serde_json::from_str(&raw)?;
    log::info!("[Config] loaded {}", path.display());
    Ok(config)
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let raw = serde_json::to_string_pretty(config)?;
    fs::write(path, raw)?;
    Ok(())
}
