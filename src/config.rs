//! Tool configuration module.
//!
//! Handles loading, validating, and merging `mosaic.toml`. Stock defaults are
//! the base layer; a `mosaic.toml` in the config directory (the working
//! directory unless `--config` says otherwise) overrides any subset of them.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [mosaic]
//! mode = "fanza"              # "fanza" (proportional) or "custom"
//! custom_size = 10            # Cell size in custom mode (1-100)
//! multiplier = 1              # Scale on top of the mode's size (1-4)
//! skip_low_variance = false   # Leave nearly flat cells untouched
//! variance_threshold = 5.0    # Std-dev below which a cell counts as flat
//!
//! [history]
//! max_depth = 200             # Undo steps kept per image
//!
//! [save]
//! format = "png"              # Output format of edited images
//! jpeg_quality = 95           # Used when format is jpg/jpeg (1-100)
//! completed_dir = "_Completed"
//! original_dir = "_Original"
//! embed_metadata = true       # PNG only
//! software = "mosaic-brush"
//! processing_note = "Mosaic applied by mosaic-brush"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [mosaic]
//! mode = "custom"
//! custom_size = 16
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::history::DEFAULT_MAX_DEPTH;
use crate::imaging::{Averaging, CUSTOM_SIZE_RANGE, Multiplier, Quality, SizePolicy};
use crate::session::SessionSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the config directory.
pub const CONFIG_FILE: &str = "mosaic.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `mosaic.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MosaicConfig {
    /// Cell sizing and averaging.
    pub mosaic: MosaicSettings,
    /// Undo history.
    pub history: HistoryConfig,
    /// Output format, folders and embedded metadata.
    pub save: SaveConfig,
}

impl MosaicConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (lo, hi) = CUSTOM_SIZE_RANGE;
        if !(lo..=hi).contains(&self.mosaic.custom_size) {
            return Err(ConfigError::Validation(format!(
                "mosaic.custom_size must be {lo}-{hi}"
            )));
        }
        if !(1..=4).contains(&self.mosaic.multiplier) {
            return Err(ConfigError::Validation(
                "mosaic.multiplier must be 1-4".into(),
            ));
        }
        if !self.mosaic.variance_threshold.is_finite() || self.mosaic.variance_threshold < 0.0 {
            return Err(ConfigError::Validation(
                "mosaic.variance_threshold must be a non-negative number".into(),
            ));
        }
        if self.history.max_depth == 0 {
            return Err(ConfigError::Validation(
                "history.max_depth must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.save.jpeg_quality) {
            return Err(ConfigError::Validation(
                "save.jpeg_quality must be 1-100".into(),
            ));
        }
        for (key, dir) in [
            ("save.completed_dir", &self.save.completed_dir),
            ("save.original_dir", &self.save.original_dir),
        ] {
            if dir.is_empty() || dir.contains(['/', '\\']) || dir == "." || dir == ".." {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a plain folder name"
                )));
            }
        }
        if self.save.completed_dir == self.save.original_dir {
            return Err(ConfigError::Validation(
                "save.completed_dir and save.original_dir must differ".into(),
            ));
        }
        Ok(())
    }

    /// Size policy selected by `[mosaic]`.
    pub fn policy(&self) -> SizePolicy {
        match self.mosaic.mode {
            SizeMode::Fanza => SizePolicy::Proportional,
            SizeMode::Custom => SizePolicy::custom(self.mosaic.custom_size),
        }
    }

    pub fn averaging(&self) -> Averaging {
        if self.mosaic.skip_low_variance {
            Averaging::VarianceGated {
                threshold: self.mosaic.variance_threshold,
            }
        } else {
            Averaging::Uniform
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            policy: self.policy(),
            multiplier: Multiplier::new(self.mosaic.multiplier),
            averaging: self.averaging(),
            max_history: self.history.max_depth,
        }
    }
}

/// Cell-size mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    /// Proportional to the longer image edge.
    #[default]
    Fanza,
    /// Fixed `custom_size`.
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MosaicSettings {
    pub mode: SizeMode,
    pub custom_size: u32,
    pub multiplier: u32,
    pub skip_low_variance: bool,
    pub variance_threshold: f32,
}

impl Default for MosaicSettings {
    fn default() -> Self {
        Self {
            mode: SizeMode::Fanza,
            custom_size: 10,
            multiplier: 1,
            skip_low_variance: false,
            variance_threshold: Averaging::DEFAULT_VARIANCE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Output formats an edited image can be written as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    #[default]
    Png,
    Jpg,
    Jpeg,
    Tiff,
    Webp,
    Bmp,
}

impl SaveFormat {
    /// File extension, which is also what picks the encoder.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Tiff => "tiff",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SaveConfig {
    pub format: SaveFormat,
    pub jpeg_quality: u32,
    pub completed_dir: String,
    pub original_dir: String,
    pub embed_metadata: bool,
    pub software: String,
    pub processing_note: String,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            format: SaveFormat::Png,
            jpeg_quality: 95,
            completed_dir: "_Completed".to_string(),
            original_dir: "_Original".to_string(),
            embed_metadata: true,
            software: env!("CARGO_PKG_NAME").to_string(),
            processing_note: format!("Mosaic applied by {}", env!("CARGO_PKG_NAME")),
        }
    }
}

impl SaveConfig {
    pub fn quality(&self) -> Quality {
        Quality::new(self.jpeg_quality)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(MosaicConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `mosaic.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if there is no `mosaic.toml` in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<MosaicConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MosaicConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `mosaic.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<MosaicConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    let config = resolve_config(base, overlay)?;
    log::debug!("config resolved from {}: {config:?}", dir.display());
    Ok(config)
}

/// Returns a fully-commented stock `mosaic.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# mosaic-brush configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# The file is read from the directory given with --config (default: the
# current directory). Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Mosaic cells
# ---------------------------------------------------------------------------
[mosaic]
# "fanza": cell edge = max(4, longer image edge / 100) once the longer edge
#          reaches 400 px, otherwise 4 px.
# "custom": cell edge = custom_size.
mode = "fanza"

# Cell edge in pixels for custom mode (1-100).
custom_size = 10

# Multiplies the size chosen by the mode (1-4).
multiplier = 1

# Leave cells that are already nearly flat untouched.
skip_low_variance = false

# Mean per-channel standard deviation below which a cell counts as flat.
variance_threshold = 5.0

# ---------------------------------------------------------------------------
# Undo history
# ---------------------------------------------------------------------------
[history]
# Number of states kept per image; the oldest are dropped first.
max_depth = 200

# ---------------------------------------------------------------------------
# Saving
# ---------------------------------------------------------------------------
[save]
# Output format for edited images: png, jpg, jpeg, tiff, webp or bmp.
# Only png can carry the embedded mosaic metadata.
format = "png"

# JPEG encoding quality (1 = worst, 100 = best).
jpeg_quality = 95

# Folders created next to the source image by --complete and skip.
completed_dir = "_Completed"
original_dir = "_Original"

# Write software name, processing note, reference point and cell size
# into PNG text chunks.
embed_metadata = true
software = "mosaic-brush"
processing_note = "Mosaic applied by mosaic-brush"
"##
}
