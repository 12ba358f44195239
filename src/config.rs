//! Editor configuration module.
//!
//! Handles loading, validating, and merging `retouch.toml`. Stock defaults are
//! overridden by whatever the user file specifies; every other key keeps its
//! default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [session]
//! edits_dir = "edits"       # Committed edits land in <image dir>/<edits_dir>/
//! force_rgba = true         # Normalize every loaded image to RGBA
//!
//! [browse]
//! extensions = ["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"]
//!
//! [export]
//! jpeg_quality = 90         # 1-100
//! save_as_prefix = "edited_" # Suggested Save As filename prefix
//!
//! [display]
//! width = 720               # Viewport the display adapter fits images into
//! height = 700
//!
//! [processing]
//! max_processes = 4         # Preview workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up by [`load_config`].
pub const CONFIG_FILENAME: &str = "retouch.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Editor configuration loaded from `retouch.toml`.
///
/// This value is handed to the editor explicitly; nothing in the session
/// reads a working directory or UI state on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    pub session: SessionConfig,
    pub browse: BrowseConfig,
    pub export: ExportConfig,
    pub display: DisplayConfig,
    pub processing: ProcessingConfig,
}

impl EditorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let edits_dir = self.session.edits_dir.trim();
        if edits_dir.is_empty() {
            return Err(ConfigError::Validation(
                "session.edits_dir must not be empty".into(),
            ));
        }
        if Path::new(edits_dir).is_absolute() || edits_dir.contains("..") {
            return Err(ConfigError::Validation(
                "session.edits_dir must be a relative directory name".into(),
            ));
        }
        if self.browse.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "browse.extensions must not be empty".into(),
            ));
        }
        if !(1..=100).contains(&self.export.jpeg_quality) {
            return Err(ConfigError::Validation(
                "export.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(ConfigError::Validation(
                "display.width and display.height must be non-zero".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Session bookkeeping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Directory (relative to the loaded image) that receives committed edits.
    pub edits_dir: String,
    /// Convert every decoded image to RGBA on load.
    pub force_rgba: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            edits_dir: "edits".to_string(),
            force_rgba: true,
        }
    }
}

/// Directory listing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowseConfig {
    /// File extensions shown by `list`, without the dot, case-insensitive.
    pub extensions: Vec<String>,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub jpeg_quality: u32,
    /// Prefix of the filename suggested for Save As.
    pub save_as_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            save_as_prefix: "edited_".to_string(),
        }
    }
}

/// Viewport the display adapter fits into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 720,
            height: 700,
        }
    }
}

/// Preview worker settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of preview worker threads.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(EditorConfig::default()).expect("default config must serialize")
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

/// Load `retouch.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
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
) -> Result<EditorConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EditorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `retouch.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<EditorConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `retouch.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# retouch configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Session
# ---------------------------------------------------------------------------
[session]
# Committed edits are written to <image directory>/<edits_dir>/<filename>.
# The directory is created on the first commit.
edits_dir = "edits"

# Convert every loaded image to RGBA. Set to false to keep gray and RGB
# images in their decoded mode.
force_rgba = true

# ---------------------------------------------------------------------------
# Directory listing
# ---------------------------------------------------------------------------
[browse]
# Extensions shown by `retouch list`, case-insensitive.
extensions = ["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"]

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# JPEG quality (1 = worst, 100 = best). Other formats are lossless.
jpeg_quality = 90

# Save As suggests <edits_dir>/<save_as_prefix><filename>.
save_as_prefix = "edited_"

# ---------------------------------------------------------------------------
# Display
# ---------------------------------------------------------------------------
[display]
# Viewport that rendered frames are fitted into, keeping aspect ratio.
width = 720
height = 700

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum preview worker threads.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = EditorConfig::default();
        assert_eq!(config.session.edits_dir, "edits");
        assert!(config.session.force_rgba);
        assert_eq!(config.export.jpeg_quality, 90);
        assert_eq!(config.export.save_as_prefix, "edited_");
        assert_eq!((config.display.width, config.display.height), (720, 700));
        assert!(config.browse.extensions.contains(&"png".to_string()));
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn default_config_validates() {
        assert!(EditorConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[session]
edits_dir = "out"
"#;
        let config: EditorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.session.edits_dir, "out");
        // Unspecified values keep their defaults
        assert!(config.session.force_rgba);
        assert_eq!(config.export.jpeg_quality, 90);
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r#"
[session]
edit_dir = "typo"
"#;
        assert!(toml::from_str::<EditorConfig>(toml).is_err());
    }

    #[test]
    fn validate_rejects_bad_quality() {
        let mut config = EditorConfig::default();
        config.export.jpeg_quality = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.export.jpeg_quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_escaping_edits_dir() {
        let mut config = EditorConfig::default();
        config.session.edits_dir = "../elsewhere".into();
        assert!(config.validate().is_err());
        config.session.edits_dir = "/abs".into();
        assert!(config.validate().is_err());
        config.session.edits_dir = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_extensions_and_viewport() {
        let mut config = EditorConfig::default();
        config.browse.extensions.clear();
        assert!(config.validate().is_err());

        let mut config = EditorConfig::default();
        config.display.height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = EditorConfig::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // merge / load tests
    // =========================================================================

    #[test]
    fn merge_overrides_leaf_and_keeps_siblings() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[export]\njpeg_quality = 70").unwrap();
        let merged = merge_toml(base, overlay);
        let config: EditorConfig = merged.try_into().unwrap();
        assert_eq!(config.export.jpeg_quality, 70);
        assert_eq!(config.export.save_as_prefix, "edited_");
    }

    #[test]
    fn merge_replaces_arrays_wholesale() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[browse]\nextensions = [\"png\"]").unwrap();
        let config: EditorConfig = merge_toml(base, overlay).try_into().unwrap();
        assert_eq!(config.browse.extensions, vec!["png"]);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.session.edits_dir, "edits");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
[session]
force_rgba = false

[display]
width = 1024
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert!(!config.session.force_rgba);
        assert_eq!(config.display.width, 1024);
        assert_eq!(config.display.height, 700);
    }

    #[test]
    fn load_config_invalid_toml_errors() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[session\nbroken").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_after_merge() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[export]\njpeg_quality = 500\n",
        )
        .unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: EditorConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = EditorConfig::default();
        assert_eq!(config.session.edits_dir, defaults.session.edits_dir);
        assert_eq!(config.browse.extensions, defaults.browse.extensions);
        assert_eq!(config.export.jpeg_quality, defaults.export.jpeg_quality);
        assert_eq!(config.display.width, defaults.display.width);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn effective_threads_never_exceeds_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
        let capped = effective_threads(&ProcessingConfig {
            max_processes: Some(10_000),
        });
        assert_eq!(capped, cores);
        let one = effective_threads(&ProcessingConfig {
            max_processes: Some(1),
        });
        assert_eq!(one, 1);
    }
}
