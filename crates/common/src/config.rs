//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ScreenverseError, ScreenverseResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where recorded clips are stored.
    pub clips_dir: PathBuf,

    /// Timeline editing defaults.
    pub editor: EditorDefaults,

    /// Export pipeline tuning.
    pub export: ExportDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Defaults applied when regions are created from the toolbar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorDefaults {
    /// Magnification given to newly placed zoom regions.
    pub default_zoom_level: f64,

    /// Length of a toolbar-added region as a fraction of the clip duration.
    pub new_region_fraction: f64,

    /// Maximum number of undo snapshots kept.
    pub history_depth: usize,
}

/// Export pipeline defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Target video bitrate handed to the recorder.
    pub video_bitrate_bps: u64,

    /// Container/codec preferences, probed in order.
    pub mime_preferences: Vec<String>,

    /// Maximum drift between the source position and a target frame
    /// before a seek is issued.
    pub seek_tolerance_secs: f64,

    /// Upper bound on waiting for a seek-completion signal.
    pub seek_timeout_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "screenverse=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            clips_dir: dirs_default_clips(),
            editor: EditorDefaults::default(),
            export: ExportDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            default_zoom_level: 1.5,
            new_region_fraction: 1.0 / 50.0,
            history_depth: 100,
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            video_bitrate_bps: 8_000_000,
            mime_preferences: vec![
                "video/webm;codecs=vp9".to_string(),
                "video/webm;codecs=vp8".to_string(),
                "video/webm".to_string(),
            ],
            seek_tolerance_secs: 0.1,
            seek_timeout_ms: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
                    Ok(config) => match config.validate() {
                        Ok(()) => return config,
                        Err(e) => {
                            tracing::warn!("Ignoring config at {:?}: {}", config_path, e);
                        }
                    },
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> ScreenverseResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path. Invalid values are not written.
    pub fn save_to(&self, config_path: &std::path::Path) -> ScreenverseResult<()> {
        self.validate()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, json)?;
        Ok(())
    }

    /// Reject values the editor and export pipeline cannot work with.
    pub fn validate(&self) -> ScreenverseResult<()> {
        let zoom = self.editor.default_zoom_level;
        if !(1.0..=3.0).contains(&zoom) {
            return Err(ScreenverseError::config(format!(
                "editor.default_zoom_level {zoom} is outside [1.0, 3.0]"
            )));
        }
        let fraction = self.editor.new_region_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ScreenverseError::config(format!(
                "editor.new_region_fraction {fraction} must be in (0, 1]"
            )));
        }
        let tolerance = self.export.seek_tolerance_secs;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ScreenverseError::config(format!(
                "export.seek_tolerance_secs {tolerance} must be a non-negative number"
            )));
        }
        if self.export.seek_timeout_ms == 0 {
            return Err(ScreenverseError::config("export.seek_timeout_ms must be positive"));
        }
        if self.export.video_bitrate_bps == 0 {
            return Err(ScreenverseError::config("export.video_bitrate_bps must be positive"));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("screenverse").join("config.json")
}

/// Default clip store directory.
fn dirs_default_clips() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("screenverse").join("clips")
}
