//! Export configuration types.
//!
//! An export turns a clip plus its region set into a new video framed on a
//! fixed-size canvas with an optional background.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Lower/upper bound for any resolved output frame rate.
pub const MIN_EXPORT_FPS: u32 = 24;
pub const MAX_EXPORT_FPS: u32 = 60;

/// Frame rate used when nothing better is known.
pub const DEFAULT_EXPORT_FPS: u32 = 30;

/// Export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output canvas shape.
    pub aspect_ratio: AspectRatio,

    /// What fills the canvas around (and behind) the video.
    pub background: Background,

    /// Explicit frame rate. `None` derives it from the source.
    pub frame_rate: Option<u32>,

    /// Target video bitrate handed to the recorder.
    pub video_bitrate_bps: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::Landscape,
            background: Background::None,
            frame_rate: None,
            video_bitrate_bps: 8_000_000,
        }
    }
}

/// Output aspect ratio presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Landscape,
        AspectRatio::Standard,
        AspectRatio::Square,
        AspectRatio::Portrait,
    ];

    /// Fixed canvas size in pixels `(width, height)`.
    pub fn canvas_size(self) -> (u32, u32) {
        match self {
            AspectRatio::Landscape => (1920, 1080),
            AspectRatio::Standard => (1440, 1080),
            AspectRatio::Square => (1080, 1080),
            AspectRatio::Portrait => (1080, 1920),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Standard => "4:3",
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.label() == s.trim())
            .ok_or_else(|| format!("unknown aspect ratio '{s}' (expected 16:9, 4:3, 1:1 or 9:16)"))
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Canvas background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Background {
    /// Transparent clear.
    #[default]
    None,
    Black,
    White,
    /// One of the bundled image presets.
    Preset { preset: PresetBackground },
    /// A user-supplied image file.
    Custom { path: PathBuf },
}

impl Background {
    /// Location of the image to load, for image backgrounds.
    pub fn image_source(&self) -> Option<String> {
        match self {
            Background::Preset { preset } => Some(preset.url().to_string()),
            Background::Custom { path } => Some(path.display().to_string()),
            Background::None | Background::Black | Background::White => None,
        }
    }
}

/// Bundled background images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetBackground {
    TechBlue,
    CyberGrid,
    NeonPurple,
    MatrixGreen,
    FuturisticOrange,
}

impl PresetBackground {
    pub fn url(self) -> &'static str {
        match self {
            PresetBackground::TechBlue => {
                "https://images.unsplash.com/photo-1451187580459-43490279c0fa?w=1920&h=1080&fit=crop"
            }
            PresetBackground::CyberGrid => {
                "https://images.unsplash.com/photo-1518709268805-4e9042af2176?w=1920&h=1080&fit=crop"
            }
            PresetBackground::NeonPurple => {
                "https://images.unsplash.com/photo-1550751827-4bd374c3f58b?w=1920&h=1080&fit=crop"
            }
            PresetBackground::MatrixGreen => {
                "https://images.unsplash.com/photo-1510915228340-29c85a43dcfe?w=1920&h=1080&fit=crop"
            }
            PresetBackground::FuturisticOrange => {
                "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=1920&h=1080&fit=crop"
            }
        }
    }
}

/// Pick the output frame rate.
///
/// Preference order: the capture stream's reported rate (rounded), then
/// `total_frames / duration`, then [`DEFAULT_EXPORT_FPS`]. Whatever is chosen
/// is clamped into `[24, 60]`.
pub fn resolve_frame_rate(
    reported_rate: Option<f64>,
    total_frames: Option<u64>,
    duration_secs: f64,
) -> u32 {
    let clamp = |fps: f64| (fps.round() as u32).clamp(MIN_EXPORT_FPS, MAX_EXPORT_FPS);

    if let Some(rate) = reported_rate.filter(|r| r.is_finite() && *r > 0.0) {
        return clamp(rate);
    }
    if let Some(frames) = total_frames.filter(|f| *f > 0) {
        if duration_secs.is_finite() && duration_secs > 0.0 {
            return clamp(frames as f64 / duration_secs);
        }
    }
    DEFAULT_EXPORT_FPS
}
