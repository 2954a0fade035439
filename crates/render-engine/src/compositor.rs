//! Frame planning: which source instants are rendered and how.
//!
//! Everything here is pure. [`plan_export`] resolves the canvas, the video
//! placement, the frame rate, the export frame timeline (trims removed) and
//! the per-frame zoom lookup before a single frame is drawn.

use serde::Serialize;

use screenverse_common::error::{ScreenverseError, ScreenverseResult};
use screenverse_project_model::project::{
    resolve_frame_rate, ExportConfig, MAX_EXPORT_FPS, MIN_EXPORT_FPS,
};
use screenverse_project_model::region::{kept_segments, Region, RegionSet, ZoomCenter};
use screenverse_project_model::viewport::{fit_rect, zoom_crop, Rect};

use crate::media::VideoSource;

/// Slack added before flooring `duration * fps`, so exact products such as
/// `10.0 * 30` do not lose their last frame to rounding.
const FRAME_COUNT_EPSILON: f64 = 1e-9;

/// What the planner needs to know about the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    pub reported_frame_rate: Option<f64>,
    pub decoded_frames: Option<u64>,
}

impl SourceInfo {
    pub fn probe(source: &dyn VideoSource) -> Self {
        let (width, height) = source.dimensions();
        Self {
            width,
            height,
            reported_frame_rate: source.reported_frame_rate(),
            decoded_frames: source.decoded_frame_count(),
        }
    }
}

/// Zoom applied to one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameZoom {
    pub region_id: String,
    pub center: ZoomCenter,
    pub level: f64,
}

/// A single frame's composition instructions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameComposition {
    /// Position in the output.
    pub frame_index: u64,

    /// Source timestamp to sample.
    pub time_secs: f64,

    /// Governing zoom, if any.
    pub zoom: Option<FrameZoom>,
}

impl FrameComposition {
    /// Region of the source frame to sample.
    pub fn source_rect(&self, source_w: f64, source_h: f64) -> Rect {
        match &self.zoom {
            Some(zoom) => zoom_crop(source_w, source_h, zoom.center, zoom.level),
            None => Rect::sized(source_w, source_h),
        }
    }
}

/// Fully resolved export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPlan {
    pub canvas_width: u32,
    pub canvas_height: u32,

    /// Letterboxed video placement on the canvas.
    pub placement: Rect,

    pub frame_rate: u32,

    /// Source duration in seconds.
    pub duration_secs: f64,

    /// Frames to render, in order.
    pub frames: Vec<FrameComposition>,

    /// Source ranges that survive trimming.
    pub kept_segments: Vec<(f64, f64)>,
}

impl ExportPlan {
    pub fn total_frames(&self) -> u64 {
        self.frames.len() as u64
    }

    /// Length of the exported video.
    pub fn output_duration_secs(&self) -> f64 {
        self.frames.len() as f64 / self.frame_rate as f64
    }

    pub fn zoomed_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.zoom.is_some()).count()
    }
}

/// Source timestamps to render: `i / fps` for `i < floor(duration * fps)`,
/// minus any timestamp inside a trim (`start <= t < end`).
pub fn frame_timeline(duration_secs: f64, fps: u32, regions: &[Region]) -> Vec<f64> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 || fps == 0 {
        return Vec::new();
    }
    let mut trims: Vec<&Region> = regions.iter().filter(|r| r.is_trim()).collect();
    trims.sort_by(|a, b| a.start.total_cmp(&b.start));

    let count = (duration_secs * fps as f64 + FRAME_COUNT_EPSILON).floor() as u64;
    (0..count)
        .map(|i| i as f64 / fps as f64)
        .filter(|&t| !trims.iter().any(|trim| trim.covers_frame(t)))
        .collect()
}

/// For each timeline entry, the zoom region covering it (half-open).
///
/// Two zooms covering the same frame is an error naming both.
pub fn zoom_lookup<'a>(
    timeline: &[f64],
    regions: &'a [Region],
) -> ScreenverseResult<Vec<Option<&'a Region>>> {
    let zooms: Vec<&Region> = regions.iter().filter(|r| r.is_zoom()).collect();
    let mut lookup: Vec<Option<&Region>> = vec![None; timeline.len()];

    for zoom in zooms {
        let first = timeline.partition_point(|&t| t < zoom.start);
        for (index, &t) in timeline.iter().enumerate().skip(first) {
            if t >= zoom.end {
                break;
            }
            if let Some(existing) = lookup[index] {
                return Err(ScreenverseError::render(format!(
                    "zoom regions {} and {} overlap at {t:.3}s; overlapping zooms cannot be exported",
                    existing.id, zoom.id
                )));
            }
            lookup[index] = Some(zoom);
        }
    }
    Ok(lookup)
}

/// Resolve everything the frame loop needs.
pub fn plan_export(
    regions: &RegionSet,
    config: &ExportConfig,
    source: &SourceInfo,
) -> ScreenverseResult<ExportPlan> {
    if source.width == 0 || source.height == 0 {
        return Err(ScreenverseError::render(format!(
            "source has no frame size ({}x{})",
            source.width, source.height
        )));
    }

    let (canvas_width, canvas_height) = config.aspect_ratio.canvas_size();
    let placement = fit_rect(
        source.width as f64,
        source.height as f64,
        Rect::sized(canvas_width as f64, canvas_height as f64),
    );

    let duration_secs = regions.duration();
    let frame_rate = match config.frame_rate {
        Some(fps) => fps.clamp(MIN_EXPORT_FPS, MAX_EXPORT_FPS),
        None => resolve_frame_rate(source.reported_frame_rate, source.decoded_frames, duration_secs),
    };

    let timeline = frame_timeline(duration_secs, frame_rate, regions.regions());
    if timeline.is_empty() {
        return Err(ScreenverseError::empty_export(format!(
            "every frame of the {duration_secs:.2}s clip falls inside a trim region"
        )));
    }

    let lookup = zoom_lookup(&timeline, regions.regions())?;
    let frames = timeline
        .iter()
        .zip(lookup)
        .enumerate()
        .map(|(index, (&time_secs, zoom))| FrameComposition {
            frame_index: index as u64,
            time_secs,
            zoom: zoom.and_then(|region| {
                region.zoom().map(|settings| FrameZoom {
                    region_id: region.id.clone(),
                    center: settings.center,
                    level: settings.level,
                })
            }),
        })
        .collect::<Vec<_>>();

    let plan = ExportPlan {
        canvas_width,
        canvas_height,
        placement,
        frame_rate,
        duration_secs,
        frames,
        kept_segments: kept_segments(regions.regions(), duration_secs),
    };
    tracing::debug!(
        frames = plan.total_frames(),
        fps = plan.frame_rate,
        zoomed = plan.zoomed_frames(),
        canvas = %format!("{canvas_width}x{canvas_height}"),
        "Export planned"
    );
    Ok(plan)
}
