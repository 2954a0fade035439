//! Export job execution: the serial frame loop feeding a streaming recorder.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use screenverse_common::error::{ScreenverseError, ScreenverseResult};
use screenverse_common::ExportDefaults;
use screenverse_project_model::project::ExportConfig;
use screenverse_project_model::region::RegionSet;

use crate::background::PreparedBackground;
use crate::compositor::{plan_export, ExportPlan, SourceInfo};
use crate::encoder::{select_mime_type, EncodedOutput, RecorderFactory, RecorderOptions};
use crate::media::{Canvas, ImageLoader, VideoSource};

/// Share of the progress bar covered by drawing; the rest is encoder flush.
pub const RENDER_PROGRESS_SHARE: f64 = 0.9;

/// An export ready to be rendered.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Final region set for the clip.
    pub regions: RegionSet,

    /// Export configuration.
    pub config: ExportConfig,
}

/// Pipeline knobs that do not belong to a single job.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTuning {
    /// Drift tolerated before the source is re-seeked.
    pub seek_tolerance_secs: f64,

    /// Upper bound on one seek.
    pub seek_timeout: Duration,

    /// Containers to probe, in order.
    pub mime_preferences: Vec<String>,
}

impl Default for ExportTuning {
    fn default() -> Self {
        Self::from(&ExportDefaults::default())
    }
}

impl From<&ExportDefaults> for ExportTuning {
    fn from(defaults: &ExportDefaults) -> Self {
        Self {
            seek_tolerance_secs: defaults.seek_tolerance_secs,
            seek_timeout: Duration::from_millis(defaults.seek_timeout_ms),
            mime_preferences: defaults.mime_preferences.clone(),
        }
    }
}

/// The host objects an export drives. The source is owned exclusively for
/// the duration of the export.
pub struct ExportTargets<'a> {
    pub source: &'a mut dyn VideoSource,
    pub canvas: &'a mut dyn Canvas,
    pub images: &'a dyn ImageLoader,
    pub recorders: &'a dyn RecorderFactory,
}

/// Cancellation flag for a running export.
///
/// Checked at the top of every frame; once set no further frames are drawn.
#[derive(Debug, Clone, Default)]
pub struct ExportCancel(Arc<AtomicBool>);

impl ExportCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

/// Export progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    Failed,
}

struct ProgressReporter {
    callback: Option<ProgressCallback>,
    total_frames: u64,
    started: Instant,
}

impl ProgressReporter {
    fn report(&self, stage: ExportStage, frames_rendered: u64) {
        let Some(cb) = &self.callback else {
            return;
        };
        let progress = match stage {
            ExportStage::Preparing => 0.0,
            ExportStage::Complete => 1.0,
            _ if self.total_frames == 0 => 0.0,
            _ => RENDER_PROGRESS_SHARE * frames_rendered as f64 / self.total_frames as f64,
        };
        let elapsed = self.started.elapsed().as_secs_f64();
        let eta_secs = if progress > 0.0 && progress < 1.0 {
            ((elapsed / progress) - elapsed).max(0.0)
        } else {
            0.0
        };
        cb(ExportProgress {
            progress,
            frames_rendered,
            total_frames: self.total_frames,
            eta_secs,
            stage,
        });
    }

    fn failed(&self, err: ScreenverseError) -> ScreenverseError {
        tracing::error!(error = %err, "Export failed");
        self.report(ExportStage::Failed, 0);
        err
    }
}

/// Render `job` through the host's canvas into an encoded file.
///
/// This is the main entry point for rendering. The recorder is attached to
/// the canvas stream before the first frame is drawn and is stopped exactly
/// once, whether the export completes, fails or is cancelled.
pub async fn export_clip(
    job: &ExportJob,
    targets: ExportTargets<'_>,
    tuning: &ExportTuning,
    cancel: &ExportCancel,
    progress: Option<ProgressCallback>,
) -> ScreenverseResult<EncodedOutput> {
    let ExportTargets {
        source,
        canvas,
        images,
        recorders,
    } = targets;

    let mut reporter = ProgressReporter {
        callback: progress,
        total_frames: 0,
        started: Instant::now(),
    };
    reporter.report(ExportStage::Preparing, 0);

    let plan = match plan_export(&job.regions, &job.config, &SourceInfo::probe(&*source)) {
        Ok(plan) => plan,
        Err(err) => return Err(reporter.failed(err)),
    };
    reporter.total_frames = plan.total_frames();

    tracing::info!(
        aspect = %job.config.aspect_ratio,
        fps = plan.frame_rate,
        frames = plan.total_frames(),
        duration_secs = plan.duration_secs,
        "Starting export"
    );

    canvas.resize(plan.canvas_width, plan.canvas_height);
    let background = PreparedBackground::prepare(&job.config.background, images).await;

    let mime_type = select_mime_type(recorders, &tuning.mime_preferences);
    let stream = canvas.capture_stream(plan.frame_rate);
    let mut recorder = recorders
        .create(
            &stream,
            RecorderOptions {
                mime_type: mime_type.clone(),
                video_bitrate_bps: job.config.video_bitrate_bps,
            },
        )
        .map_err(|err| reporter.failed(err))?;
    recorder.start().map_err(|err| reporter.failed(err))?;
    tracing::debug!(mime = %mime_type, stream = %stream.id, "Recorder attached to canvas stream");

    let drawn = draw_frames(&plan, source, canvas, &background, tuning, cancel, &reporter).await;

    reporter.report(ExportStage::Finalizing, drawn.frames_rendered);
    let chunks = recorder.stop().await;

    if drawn.cancelled {
        tracing::info!(frames_rendered = drawn.frames_rendered, "Export cancelled");
        reporter.report(ExportStage::Failed, drawn.frames_rendered);
        return Err(ScreenverseError::ExportCancelled {
            frames_rendered: drawn.frames_rendered,
        });
    }

    let output = chunks.and_then(|chunks| EncodedOutput::assemble(chunks, recorder.mime_type()));
    match output {
        Ok(output) => {
            reporter.report(ExportStage::Complete, drawn.frames_rendered);
            tracing::info!(
                bytes = output.data.len(),
                chunks = output.chunk_count,
                frames = drawn.frames_rendered,
                mime = %output.mime_type,
                "Export complete"
            );
            Ok(output)
        }
        Err(err) => {
            tracing::error!(error = %err, "Export failed while finalizing");
            reporter.report(ExportStage::Failed, drawn.frames_rendered);
            Err(err)
        }
    }
}

struct DrawOutcome {
    frames_rendered: u64,
    cancelled: bool,
}

async fn draw_frames(
    plan: &ExportPlan,
    source: &mut dyn VideoSource,
    canvas: &mut dyn Canvas,
    background: &PreparedBackground,
    tuning: &ExportTuning,
    cancel: &ExportCancel,
    reporter: &ProgressReporter,
) -> DrawOutcome {
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / plan.frame_rate as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let (source_w, source_h) = source.dimensions();
    let mut frames_rendered = 0u64;

    for frame in &plan.frames {
        ticker.tick().await;
        if cancel.is_cancelled() {
            return DrawOutcome {
                frames_rendered,
                cancelled: true,
            };
        }

        seek_to(source, frame.time_secs, tuning).await;

        background.paint(canvas);
        let crop = frame.source_rect(source_w as f64, source_h as f64);
        canvas.draw_video(&*source, crop, plan.placement);

        frames_rendered += 1;
        reporter.report(ExportStage::Rendering, frames_rendered);
    }

    DrawOutcome {
        frames_rendered,
        cancelled: false,
    }
}

/// Bring the source to `target` unless it is already within tolerance.
///
/// A seek that never completes is abandoned after the timeout and the frame
/// is drawn from wherever the source is.
async fn seek_to(source: &mut dyn VideoSource, target: f64, tuning: &ExportTuning) {
    let drift = (source.current_time() - target).abs();
    if drift <= tuning.seek_tolerance_secs {
        return;
    }
    if tokio::time::timeout(tuning.seek_timeout, source.seek(target))
        .await
        .is_err()
    {
        tracing::warn!(
            target_secs = target,
            current_secs = source.current_time(),
            timeout_ms = tuning.seek_timeout.as_millis() as u64,
            "Seek did not complete in time, drawing current frame"
        );
    }
}
