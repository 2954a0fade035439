//! Recording session management.

use std::future::Future;
use std::sync::Arc;

use screenverse_common::error::{ScreenverseError, ScreenverseResult};
use screenverse_common::ExportDefaults;
use screenverse_processing_core::auto_zoom::{AutoZoomAnalyzer, AutoZoomConfig};
use screenverse_project_model::import::ImportBuffer;
use screenverse_project_model::store::{ClipMetadata, ClipStore, SaveClipOptions};
use screenverse_render_engine::encoder::{
    select_mime_type, EncodedOutput, Recorder, RecorderFactory, RecorderOptions,
};
use screenverse_render_engine::metadata::{capture_thumbnail, resolve_duration};

use crate::source::{
    CaptureConstraints, ClickLog, DisplayCapture, LiveVideoSource, RecordingDecoder,
};

/// Configuration for a recording session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Title for the saved clip. `None` uses the store's timestamped default.
    pub title: Option<String>,

    /// Display capture settings.
    pub constraints: CaptureConstraints,

    /// Containers to probe, in order.
    pub mime_preferences: Vec<String>,

    pub video_bitrate_bps: u64,

    /// How recorded clicks become zoom regions.
    pub auto_zoom: AutoZoomConfig,

    /// Width of the saved first-frame thumbnail.
    pub thumbnail_width: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let export = ExportDefaults::default();
        Self {
            title: None,
            constraints: CaptureConstraints::default(),
            mime_preferences: export.mime_preferences,
            video_bitrate_bps: export.video_bitrate_bps,
            auto_zoom: AutoZoomConfig::default(),
            thumbnail_width: 320,
        }
    }
}

/// State of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing captured yet, or the last attempt was abandoned.
    Idle,
    /// Recording in progress.
    Recording,
    /// Recording paused.
    Paused,
    /// Recording stopped, clip saved.
    Stopped,
    /// The recording finished but could not be saved.
    Error,
}

/// The result of a successful recording.
#[derive(Debug, Clone)]
pub struct RecordingOutcome {
    pub clip: ClipMetadata,

    /// Click-derived zoom regions staged for the editor.
    pub staged_regions: usize,
}

/// What decoding the finished recording revealed.
#[derive(Debug, Default)]
struct RecordingDetails {
    duration_secs: Option<f64>,
    thumbnail_png: Option<Vec<u8>>,
}

struct ActiveCapture {
    live: LiveVideoSource,
    recorder: Box<dyn Recorder>,
    clicks: ClickLog,
}

/// A recording session from display prompt to saved clip.
pub struct RecordingSession {
    config: SessionConfig,
    state: SessionState,
    capture: Arc<dyn DisplayCapture>,
    recorders: Arc<dyn RecorderFactory>,
    store: Arc<dyn ClipStore>,
    import_buffer: ImportBuffer,
    decoder: Option<Arc<dyn RecordingDecoder>>,
    active: Option<ActiveCapture>,
}

impl RecordingSession {
    pub fn new(
        config: SessionConfig,
        capture: Arc<dyn DisplayCapture>,
        recorders: Arc<dyn RecorderFactory>,
        store: Arc<dyn ClipStore>,
        import_buffer: ImportBuffer,
    ) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            capture,
            recorders,
            store,
            import_buffer,
            decoder: None,
            active: None,
        }
    }

    /// Decode each finished recording before saving it, so the stored clip
    /// carries its decoded duration and a first-frame thumbnail.
    pub fn with_decoder(mut self, decoder: Arc<dyn RecordingDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Recording duration so far.
    pub fn elapsed_secs(&self) -> f64 {
        self.active
            .as_ref()
            .map(|a| a.clicks.elapsed_secs())
            .unwrap_or(0.0)
    }

    /// Start recording.
    ///
    /// Any failure leaves the session `Idle` with the display stream
    /// released, so the caller can simply retry.
    pub async fn start(&mut self) -> ScreenverseResult<()> {
        if matches!(self.state, SessionState::Recording | SessionState::Paused) {
            return Err(ScreenverseError::capture("Session already started"));
        }

        tracing::info!(
            width = self.config.constraints.ideal_width,
            fps = self.config.constraints.frame_rate,
            "Starting recording session"
        );

        let live = match self
            .capture
            .acquire_display_stream(&self.config.constraints)
            .await
        {
            Ok(live) => live,
            Err(err) => {
                tracing::warn!(error = %err, retryable = err.is_retryable(), "Display capture unavailable");
                self.state = SessionState::Idle;
                return Err(err);
            }
        };

        let mime_type = select_mime_type(self.recorders.as_ref(), &self.config.mime_preferences);
        let recorder = self
            .recorders
            .create(
                &live.stream,
                RecorderOptions {
                    mime_type: mime_type.clone(),
                    video_bitrate_bps: self.config.video_bitrate_bps,
                },
            )
            .and_then(|mut recorder| recorder.start().map(|()| recorder));
        let recorder = match recorder {
            Ok(recorder) => recorder,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    retryable = err.is_retryable(),
                    mime = %mime_type,
                    "Recorder failed to start"
                );
                self.capture.release(&live.stream);
                self.state = SessionState::Idle;
                return Err(err);
            }
        };

        tracing::info!(
            stream = %live.stream.id,
            width = live.width,
            height = live.height,
            mime = %mime_type,
            "Recording started"
        );
        self.active = Some(ActiveCapture {
            live,
            recorder,
            clicks: ClickLog::start(),
        });
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Pause recording (keeps the stream alive but stops encoding).
    pub fn pause(&mut self) -> ScreenverseResult<()> {
        if self.state != SessionState::Recording {
            return Err(ScreenverseError::capture("Not recording"));
        }
        if let Some(active) = self.active.as_mut() {
            active.recorder.pause()?;
        }
        self.state = SessionState::Paused;
        tracing::info!("Recording paused");
        Ok(())
    }

    /// Resume a paused recording.
    pub fn resume(&mut self) -> ScreenverseResult<()> {
        if self.state != SessionState::Paused {
            return Err(ScreenverseError::capture("Not paused"));
        }
        if let Some(active) = self.active.as_mut() {
            active.recorder.resume()?;
        }
        self.state = SessionState::Recording;
        tracing::info!("Recording resumed");
        Ok(())
    }

    /// Log a pointer click at pixel `(px, py)` of the captured surface.
    /// Ignored unless actively recording.
    pub fn record_click(&mut self, px: f64, py: f64) {
        if self.state != SessionState::Recording {
            return;
        }
        if let Some(active) = self.active.as_mut() {
            let (w, h) = (active.live.width as f64, active.live.height as f64);
            active.clicks.record(px, py, w, h);
        }
    }

    /// Stop recording, save the clip and stage its click-derived zooms.
    pub async fn stop(&mut self) -> ScreenverseResult<RecordingOutcome> {
        let Some(mut active) = self.active.take() else {
            return Err(ScreenverseError::capture("Session not recording"));
        };

        tracing::info!("Stopping recording session");
        let chunks = active.recorder.stop().await;
        self.capture.release(&active.live.stream);
        let wall_clock_secs = active.clicks.elapsed_secs();

        let output = match chunks
            .and_then(|chunks| EncodedOutput::assemble(chunks, active.recorder.mime_type()))
        {
            Ok(output) => output,
            Err(err) => {
                tracing::error!(error = %err, wall_clock_secs, "Recording produced no data");
                self.state = SessionState::Idle;
                return Err(err);
            }
        };

        let details = match self.decoder.clone() {
            Some(decoder) => {
                inspect_recording(decoder.as_ref(), &output, self.config.thumbnail_width).await
            }
            None => RecordingDetails::default(),
        };
        let duration_secs = details.duration_secs.unwrap_or(wall_clock_secs);

        let clip = match self.store.save_clip(
            &output.data,
            SaveClipOptions {
                title: self.config.title.clone(),
                duration_secs: Some(duration_secs),
                mime_type: Some(output.mime_type.clone()),
                thumbnail_png: details.thumbnail_png,
            },
        ) {
            Ok(clip) => clip,
            Err(err) => {
                tracing::error!(error = %err, "Failed to save recording");
                self.state = SessionState::Error;
                return Err(ScreenverseError::store(format!(
                    "failed to save recording: {err}"
                )));
            }
        };

        let regions = AutoZoomAnalyzer::new(self.config.auto_zoom.clone())
            .analyze(active.clicks.clicks(), Some(duration_secs));
        let staged_regions = match self.import_buffer.stage(&regions) {
            Ok(()) => regions.len(),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to stage click zoom regions");
                0
            }
        };

        tracing::info!(
            clip = %clip.id,
            duration_secs,
            bytes = clip.size_bytes,
            clicks = active.clicks.clicks().len(),
            staged_regions,
            "Recording saved"
        );
        self.state = SessionState::Stopped;
        Ok(RecordingOutcome {
            clip,
            staged_regions,
        })
    }

    /// Record until the display track ends or `stop_requested` resolves,
    /// then stop exactly as [`RecordingSession::stop`] does.
    pub async fn run_until_stopped<F>(
        &mut self,
        stop_requested: F,
    ) -> ScreenverseResult<RecordingOutcome>
    where
        F: Future<Output = ()> + Send,
    {
        let Some(active) = self.active.as_mut() else {
            return Err(ScreenverseError::capture("Session not recording"));
        };

        tokio::select! {
            _ = active.live.ended.wait() => {
                tracing::info!("Display track ended by the user");
            }
            _ = stop_requested => {
                tracing::info!("Stop requested");
            }
        }

        self.stop().await
    }

    /// Return an errored or stopped session to `Idle`.
    pub fn reset(&mut self) {
        if let Some(active) = self.active.take() {
            self.capture.release(&active.live.stream);
        }
        self.state = SessionState::Idle;
    }
}

/// Read the decoded duration and a thumbnail from a finished recording.
/// Failures only cost the clip those extras.
async fn inspect_recording(
    decoder: &dyn RecordingDecoder,
    output: &EncodedOutput,
    thumbnail_width: u32,
) -> RecordingDetails {
    let mut source = match decoder.open(output).await {
        Ok(source) => source,
        Err(err) => {
            tracing::warn!(error = %err, "Could not decode recording");
            return RecordingDetails::default();
        }
    };

    let duration_secs = match resolve_duration(source.as_mut()).await {
        Ok(duration) => Some(duration),
        Err(err) => {
            tracing::warn!(error = %err, "Recording duration unknown, using wall clock");
            None
        }
    };

    let mut canvas = decoder.canvas();
    let thumbnail_png =
        match capture_thumbnail(source.as_mut(), canvas.as_mut(), thumbnail_width).await {
            Ok(png) => Some(png),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to capture thumbnail");
                None
            }
        };

    RecordingDetails {
        duration_secs,
        thumbnail_png,
    }
}
