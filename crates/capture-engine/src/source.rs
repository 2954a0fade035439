//! Display capture collaborator and click logging.

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::time::Instant;

use screenverse_common::error::ScreenverseResult;
use screenverse_project_model::event::RecordedClick;
use screenverse_render_engine::encoder::EncodedOutput;
use screenverse_render_engine::media::{Canvas, MediaStream, VideoSource};

/// What the recorder asks the capture host for.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConstraints {
    /// Preferred capture width in pixels.
    pub ideal_width: u32,

    pub frame_rate: u32,

    /// Include the captured surface's audio.
    pub system_audio: bool,

    /// Mix in the default microphone.
    pub microphone: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 1920,
            frame_rate: 30,
            system_audio: true,
            microphone: false,
        }
    }
}

/// Fires once when the capture track ends on the host's side, e.g. when the
/// user hits the platform's "stop sharing" control.
#[derive(Debug)]
pub struct TrackEnded(Option<oneshot::Receiver<()>>);

impl TrackEnded {
    /// A signal plus the handle the host fires it with.
    pub fn channel() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self(Some(rx)))
    }

    /// Resolve when the track ends. A dropped sender counts as ended.
    pub async fn wait(&mut self) {
        if let Some(rx) = self.0.as_mut() {
            let _ = rx.await;
            self.0 = None;
        }
    }

    /// Whether the signal has already been observed.
    pub fn has_ended(&self) -> bool {
        self.0.is_none()
    }
}

/// A live display stream.
#[derive(Debug)]
pub struct LiveVideoSource {
    pub stream: MediaStream,
    pub width: u32,
    pub height: u32,
    pub ended: TrackEnded,
}

/// The host's screen capture facility.
#[async_trait]
pub trait DisplayCapture: Send + Sync {
    /// Prompt for and open a display stream.
    ///
    /// A refused prompt is reported as
    /// [`ScreenverseError::PermissionDenied`](screenverse_common::ScreenverseError::PermissionDenied).
    async fn acquire_display_stream(
        &self,
        constraints: &CaptureConstraints,
    ) -> ScreenverseResult<LiveVideoSource>;

    /// Stop every track of `stream`.
    fn release(&self, stream: &MediaStream);
}

/// Decodes a finished recording so its duration and first frame can be
/// read before it is stored.
#[async_trait]
pub trait RecordingDecoder: Send + Sync {
    /// Open the encoded recording as a seekable source.
    async fn open(&self, output: &EncodedOutput) -> ScreenverseResult<Box<dyn VideoSource>>;

    /// A scratch surface to draw the thumbnail on.
    fn canvas(&self) -> Box<dyn Canvas>;
}

/// Pointer clicks timestamped relative to the start of recording.
#[derive(Debug)]
pub struct ClickLog {
    started: Instant,
    clicks: Vec<RecordedClick>,
}

impl ClickLog {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            clicks: Vec::new(),
        }
    }

    /// Seconds since the log started.
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Log a click at surface pixel `(px, py)`.
    pub fn record(&mut self, px: f64, py: f64, surface_width: f64, surface_height: f64) {
        let click = RecordedClick::from_surface(
            self.elapsed_secs(),
            px,
            py,
            surface_width,
            surface_height,
        );
        tracing::trace!(t = click.time_secs, x = click.x, y = click.y, "Click recorded");
        self.clicks.push(click);
    }

    pub fn clicks(&self) -> &[RecordedClick] {
        &self.clicks
    }
}
