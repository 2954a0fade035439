//! Media collaborators the compositor drives.
//!
//! These traits abstract the host's decoded video element, 2D drawing
//! surface and image decoder. Implementations live with the host; the
//! engine only sequences calls.

use async_trait::async_trait;

use screenverse_common::error::ScreenverseResult;
use screenverse_project_model::viewport::Rect;

/// An RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// A live media stream handed from a producer (canvas, display capture)
/// to a recorder.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaStream {
    /// Host-assigned stream identifier.
    pub id: String,

    /// Frame rate the producer reports, if any.
    pub frame_rate: Option<f64>,

    pub has_audio: bool,
}

/// A seekable decoded video.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Intrinsic frame size in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Duration in seconds. May be infinite or NaN for freshly recorded
    /// streams until the container has been scanned.
    fn duration(&self) -> f64;

    /// Current playhead in seconds.
    fn current_time(&self) -> f64;

    /// Frame rate reported by the source's capture stream, if any.
    fn reported_frame_rate(&self) -> Option<f64>;

    /// Number of frames decoded so far, if the host tracks it.
    fn decoded_frame_count(&self) -> Option<u64>;

    /// Move the playhead and resolve once the source signals seek
    /// completion. The signal may be late or never arrive; callers bound
    /// this with a timeout.
    async fn seek(&mut self, time_secs: f64);
}

/// A decoded image ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    /// Where the image was loaded from; the host's key for its pixels.
    pub source: String,
    pub width: u32,
    pub height: u32,
}

/// Asynchronous image decoding.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, source: &str) -> ScreenverseResult<LoadedImage>;
}

/// A fixed-size 2D drawing surface.
pub trait Canvas: Send {
    fn resize(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);

    /// Fill the whole surface with a solid color.
    fn fill(&mut self, color: Rgba);

    /// Reset the whole surface to transparent.
    fn clear(&mut self);

    fn draw_image(&mut self, image: &LoadedImage, dst: Rect);

    /// Draw the `src` crop of the source's current frame into `dst`.
    fn draw_video(&mut self, source: &dyn VideoSource, src: Rect, dst: Rect);

    /// Start streaming the surface's contents at `fps`.
    fn capture_stream(&mut self, fps: u32) -> MediaStream;

    /// Encode the current contents as PNG.
    fn snapshot_png(&self) -> ScreenverseResult<Vec<u8>>;
}
