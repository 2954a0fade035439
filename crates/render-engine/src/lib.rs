//! ScreenVerse Render Engine
//!
//! Offline export pipeline that composites a decoded clip with its
//! editing decisions (trims, zooms, background, aspect ratio) and streams
//! the result into an encoder.
//!
//! # Pipeline Architecture
//!
//! ```text
//! regions ─────┐
//!              ├── plan_export (canvas, placement, fps, frame timeline, zoom lookup)
//! source ──────┘         │
//!                        ▼
//!              for each frame: seek ─ background ─ crop/scale ─ progress
//!                        │
//! canvas stream ─────────┴── Recorder ──► EncodedOutput
//! ```
//!
//! The host supplies the video source, canvas, image loader and recorder
//! through the traits in [`media`] and [`encoder`].

pub mod background;
pub mod compositor;
pub mod encoder;
pub mod export;
pub mod media;
pub mod metadata;

pub use compositor::{plan_export, ExportPlan, FrameComposition, SourceInfo};
pub use encoder::{EncodedOutput, Recorder, RecorderFactory, RecorderOptions};
pub use export::*;
pub use media::{Canvas, ImageLoader, LoadedImage, MediaStream, Rgba, VideoSource};
