//! ScreenVerse Processing Core
//!
//! Interactive editing logic over the region model:
//! - **Governor:** Playback state machine (zoom looping, trim skipping,
//!   zoom-center picking)
//! - **Zoom Preview:** CSS-like transform for the preview element
//! - **Auto-Zoom:** Zoom regions derived from clicks recorded during capture
//! - **Session:** One clip's regions, history and playback, owned by the caller
//!
//! This crate is pure computation: no I/O, no media APIs. The host feeds in
//! time updates and pointer clicks and applies the returned commands.

pub mod auto_zoom;
pub mod governor;
pub mod session;
pub mod zoom_preview;

pub use auto_zoom::AutoZoomAnalyzer;
pub use governor::{PlaybackCommand, PlaybackGovernor, PlaybackMode};
pub use session::EditorSession;
pub use zoom_preview::{ZoomAnimator, ZoomPreview, ZoomStyle};
