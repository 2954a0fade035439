//! ScreenVerse Capture Engine
//!
//! Runs a recording session: prompts the host for a display stream, feeds
//! it to a streaming recorder, logs pointer clicks, and on stop saves the
//! clip to the store and stages click-derived zoom regions for the editor.
//! A host [`RecordingDecoder`] lets the saved clip carry its decoded duration
//! and a first-frame thumbnail.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               RecordingSession               │
//! │  ┌────────────────┐ ┌──────────┐ ┌─────────┐ │
//! │  │ DisplayCapture │ │ Recorder │ │ClickLog │ │
//! │  └───────┬────────┘ └────┬─────┘ └────┬────┘ │
//! │          ▼               ▼            ▼      │
//! │  ┌────────────────┐  ┌─────────────────────┐ │
//! │  │   ClipStore    │  │    ImportBuffer     │ │
//! │  │ clip.bin meta  │  │ pending-regions.json│ │
//! │  └────────────────┘  └─────────────────────┘ │
//! └──────────────────────────────────────────────┘
//! ```

pub mod session;
pub mod source;

pub use session::*;
pub use source::*;
