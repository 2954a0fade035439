//! ScreenVerse Project Model
//!
//! Defines the core data contracts for ScreenVerse clips:
//! - **Regions:** Trim and zoom edit operations over a bounded timeline
//! - **History:** Undo/redo snapshots of the region set
//! - **Project:** Export configuration (aspect ratio, background, frame rate)
//! - **Viewport:** Letterbox placement and zoom crop geometry
//! - **Events:** Pointer clicks recorded during capture
//! - **Store:** Clip persistence and the one-shot region import buffer
//!
//! Times are `f64` seconds; zoom centers are percentages of the frame.

pub mod event;
pub mod history;
pub mod import;
pub mod project;
pub mod region;
pub mod store;
pub mod viewport;

pub use event::*;
pub use history::*;
pub use import::*;
pub use project::*;
pub use region::*;
pub use store::*;
pub use viewport::*;
