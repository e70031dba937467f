//! MangaReel Pipeline
//!
//! The controller that turns a story prompt into a video by calling each
//! stage once, in a fixed order:
//!
//! ```text
//! prompt ─► script ─► scene prompts ─► images ─► narration ─► video
//! ```
//!
//! A failing stage aborts the run; later stages are never invoked.

pub mod creator;
pub mod scenes;

pub use creator::*;
pub use scenes::*;
