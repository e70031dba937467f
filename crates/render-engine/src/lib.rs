//! MangaReel Render Engine
//!
//! Assembles generated images and narration into a slideshow video.
//!
//! # Pipeline Architecture
//!
//! ```text
//! image URLs ──► download ──┐
//! local paths ──► verify ───┤
//!                           ├── Scale/Pad (output size) ── Concat ──┐
//! narration bytes ──► stage ────────────────────────────────────────┤
//!                                                                   ▼
//!                                                     Encode (libx264 + aac)
//!                                                                   │
//!                                                                   ▼
//!                                                output.mp4 + output.mp4.assembly.json
//! ```

pub mod assembly;
pub mod slideshow;
pub mod staging;

pub use assembly::*;
pub use slideshow::{SlideshowConfig, SlideshowPlan};
