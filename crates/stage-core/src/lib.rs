//! MangaReel stage contracts.
//!
//! This crate contains the values handed from one pipeline stage to the
//! next and the traits each stage implements, so the controller can drive
//! remote adapters and the render engine without depending on them.
//!
//! ```text
//! prompt ─► ScriptGenerator ─► Script ─► scenes ─► ImageGenerator ─► [ImageLocation]
//!                                │                                        │
//!                                └──► Narrator ─► NarrationAudio ─────────┤
//!                                                                         ▼
//!                                                                  VideoAssembler
//! ```

pub mod stages;
pub mod values;

pub use stages::*;
pub use values::*;
