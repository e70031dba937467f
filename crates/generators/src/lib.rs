//! MangaReel Generators
//!
//! Thin adapters over the remote services the pipeline delegates to:
//! - **Script:** OpenAI-compatible completions API
//! - **Images:** OpenAI-compatible image generation API
//! - **Narration:** Google Cloud Text-to-Speech REST API
//!
//! Each adapter implements the matching trait from `mangareel-stage-core`.

mod http;
pub mod images;
pub mod narration;
pub mod script;

pub use images::OpenAiImageGenerator;
pub use narration::GoogleNarrator;
pub use script::OpenAiScriptGenerator;
