//! Stage traits implemented by remote adapters and the render engine.
//!
//! Each stage reports failure through its own [`MangareelError`] variant
//! (`Script`, `Image`, `Narration`, `Assembly`).

use std::path::{Path, PathBuf};

use mangareel_common::error::{MangareelError, MangareelResult};

use crate::values::{ImageLocation, NarrationAudio, ScenePrompt, Script};

/// Turns a story prompt into a script.
#[async_trait::async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Generate a script of at most `max_tokens` tokens.
    async fn generate_script(&self, prompt: &str, max_tokens: u32) -> MangareelResult<Script>;
}

/// Turns scene descriptions into images.
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate a single image. Errors are returned unwrapped;
    /// [`ImageGenerator::generate_images`] attaches the prompt.
    async fn generate_image(&self, prompt: &ScenePrompt) -> MangareelResult<ImageLocation>;

    /// Generate one image per prompt, in order. Stops at the first failure.
    async fn generate_images(
        &self,
        prompts: &[ScenePrompt],
    ) -> MangareelResult<Vec<ImageLocation>> {
        let mut images = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let image = self
                .generate_image(prompt)
                .await
                .map_err(|e| MangareelError::image(&prompt.description, e.to_string()))?;
            images.push(image);
        }
        Ok(images)
    }
}

/// Turns script text into spoken audio.
#[async_trait::async_trait]
pub trait Narrator: Send + Sync {
    async fn generate_narration(&self, text: &str) -> MangareelResult<NarrationAudio>;
}

/// Combines images and narration into a video file.
#[async_trait::async_trait]
pub trait VideoAssembler: Send + Sync {
    /// Write the video to `output_path` and return the path written.
    async fn create_video(
        &self,
        images: &[ImageLocation],
        audio: &NarrationAudio,
        output_path: &Path,
    ) -> MangareelResult<PathBuf>;
}
