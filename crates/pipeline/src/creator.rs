//! The story-to-video controller.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use mangareel_common::config::AppConfig;
use mangareel_common::error::{MangareelError, MangareelResult};
use mangareel_generators::{GoogleNarrator, OpenAiImageGenerator, OpenAiScriptGenerator};
use mangareel_render_engine::{ProgressCallback, SlideshowAssembler, SlideshowConfig};
use mangareel_stage_core::{ImageGenerator, Narrator, ScriptGenerator, VideoAssembler};

use crate::scenes::extract_key_scenes;

/// Prompt used when the caller does not supply one.
pub const DEFAULT_STORY_PROMPT: &str = "Write a story about a young hero in a magical world.";

/// Output file used when the caller does not supply one.
pub const DEFAULT_OUTPUT_FILENAME: &str = "output_video.mp4";

/// Token cap passed to the script generator unless overridden.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Script,
    Scenes,
    Images,
    Narration,
    Assembly,
    Complete,
}

impl PipelineStage {
    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Script => "script",
            PipelineStage::Scenes => "scenes",
            PipelineStage::Images => "images",
            PipelineStage::Narration => "narration",
            PipelineStage::Assembly => "assembly",
            PipelineStage::Complete => "complete",
        }
    }
}

/// Called as each stage starts and once when the run completes.
pub type StageObserver = Arc<dyn Fn(PipelineStage) + Send + Sync>;

/// Drives script → scenes → images → narration → video.
pub struct VideoCreator {
    script_generator: Arc<dyn ScriptGenerator>,
    image_generator: Arc<dyn ImageGenerator>,
    narrator: Arc<dyn Narrator>,
    video_assembler: Arc<dyn VideoAssembler>,
    max_tokens: u32,
    observer: Option<StageObserver>,
}

impl VideoCreator {
    pub fn new(
        script_generator: Arc<dyn ScriptGenerator>,
        image_generator: Arc<dyn ImageGenerator>,
        narrator: Arc<dyn Narrator>,
        video_assembler: Arc<dyn VideoAssembler>,
    ) -> Self {
        Self {
            script_generator,
            image_generator,
            narrator,
            video_assembler,
            max_tokens: DEFAULT_MAX_TOKENS,
            observer: None,
        }
    }

    /// Wire the remote adapters and the ffmpeg assembler from configuration.
    pub fn from_config(
        config: &AppConfig,
        assembly_progress: Option<ProgressCallback>,
    ) -> MangareelResult<Self> {
        // Reject bad video settings before any remote call.
        let slideshow = SlideshowConfig::from(&config.video);
        slideshow.validate()?;

        let script_generator = OpenAiScriptGenerator::from_config(&config.services)?;
        let image_generator = OpenAiImageGenerator::from_config(&config.services)?;
        let narrator = GoogleNarrator::from_config(&config.services)?;

        let mut assembler = SlideshowAssembler::new(slideshow)
            .with_download_timeout(config.services.request_timeout_secs)?;
        if let Some(cb) = assembly_progress {
            assembler = assembler.with_progress(cb);
        }

        Ok(Self::new(
            Arc::new(script_generator),
            Arc::new(image_generator),
            Arc::new(narrator),
            Arc::new(assembler),
        )
        .with_max_tokens(config.services.script_max_tokens))
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_observer(mut self, observer: StageObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Create a video for `story_prompt` at `output_path`.
    ///
    /// Any stage error is returned as [`MangareelError::VideoCreation`].
    pub async fn create_video(
        &self,
        story_prompt: &str,
        output_path: &Path,
    ) -> MangareelResult<PathBuf> {
        let started = Instant::now();
        tracing::info!(output = %output_path.display(), "Starting video creation");

        match self.run(story_prompt, output_path).await {
            Ok(path) => {
                self.notify(PipelineStage::Complete);
                tracing::info!(
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    output = %path.display(),
                    "Video creation complete"
                );
                Ok(path)
            }
            Err(e) => {
                tracing::error!(error = %e, "Video creation failed");
                Err(MangareelError::video_creation(e))
            }
        }
    }

    async fn run(&self, story_prompt: &str, output_path: &Path) -> MangareelResult<PathBuf> {
        self.notify(PipelineStage::Script);
        tracing::debug!(prompt = story_prompt, "Story prompt");
        let script = self
            .script_generator
            .generate_script(story_prompt, self.max_tokens)
            .await?;

        self.notify(PipelineStage::Scenes);
        let scenes = extract_key_scenes(&script);
        tracing::info!(scenes = scenes.len(), "Scenes extracted");

        self.notify(PipelineStage::Images);
        let images = self.image_generator.generate_images(&scenes).await?;

        self.notify(PipelineStage::Narration);
        let narration = self.narrator.generate_narration(&script.text).await?;

        self.notify(PipelineStage::Assembly);
        self.video_assembler
            .create_video(&images, &narration, output_path)
            .await
    }

    fn notify(&self, stage: PipelineStage) {
        tracing::debug!(stage = stage.label(), "Pipeline stage");
        if let Some(observer) = &self.observer {
            observer(stage);
        }
    }
}
