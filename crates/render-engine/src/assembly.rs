//! Video assembly: backend contract, ffmpeg backend, and the
//! [`VideoAssembler`] implementation used by the pipeline.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Instant;

use mangareel_common::error::{MangareelError, MangareelResult};
use mangareel_stage_core::{ImageLocation, NarrationAudio, VideoAssembler};

use crate::slideshow::{SlideshowConfig, SlideshowPlan};
use crate::staging::{download_client, stage_inputs, DEFAULT_DOWNLOAD_TIMEOUT_SECS};

/// Progress callback for video assembly.
pub type ProgressCallback = Arc<dyn Fn(AssemblyProgress) + Send + Sync>;

/// Assembly progress report.
#[derive(Debug, Clone)]
pub struct AssemblyProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames encoded so far.
    pub frames_rendered: u64,

    /// Total frames to encode.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: AssemblyStage,
}

/// Stages of the assembly process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyStage {
    Staging,
    Encoding,
    Finalizing,
    Complete,
}

/// Trait for render backends.
pub trait RenderBackend: Send + Sync {
    /// Execute the plan, writing `plan.output_path`.
    fn render(
        &self,
        plan: &SlideshowPlan,
        progress: Option<&ProgressCallback>,
    ) -> MangareelResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Renders slideshows with the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    binary: String,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }

    /// Use a specific ffmpeg executable.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(
        &self,
        plan: &SlideshowPlan,
        progress: Option<&ProgressCallback>,
    ) -> MangareelResult<()> {
        tracing::debug!(args = ?plan.ffmpeg_args, "Running ffmpeg");
        let mut cmd = Command::new(&self.binary);
        cmd.args(&plan.ffmpeg_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| MangareelError::assembly(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            clips = plan.clip_count,
            total_frames = plan.total_frames,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MangareelError::assembly("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MangareelError::assembly("Failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once the stderr pipe fills up.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut latest = ProgressState::default();
        loop {
            line.clear();
            let bytes = reader.read_line(&mut line).map_err(|e| {
                MangareelError::assembly(format!("Failed reading ffmpeg progress: {e}"))
            })?;
            if bytes == 0 {
                break;
            }

            if let Some((key, value)) = line.trim().split_once('=') {
                latest.update(key, value);
                if key == "progress" {
                    if let Some(cb) = progress {
                        cb(progress_report(
                            &latest,
                            plan.total_frames,
                            plan.total_duration_secs,
                            start.elapsed().as_secs_f64(),
                        ));
                    }
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| MangareelError::assembly(format!("Failed to wait on ffmpeg: {e}")))?;

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(MangareelError::assembly(format!(
                "ffmpeg failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        Ok(())
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Builds slideshow videos from generated images and narration.
pub struct SlideshowAssembler {
    config: SlideshowConfig,
    backend: Arc<dyn RenderBackend>,
    client: reqwest::Client,
    progress: Option<ProgressCallback>,
}

impl SlideshowAssembler {
    /// An assembler using the ffmpeg backend.
    pub fn new(config: SlideshowConfig) -> Self {
        Self::with_backend(config, Arc::new(FfmpegBackend::new()))
    }

    pub fn with_backend(config: SlideshowConfig, backend: Arc<dyn RenderBackend>) -> Self {
        Self {
            config,
            backend,
            client: download_client(DEFAULT_DOWNLOAD_TIMEOUT_SECS).unwrap_or_default(),
            progress: None,
        }
    }

    /// Bound every image download by `timeout_secs`.
    pub fn with_download_timeout(mut self, timeout_secs: u64) -> MangareelResult<Self> {
        self.client = download_client(timeout_secs)?;
        Ok(self)
    }

    /// Report encoding progress through `callback`.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &SlideshowConfig {
        &self.config
    }

    async fn assemble(
        &self,
        images: &[ImageLocation],
        audio: &NarrationAudio,
        output_path: &Path,
    ) -> MangareelResult<PathBuf> {
        let started = Instant::now();

        if images.is_empty() {
            return Err(MangareelError::assembly("no images to assemble"));
        }
        self.config.validate()?;

        if !self.backend.is_available() {
            return Err(MangareelError::unsupported(format!(
                "No supported render backend found (expected {} in PATH)",
                self.backend.name()
            )));
        }

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        self.notify(AssemblyProgress {
            progress: 0.0,
            frames_rendered: 0,
            total_frames: 0,
            eta_secs: 0.0,
            stage: AssemblyStage::Staging,
        });

        let staged = stage_inputs(&self.client, images, audio).await?;
        let plan = SlideshowPlan::build(&staged.images, &staged.audio, output_path, &self.config)?;
        tracing::info!(
            backend = self.backend.name(),
            clips = plan.clip_count,
            duration_secs = plan.total_duration_secs,
            output = %output_path.display(),
            "Encoding slideshow"
        );

        let backend = Arc::clone(&self.backend);
        let progress = self.progress.clone();
        let render_plan = plan.clone();
        tokio::task::spawn_blocking(move || backend.render(&render_plan, progress.as_ref()))
            .await
            .map_err(|e| MangareelError::assembly(format!("render task failed: {e}")))??;

        // The staging directory must outlive the render.
        drop(staged);

        self.notify(AssemblyProgress {
            progress: 1.0,
            frames_rendered: plan.total_frames,
            total_frames: plan.total_frames,
            eta_secs: 0.0,
            stage: AssemblyStage::Finalizing,
        });

        let report_path = write_report(
            images,
            audio,
            &plan,
            &self.config,
            self.backend.name(),
            started,
        )?;
        tracing::info!(report = %report_path.display(), "Wrote assembly report");

        self.notify(AssemblyProgress {
            progress: 1.0,
            frames_rendered: plan.total_frames,
            total_frames: plan.total_frames,
            eta_secs: 0.0,
            stage: AssemblyStage::Complete,
        });

        tracing::info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            output = %output_path.display(),
            "Assembly finished"
        );
        Ok(output_path.to_path_buf())
    }

    fn notify(&self, report: AssemblyProgress) {
        if let Some(cb) = &self.progress {
            cb(report);
        }
    }
}

#[async_trait::async_trait]
impl VideoAssembler for SlideshowAssembler {
    async fn create_video(
        &self,
        images: &[ImageLocation],
        audio: &NarrationAudio,
        output_path: &Path,
    ) -> MangareelResult<PathBuf> {
        tracing::info!(
            images = images.len(),
            audio_bytes = audio.len(),
            "Assembling video"
        );

        self.assemble(images, audio, output_path)
            .await
            .map_err(|e| match e {
                MangareelError::Assembly { .. } => e,
                other => MangareelError::assembly(other.to_string()),
            })
    }
}

/// Path of the report written next to `output_path`: the output file name
/// with `.assembly.json` appended.
pub fn report_path_for(output_path: &Path) -> PathBuf {
    let mut name = output_path.as_os_str().to_os_string();
    name.push(".assembly.json");
    PathBuf::from(name)
}

fn write_report(
    images: &[ImageLocation],
    audio: &NarrationAudio,
    plan: &SlideshowPlan,
    config: &SlideshowConfig,
    backend: &str,
    started: Instant,
) -> MangareelResult<PathBuf> {
    let report_path = report_path_for(&plan.output_path);
    let report = serde_json::json!({
        "output": plan.output_path,
        "backend": backend,
        "created_at": chrono::Utc::now().to_rfc3339(),
        "images": images.iter().map(ImageLocation::as_str).collect::<Vec<_>>(),
        "audio_bytes": audio.len(),
        "audio_encoding": audio.encoding,
        "clip_duration_secs": config.clip_duration_secs,
        "total_duration_secs": plan.total_duration_secs,
        "total_frames": plan.total_frames,
        "width": config.width,
        "height": config.height,
        "fps": config.fps,
        "video_codec": config.video_codec,
        "audio_codec": config.audio_codec,
        "elapsed_secs": started.elapsed().as_secs_f64(),
    });
    std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;
    Ok(report_path)
}

/// Whether `binary` resolves on PATH.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both names.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> AssemblyProgress {
    let progress = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };

    let frames_rendered = (progress * total_frames as f64).round() as u64;
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    AssemblyProgress {
        progress: if state.complete { 1.0 } else { progress },
        frames_rendered,
        total_frames,
        eta_secs,
        stage: if state.complete {
            AssemblyStage::Finalizing
        } else {
            AssemblyStage::Encoding
        },
    }
}
