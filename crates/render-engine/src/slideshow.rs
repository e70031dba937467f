//! Slideshow planning: turns staged inputs into an ffmpeg invocation.
//!
//! Planning is pure; nothing here touches the filesystem or spawns a
//! process, so the argument layout can be checked without ffmpeg.

use std::path::{Path, PathBuf};

use mangareel_common::config::VideoDefaults;
use mangareel_common::error::{MangareelError, MangareelResult};
use serde::{Deserialize, Serialize};

/// Encoding parameters for a slideshow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideshowConfig {
    /// Seconds each image stays on screen.
    pub clip_duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self::from(&VideoDefaults::default())
    }
}

impl From<&VideoDefaults> for SlideshowConfig {
    fn from(video: &VideoDefaults) -> Self {
        Self {
            clip_duration_secs: video.clip_duration_secs,
            width: video.width,
            height: video.height,
            fps: video.fps,
            video_codec: video.video_codec.clone(),
            audio_codec: video.audio_codec.clone(),
        }
    }
}

impl SlideshowConfig {
    /// Reject settings ffmpeg cannot encode.
    pub fn validate(&self) -> MangareelResult<()> {
        if !self.clip_duration_secs.is_finite() || self.clip_duration_secs <= 0.0 {
            return Err(MangareelError::config(format!(
                "clip duration must be positive, got {}",
                self.clip_duration_secs
            )));
        }
        if self.width < 2 || self.height < 2 {
            return Err(MangareelError::config(format!(
                "output size {}x{} is too small",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(MangareelError::config("fps must be at least 1"));
        }
        if self.video_codec.trim().is_empty() || self.audio_codec.trim().is_empty() {
            return Err(MangareelError::config("codecs must not be empty"));
        }
        Ok(())
    }

    /// yuv420p needs even dimensions.
    fn even_size(&self) -> (u32, u32) {
        (self.width & !1, self.height & !1)
    }
}

/// A fully resolved ffmpeg run.
#[derive(Debug, Clone)]
pub struct SlideshowPlan {
    pub ffmpeg_args: Vec<String>,
    pub output_path: PathBuf,
    pub clip_count: usize,
    pub total_duration_secs: f64,
    pub total_frames: u64,
}

impl SlideshowPlan {
    /// Plan a slideshow of `images` (local files, in display order) over
    /// `audio`, written to `output_path`.
    ///
    /// The output runs for exactly `images.len() * clip_duration_secs`;
    /// narration beyond that is cut.
    pub fn build(
        images: &[PathBuf],
        audio: &Path,
        output_path: &Path,
        config: &SlideshowConfig,
    ) -> MangareelResult<Self> {
        if images.is_empty() {
            return Err(MangareelError::assembly("no images to assemble"));
        }
        config.validate()?;

        let clip_count = images.len();
        let total_duration_secs = clip_count as f64 * config.clip_duration_secs;
        let total_frames = (total_duration_secs * config.fps as f64).round() as u64;
        let clip = format_secs(config.clip_duration_secs);
        let fps = config.fps.to_string();

        let mut args: Vec<String> = [
            "-y",
            "-hide_banner",
            "-nostats",
            "-loglevel",
            "error",
            "-progress",
            "pipe:1",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        for image in images {
            args.extend([
                "-loop".to_string(),
                "1".to_string(),
                "-framerate".to_string(),
                fps.clone(),
                "-t".to_string(),
                clip.clone(),
                "-i".to_string(),
                image.display().to_string(),
            ]);
        }
        args.extend(["-i".to_string(), audio.display().to_string()]);

        args.extend([
            "-filter_complex".to_string(),
            build_filter_graph(clip_count, config),
            "-map".to_string(),
            "[vout]".to_string(),
            "-map".to_string(),
            format!("{clip_count}:a:0"),
        ]);
        args.extend(codec_args(config));
        args.extend([
            "-t".to_string(),
            format_secs(total_duration_secs),
            output_path.display().to_string(),
        ]);

        Ok(Self {
            ffmpeg_args: args,
            output_path: output_path.to_path_buf(),
            clip_count,
            total_duration_secs,
            total_frames,
        })
    }
}

/// Scale and letterbox every input to the output size, then concatenate.
fn build_filter_graph(clip_count: usize, config: &SlideshowConfig) -> String {
    let (w, h) = config.even_size();
    let mut chains: Vec<String> = (0..clip_count)
        .map(|i| {
            format!(
                "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                 pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format=yuv420p[v{i}]",
                fps = config.fps
            )
        })
        .collect();

    let labels: String = (0..clip_count).map(|i| format!("[v{i}]")).collect();
    chains.push(format!("{labels}concat=n={clip_count}:v=1:a=0[vout]"));
    chains.join(";")
}

fn codec_args(config: &SlideshowConfig) -> Vec<String> {
    let mut args = vec!["-c:v".to_string(), config.video_codec.clone()];
    if config.video_codec == "libx264" {
        args.extend([
            "-preset".to_string(),
            "medium".to_string(),
            "-profile:v".to_string(),
            "high".to_string(),
        ]);
    }
    args.extend([
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-r".to_string(),
        config.fps.to_string(),
        "-c:a".to_string(),
        config.audio_codec.clone(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]);
    args
}

fn format_secs(secs: f64) -> String {
    format!("{secs:.3}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(n: usize) -> Vec<PathBuf> {
        (0..n)
            .map(|i| PathBuf::from(format!("/stage/image-{i:02}.png")))
            .collect()
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
        args.windows(2)
            .filter(|w| w[0] == flag)
            .map(|w| w[1].as_str())
            .collect()
    }

    #[test]
    fn test_plan_durations() {
        let plan = SlideshowPlan::build(
            &images(3),
            Path::new("/stage/narration.mp3"),
            Path::new("out.mp4"),
            &SlideshowConfig::default(),
        )
        .unwrap();

        assert_eq!(plan.clip_count, 3);
        assert!((plan.total_duration_secs - 15.0).abs() < 1e-9);
        assert_eq!(plan.total_frames, 360);
        assert_eq!(plan.ffmpeg_args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn test_plan_inputs_in_order_with_audio_last() {
        let plan = SlideshowPlan::build(
            &images(2),
            Path::new("/stage/narration.mp3"),
            Path::new("out.mp4"),
            &SlideshowConfig::default(),
        )
        .unwrap();

        assert_eq!(
            value_after(&plan.ffmpeg_args, "-i"),
            vec![
                "/stage/image-00.png",
                "/stage/image-01.png",
                "/stage/narration.mp3"
            ]
        );
        assert_eq!(
            value_after(&plan.ffmpeg_args, "-map"),
            vec!["[vout]", "2:a:0"]
        );
        // Per-clip -t then the overall cap.
        assert_eq!(
            value_after(&plan.ffmpeg_args, "-t"),
            vec!["5.000", "5.000", "10.000"]
        );
    }

    #[test]
    fn test_codecs_follow_config() {
        let plan = SlideshowPlan::build(
            &images(1),
            Path::new("a.mp3"),
            Path::new("o.mp4"),
            &SlideshowConfig::default(),
        )
        .unwrap();
        assert_eq!(value_after(&plan.ffmpeg_args, "-c:v"), vec!["libx264"]);
        assert_eq!(value_after(&plan.ffmpeg_args, "-c:a"), vec!["aac"]);
        assert_eq!(value_after(&plan.ffmpeg_args, "-preset"), vec!["medium"]);
    }

    #[test]
    fn test_filter_graph_concatenates_all_clips() {
        let graph = build_filter_graph(3, &SlideshowConfig::default());
        assert!(graph.starts_with("[0:v]scale=1280:720:force_original_aspect_ratio=decrease,"));
        assert!(graph.contains("[2:v]scale="));
        assert!(graph.ends_with("[v0][v1][v2]concat=n=3:v=1:a=0[vout]"));
        assert_eq!(graph.matches(';').count(), 3);
    }

    #[test]
    fn test_odd_dimensions_rounded_down() {
        let config = SlideshowConfig {
            width: 721,
            height: 481,
            ..SlideshowConfig::default()
        };
        let graph = build_filter_graph(1, &config);
        assert!(graph.contains("scale=720:480:"));
        assert!(graph.contains("pad=720:480:"));
    }

    #[test]
    fn test_rejects_empty_and_invalid() {
        let err = SlideshowPlan::build(
            &[],
            Path::new("a.mp3"),
            Path::new("o.mp4"),
            &SlideshowConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Failed to assemble video: no images to assemble");

        let zero_clip = SlideshowConfig {
            clip_duration_secs: 0.0,
            ..SlideshowConfig::default()
        };
        assert!(zero_clip.validate().is_err());

        let zero_fps = SlideshowConfig {
            fps: 0,
            ..SlideshowConfig::default()
        };
        assert!(zero_fps.validate().is_err());
    }
}
