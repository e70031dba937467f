//! Run the story-to-video pipeline.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use mangareel_common::config::AppConfig;
use mangareel_pipeline::{PipelineStage, VideoCreator};
use mangareel_render_engine::{
    report_path_for, AssemblyProgress, AssemblyStage, ProgressCallback,
};

pub async fn run(
    mut config: AppConfig,
    prompt: String,
    output: PathBuf,
    max_tokens: Option<u32>,
    clip_secs: Option<f64>,
) -> anyhow::Result<()> {
    if let Some(tokens) = max_tokens {
        config.services.script_max_tokens = tokens;
    }
    if let Some(secs) = clip_secs {
        config.video.clip_duration_secs = secs;
    }

    println!("Creating video");
    println!("  Prompt: {prompt}");
    println!("  Output: {}", output.display());
    println!(
        "  Clips: {:.1}s at {}x{} @ {}fps",
        config.video.clip_duration_secs, config.video.width, config.video.height, config.video.fps
    );

    let progress: ProgressCallback = Arc::new(|p: AssemblyProgress| {
        if p.stage == AssemblyStage::Encoding {
            print!(
                "\r  Encoding: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
                p.progress * 100.0,
                p.frames_rendered,
                p.total_frames,
                p.eta_secs,
            );
            std::io::stdout().flush().ok();
        }
    });

    let creator = VideoCreator::from_config(&config, Some(progress))
        .map_err(|e| anyhow::anyhow!("Failed to set up pipeline: {e}"))?
        .with_observer(Arc::new(|stage: PipelineStage| match stage {
            PipelineStage::Complete => {}
            PipelineStage::Assembly => println!("  [{}] encoding video", stage.label()),
            other => println!("  [{}] ...", other.label()),
        }));

    let written = creator.create_video(&prompt, &output).await?;

    println!("\nVideo created: {}", written.display());
    println!("  Report: {}", report_path_for(&written).display());
    Ok(())
}
