//! Check system capabilities.

use mangareel_common::config::{
    AppConfig, GOOGLE_API_KEY_ENV, IMAGE_API_KEY_ENV, OPENAI_API_KEY_ENV,
};
use mangareel_render_engine::command_exists;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("MangaReel System Check");
    println!("{}", "=".repeat(50));

    let ffmpeg = command_exists("ffmpeg");
    report(ffmpeg, "ffmpeg on PATH", "install ffmpeg to assemble videos");

    let services = &config.services;
    let text_key = services.openai_api_key.is_some();
    let image_key = services.image_key().is_some();
    let tts_key = services.google_api_key.is_some();

    report(
        text_key,
        &format!("Script generation key ({})", services.script_model),
        &format!("set {OPENAI_API_KEY_ENV}"),
    );
    report(
        image_key,
        &format!("Image generation key ({})", services.image_model),
        &format!("set {IMAGE_API_KEY_ENV} or {OPENAI_API_KEY_ENV}"),
    );
    report(
        tts_key,
        &format!("Narration key ({} {})", services.voice_language, services.voice_gender),
        &format!("set {GOOGLE_API_KEY_ENV}"),
    );

    println!();
    if ffmpeg && text_key && image_key && tts_key {
        println!("All required capabilities are available. MangaReel is ready.");
    } else {
        println!("Some required capabilities are missing. See above for fixes.");
    }

    Ok(())
}

fn report(ok: bool, what: &str, fix: &str) {
    if ok {
        println!("[OK]   {what}");
    } else {
        println!("[MISS] {what}: {fix}");
    }
}
