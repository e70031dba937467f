//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the text-generation API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable holding a dedicated image-generation API key.
pub const IMAGE_API_KEY_ENV: &str = "MANGAREEL_IMAGE_API_KEY";
/// Environment variable holding the speech-synthesis API key.
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";

const REDACTED: &str = "<redacted>";

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote service endpoints, models, and credentials.
    #[serde(default)]
    pub services: ServiceConfig,

    /// Video assembly defaults.
    #[serde(default)]
    pub video: VideoDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the OpenAI-compatible completions API.
    pub openai_base_url: String,

    /// API key for text generation (and image generation if no dedicated key).
    pub openai_api_key: Option<String>,

    /// Completions model used for script generation.
    pub script_model: String,

    /// Token cap for a generated script.
    pub script_max_tokens: u32,

    /// Base URL of the image generation API.
    pub image_base_url: String,

    /// Dedicated image-generation key.
    pub image_api_key: Option<String>,

    /// Image model name.
    pub image_model: String,

    /// Requested image size, e.g. "1024x1024".
    pub image_size: String,

    /// Base URL of the Cloud Text-to-Speech REST API.
    pub tts_base_url: String,

    /// Google API key for speech synthesis.
    pub google_api_key: Option<String>,

    /// BCP-47 voice language.
    pub voice_language: String,

    /// SSML gender: NEUTRAL, MALE, FEMALE.
    pub voice_gender: String,

    /// Audio encoding requested from the synthesizer (MP3, LINEAR16, OGG_OPUS).
    pub audio_encoding: String,

    /// Per-request timeout for every remote call.
    pub request_timeout_secs: u64,
}

/// Default video assembly parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoDefaults {
    /// How long each image stays on screen.
    pub clip_duration_secs: f64,

    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,

    /// Output frame rate.
    pub fps: u32,

    /// ffmpeg video encoder.
    pub video_codec: String,

    /// ffmpeg audio encoder.
    pub audio_codec: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "mangareel=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            services: ServiceConfig::default(),
            video: VideoDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_api_key: None,
            script_model: "gpt-3.5-turbo-instruct".to_string(),
            script_max_tokens: 1000,
            image_base_url: "https://api.openai.com/v1".to_string(),
            image_api_key: None,
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            tts_base_url: "https://texttospeech.googleapis.com/v1".to_string(),
            google_api_key: None,
            voice_language: "en-US".to_string(),
            voice_gender: "NEUTRAL".to_string(),
            audio_encoding: "MP3".to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl Default for VideoDefaults {
    fn default() -> Self {
        Self {
            clip_duration_secs: 5.0,
            width: 1280,
            height: 720,
            fps: 24,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl ServiceConfig {
    /// Key used for image generation: the dedicated key, else the text key.
    pub fn image_key(&self) -> Option<&str> {
        self.image_api_key
            .as_deref()
            .or(self.openai_api_key.as_deref())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults,
    /// then apply secrets from the process environment.
    pub fn load() -> Self {
        let mut config = Self::load_file();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Load only what the config file holds, without environment secrets.
    pub fn load_file() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path. A missing or malformed file
    /// yields the defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Overwrite credentials with values found through `lookup`.
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(OPENAI_API_KEY_ENV) {
            self.services.openai_api_key = Some(key);
        }
        if let Some(key) = non_empty(IMAGE_API_KEY_ENV) {
            self.services.image_api_key = Some(key);
        }
        if let Some(key) = non_empty(GOOGLE_API_KEY_ENV) {
            self.services.google_api_key = Some(key);
        }
    }

    /// A copy with every credential replaced by a placeholder, safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        let hide = |key: &mut Option<String>| {
            if key.is_some() {
                *key = Some(REDACTED.to_string());
            }
        };
        hide(&mut copy.services.openai_api_key);
        hide(&mut copy.services.image_api_key);
        hide(&mut copy.services.google_api_key);
        copy
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<PathBuf, std::io::Error> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("mangareel").join("config.json")
}
