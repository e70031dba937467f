//! Narration through the Google Cloud Text-to-Speech REST API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use mangareel_common::config::ServiceConfig;
use mangareel_common::error::{MangareelError, MangareelResult};
use mangareel_stage_core::{AudioEncoding, NarrationAudio, Narrator};
use serde::{Deserialize, Serialize};

use crate::http;

const DEFAULT_BASE_URL: &str = "https://texttospeech.googleapis.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Voice parameters sent with every synthesis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSelection {
    pub language_code: String,
    pub ssml_gender: String,
    pub encoding: AudioEncoding,
}

impl Default for VoiceSelection {
    fn default() -> Self {
        Self {
            language_code: "en-US".to_string(),
            ssml_gender: "NEUTRAL".to_string(),
            encoding: AudioEncoding::Mp3,
        }
    }
}

pub struct GoogleNarrator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    voice: VoiceSelection,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceParams<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceParams<'a> {
    language_code: &'a str,
    ssml_gender: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: AudioEncoding,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

impl GoogleNarrator {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        voice: VoiceSelection,
    ) -> MangareelResult<Self> {
        Ok(Self {
            client: http::build_client(DEFAULT_TIMEOUT_SECS)?,
            api_key: http::require_key(Some(&api_key), "Google")?,
            base_url: http::normalize_base_url(base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)),
            voice,
        })
    }

    pub fn from_config(services: &ServiceConfig) -> MangareelResult<Self> {
        let voice = VoiceSelection {
            language_code: services.voice_language.clone(),
            ssml_gender: services.voice_gender.trim().to_ascii_uppercase(),
            encoding: services.audio_encoding.parse()?,
        };
        Ok(Self {
            client: http::build_client(services.request_timeout_secs)?,
            api_key: http::require_key(services.google_api_key.as_deref(), "Google")?,
            base_url: http::normalize_base_url(&services.tts_base_url),
            voice,
        })
    }

    pub fn voice(&self) -> &VoiceSelection {
        &self.voice
    }

    fn build_request<'a>(&'a self, text: &'a str) -> SynthesizeRequest<'a> {
        SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceParams {
                language_code: &self.voice.language_code,
                ssml_gender: &self.voice.ssml_gender,
            },
            audio_config: AudioConfig {
                audio_encoding: self.voice.encoding,
            },
        }
    }

    async fn synthesize(&self, text: &str) -> MangareelResult<NarrationAudio> {
        let url = format!("{}/text:synthesize", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.build_request(text))
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let body: SynthesizeResponse = http::read_json(response).await?;
        decode_audio(body, self.voice.encoding)
    }
}

#[async_trait::async_trait]
impl Narrator for GoogleNarrator {
    async fn generate_narration(&self, text: &str) -> MangareelResult<NarrationAudio> {
        tracing::info!(
            chars = text.chars().count(),
            language = %self.voice.language_code,
            encoding = self.voice.encoding.as_str(),
            "Synthesizing narration"
        );

        let audio = self
            .synthesize(text)
            .await
            .map_err(|e| MangareelError::narration(e.to_string()))?;

        tracing::info!(bytes = audio.len(), "Narration synthesized");
        Ok(audio)
    }
}

fn decode_audio(
    body: SynthesizeResponse,
    encoding: AudioEncoding,
) -> MangareelResult<NarrationAudio> {
    if body.audio_content.is_empty() {
        return Err(MangareelError::invalid_response(
            "synthesis returned no audio content",
        ));
    }
    let bytes = STANDARD
        .decode(body.audio_content.as_bytes())
        .map_err(|e| {
            MangareelError::invalid_response(format!("audio content is not base64: {e}"))
        })?;
    Ok(NarrationAudio::new(bytes, encoding))
}
