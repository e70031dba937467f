//! Image generation through an OpenAI-compatible images endpoint.

use mangareel_common::config::ServiceConfig;
use mangareel_common::error::{MangareelError, MangareelResult};
use mangareel_stage_core::{ImageGenerator, ImageLocation, ScenePrompt};
use serde::{Deserialize, Serialize};

use crate::http;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "dall-e-3";
const DEFAULT_SIZE: &str = "1024x1024";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub struct OpenAiImageGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    size: String,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

impl OpenAiImageGenerator {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
    ) -> MangareelResult<Self> {
        Ok(Self {
            client: http::build_client(DEFAULT_TIMEOUT_SECS)?,
            api_key: http::require_key(Some(&api_key), "Image generation")?,
            base_url: http::normalize_base_url(base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            size: DEFAULT_SIZE.to_string(),
        })
    }

    pub fn from_config(services: &ServiceConfig) -> MangareelResult<Self> {
        Ok(Self {
            client: http::build_client(services.request_timeout_secs)?,
            api_key: http::require_key(services.image_key(), "Image generation")?,
            base_url: http::normalize_base_url(&services.image_base_url),
            model: services.image_model.clone(),
            size: services.image_size.clone(),
        })
    }

    /// Override the requested image size.
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }
}

#[async_trait::async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate_image(&self, prompt: &ScenePrompt) -> MangareelResult<ImageLocation> {
        let url = format!("{}/images/generations", self.base_url);
        let request = ImageRequest {
            model: &self.model,
            prompt: &prompt.description,
            n: 1,
            size: &self.size,
        };

        tracing::debug!(
            model = %self.model,
            size = %self.size,
            prompt = %prompt,
            "Requesting image"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body: ImageResponse = http::read_json(response).await?;
        let image = location_from_response(body)?;

        tracing::info!(location = %image.location, "Image generated");
        Ok(image)
    }
}

fn location_from_response(body: ImageResponse) -> MangareelResult<ImageLocation> {
    body.data
        .into_iter()
        .find_map(|d| d.url)
        .map(ImageLocation::new)
        .ok_or_else(|| MangareelError::invalid_response("response contained no image URL"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = ImageRequest {
            model: "dall-e-3",
            prompt: "Scene 1",
            n: 1,
            size: "1024x1024",
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "model": "dall-e-3",
                "prompt": "Scene 1",
                "n": 1,
                "size": "1024x1024"
            })
        );
    }

    #[test]
    fn test_location_from_response() {
        let body: ImageResponse = serde_json::from_str(
            r#"{"created":1,"data":[{"revised_prompt":"x","url":"https://img.example/1.png"}]}"#,
        )
        .unwrap();
        assert_eq!(
            location_from_response(body).unwrap(),
            ImageLocation::new("https://img.example/1.png")
        );
    }

    #[test]
    fn test_base64_only_response_is_rejected() {
        let body: ImageResponse =
            serde_json::from_str(r#"{"data":[{"b64_json":"aGVsbG8="}]}"#).unwrap();
        let err = location_from_response(body).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid API response: response contained no image URL"
        );
    }

    #[test]
    fn test_from_config_uses_text_key_fallback() {
        let services = ServiceConfig {
            openai_api_key: Some("sk-text".to_string()),
            ..ServiceConfig::default()
        };
        let gen = OpenAiImageGenerator::from_config(&services).unwrap();
        assert_eq!(gen.api_key, "sk-text");
        assert_eq!(gen.size, "1024x1024");
    }

    #[tokio::test]
    async fn test_failure_names_the_prompt() {
        let gen = OpenAiImageGenerator::new(
            "sk-test".to_string(),
            Some("http://127.0.0.1:9/v1".to_string()),
            None,
        )
        .unwrap()
        .with_size("256x256");

        let prompts = vec![ScenePrompt::new("Scene 1"), ScenePrompt::new("Scene 2")];
        let err = gen.generate_images(&prompts).await.unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Failed to generate image for prompt 'Scene 1': "));
    }
}
