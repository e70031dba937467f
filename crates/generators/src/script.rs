//! Script generation through an OpenAI-compatible completions endpoint.

use mangareel_common::config::ServiceConfig;
use mangareel_common::error::{MangareelError, MangareelResult};
use mangareel_stage_core::{Script, ScriptGenerator};
use serde::{Deserialize, Serialize};

use crate::http;

/// Default token cap for a generated script.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub struct OpenAiScriptGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

impl OpenAiScriptGenerator {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
    ) -> MangareelResult<Self> {
        Ok(Self {
            client: http::build_client(DEFAULT_TIMEOUT_SECS)?,
            api_key: http::require_key(Some(&api_key), "OpenAI")?,
            base_url: http::normalize_base_url(base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn from_config(services: &ServiceConfig) -> MangareelResult<Self> {
        Ok(Self {
            client: http::build_client(services.request_timeout_secs)?,
            api_key: http::require_key(services.openai_api_key.as_deref(), "OpenAI")?,
            base_url: http::normalize_base_url(&services.openai_base_url),
            model: services.script_model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> MangareelResult<Script> {
        let url = format!("{}/completions", self.base_url);
        let request = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens,
        };

        tracing::debug!(model = %self.model, max_tokens, prompt, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body: CompletionResponse = http::read_json(response).await?;
        script_from_response(body)
    }
}

#[async_trait::async_trait]
impl ScriptGenerator for OpenAiScriptGenerator {
    async fn generate_script(&self, prompt: &str, max_tokens: u32) -> MangareelResult<Script> {
        tracing::info!(model = %self.model, max_tokens, "Generating script");

        let script = self
            .complete(prompt, max_tokens)
            .await
            .map_err(|e| MangareelError::script(e.to_string()))?;

        tracing::info!(words = script.word_count(), "Script generated");
        Ok(script)
    }
}

fn script_from_response(body: CompletionResponse) -> MangareelResult<Script> {
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| MangareelError::invalid_response("completion returned no choices"))?;
    Ok(Script::new(choice.text.trim()))
}
