//! OpenAI-compatible providers: chat completion, image generation, speech.

use super::audio::write_audio;
use super::http::{json_str, send_bytes, send_json};
use super::{LlmProvider, ProviderConfig};
use crate::errors::{ContentflowError, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use std::path::PathBuf;
use std::time::Duration;

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";

/// Environment fallback for the API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

fn authorized(request: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
    request
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
}

/// Chat completions (`POST /chat/completions`).
#[derive(Debug, Clone)]
pub struct OpenAiChatProvider {
    client: Client,
    timeout: Duration,
}

impl OpenAiChatProvider {
    /// Provider id.
    pub const ID: &'static str = "openai";

    /// Creates the provider.
    #[must_use]
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl LlmProvider for OpenAiChatProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn call(&self, config: &ProviderConfig, prompt: &str) -> Result<String> {
        let model = config.require_model()?;
        let api_key = config.api_key_or_env(OPENAI_API_KEY_ENV)?;
        let url = format!("{}/chat/completions", config.endpoint_or(DEFAULT_OPENAI_BASE));

        let mut messages = Vec::new();
        if let Some(system) = config.parameter("system_prompt").and_then(|v| v.as_str()) {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": prompt}));

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
        });
        for key in ["temperature", "max_tokens", "top_p"] {
            if let Some(value) = config.parameter(key) {
                body[key] = value.clone();
            }
        }

        tracing::debug!(provider = Self::ID, model, url = %url, "Calling chat completion");
        let request = authorized(self.client.post(&url), &api_key)
            .timeout(config.timeout_or(self.timeout))
            .json(&body);
        let response = send_json(Self::ID, &url, request).await?;

        json_str(Self::ID, &response, "/choices/0/message/content").map(|s| s.trim().to_string())
    }
}

/// Image generation (`POST /images/generations`); returns the image URL.
#[derive(Debug, Clone)]
pub struct OpenAiImageProvider {
    client: Client,
    timeout: Duration,
}

impl OpenAiImageProvider {
    /// Provider id.
    pub const ID: &'static str = "openai_image";

    /// Creates the provider.
    #[must_use]
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl LlmProvider for OpenAiImageProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn call(&self, config: &ProviderConfig, prompt: &str) -> Result<String> {
        let model = config.require_model()?;
        let api_key = config.api_key_or_env(OPENAI_API_KEY_ENV)?;
        let url = format!("{}/images/generations", config.endpoint_or(DEFAULT_OPENAI_BASE));

        let size = config
            .parameter("size")
            .and_then(|v| v.as_str())
            .unwrap_or("1024x1024");
        let body = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "n": 1,
            "size": size,
        });

        let request = authorized(self.client.post(&url), &api_key)
            .timeout(config.timeout_or(self.timeout))
            .json(&body);
        let response = send_json(Self::ID, &url, request).await?;

        json_str(Self::ID, &response, "/data/0/url").map(str::to_string)
    }
}

/// Text to speech (`POST /audio/speech`); writes the audio and returns its path.
#[derive(Debug, Clone)]
pub struct OpenAiSpeechProvider {
    client: Client,
    timeout: Duration,
    output_dir: PathBuf,
}

impl OpenAiSpeechProvider {
    /// Provider id.
    pub const ID: &'static str = "openai_tts";

    /// Creates the provider.
    #[must_use]
    pub fn new(client: Client, timeout: Duration, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            timeout,
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiSpeechProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn call(&self, config: &ProviderConfig, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(ContentflowError::validation("no text to synthesize"));
        }
        let model = config.require_model()?;
        let api_key = config.api_key_or_env(OPENAI_API_KEY_ENV)?;
        let url = format!("{}/audio/speech", config.endpoint_or(DEFAULT_OPENAI_BASE));

        let body = serde_json::json!({
            "model": model,
            "input": prompt,
            "voice": config.voice.as_deref().unwrap_or("alloy"),
            "response_format": "mp3",
        });

        let request = authorized(self.client.post(&url), &api_key)
            .timeout(config.timeout_or(self.timeout))
            .json(&body);
        let audio = send_bytes(Self::ID, &url, request).await?;

        let path = write_audio(&self.output_dir, &audio, "mp3").await?;
        Ok(path.display().to_string())
    }
}
