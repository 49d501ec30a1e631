//! ElevenLabs text-to-speech provider.

use super::audio::write_audio;
use super::http::send_bytes;
use super::{LlmProvider, ProviderConfig};
use crate::errors::{ContentflowError, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use std::path::PathBuf;
use std::time::Duration;

/// Default ElevenLabs API base URL.
pub const DEFAULT_ELEVENLABS_BASE: &str = "https://api.elevenlabs.io/v1";

/// Environment fallback for the API key.
pub const ELEVENLABS_API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// Speech synthesis through `POST /text-to-speech/{voice_id}`.
#[derive(Debug, Clone)]
pub struct ElevenLabsSpeechProvider {
    client: Client,
    timeout: Duration,
    output_dir: PathBuf,
}

impl ElevenLabsSpeechProvider {
    /// Provider id.
    pub const ID: &'static str = "elevenlabs";

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
impl LlmProvider for ElevenLabsSpeechProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn call(&self, config: &ProviderConfig, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(ContentflowError::validation("no text to synthesize"));
        }
        let voice = config.voice.as_deref().filter(|v| !v.is_empty()).ok_or_else(|| {
            ContentflowError::configuration(format!("provider config '{}' has no voice id", config.id))
        })?;
        let api_key = config.api_key_or_env(ELEVENLABS_API_KEY_ENV)?;
        let url = format!(
            "{}/text-to-speech/{voice}",
            config.endpoint_or(DEFAULT_ELEVENLABS_BASE)
        );

        let mut body = serde_json::json!({
            "text": prompt,
            "model_id": config.model.as_deref().unwrap_or("eleven_multilingual_v2"),
        });
        let stability = config.parameter("stability").cloned();
        let similarity = config.parameter("similarity_boost").cloned();
        if stability.is_some() || similarity.is_some() {
            body["voice_settings"] = serde_json::json!({
                "stability": stability.unwrap_or(serde_json::json!(0.5)),
                "similarity_boost": similarity.unwrap_or(serde_json::json!(0.75)),
            });
        }

        let request = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .header(header::ACCEPT, "audio/mpeg")
            .timeout(config.timeout_or(self.timeout))
            .json(&body);
        let audio = send_bytes(Self::ID, &url, request).await?;

        let path = write_audio(&self.output_dir, &audio, "mp3").await?;
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_synthesizes_to_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/text-to-speech/voice-1"))
            .and(header("xi-api-key", "el-key"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9u8; 4]))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let provider =
            ElevenLabsSpeechProvider::new(Client::new(), Duration::from_secs(5), dir.path());
        let config = ProviderConfig::new("el", "elevenlabs")
            .with_api_key("el-key")
            .with_voice("voice-1")
            .with_endpoint(server.uri());

        let out = provider.call(&config, "Narrate").await.unwrap();
        assert_eq!(std::fs::read(out).unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_missing_voice_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider =
            ElevenLabsSpeechProvider::new(Client::new(), Duration::from_secs(5), dir.path());
        let config = ProviderConfig::new("el", "elevenlabs").with_api_key("k");

        let err = provider.call(&config, "Narrate").await.unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }
}
