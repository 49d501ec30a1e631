//! Provider contracts, the provider registries and the concrete providers.
//!
//! Two families exist:
//! - [`LlmProvider`]: turns a prompt into text (chat, image URL, audio path)
//! - [`ActionProvider`]: performs a side effect driven by a JSON config and
//!   the run context (webhooks, SMS, search, content creation, ...)
//!
//! Providers are looked up by id in a [`ProviderRegistry`]. Model names are
//! mapped to provider ids through a static table, see [`resolve_provider`].

mod audio;
mod config;
mod content;
mod defaults;
mod elevenlabs;
#[cfg(feature = "extraction")]
mod fetch;
pub(crate) mod http;
mod models;
mod openai;
mod registry;
mod search;
mod sms;
mod social;
mod taxonomy;
mod webhook;

pub use config::ProviderConfig;
pub use content::{parse_content_payload, CreateContentProvider};
pub use defaults::{default_action_registry, default_llm_registry};
pub use elevenlabs::{ElevenLabsSpeechProvider, DEFAULT_ELEVENLABS_BASE, ELEVENLABS_API_KEY_ENV};
#[cfg(feature = "extraction")]
pub use fetch::UrlFetchProvider;
pub use models::{lookup_provider, resolve_provider, DEFAULT_PROVIDER, MODEL_PROVIDERS};
pub use openai::{
    OpenAiChatProvider, OpenAiImageProvider, OpenAiSpeechProvider, DEFAULT_OPENAI_BASE,
    OPENAI_API_KEY_ENV,
};
pub use registry::{ActionProviderRegistry, LlmProviderRegistry, ProviderFactory, ProviderRegistry};
pub use search::{GoogleSearchProvider, NewsApiProvider, SearchHit};
pub use sms::BulkSmsProvider;
pub use social::SocialPostProvider;
pub use taxonomy::TaxonomyActionProvider;
pub use webhook::WebhookActionProvider;

use crate::context::ExecutionContext;
use crate::errors::{ContentflowError, Result};
use async_trait::async_trait;

/// A service that turns a prompt into text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Registry id of the provider.
    fn id(&self) -> &str;

    /// Calls the backend with a rendered prompt.
    async fn call(&self, config: &ProviderConfig, prompt: &str) -> Result<String>;
}

/// A service that performs an action for a step.
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// Registry id of the provider.
    fn id(&self) -> &str;

    /// Executes the action with the step's action config and the run context.
    async fn execute(&self, config: &serde_json::Value, ctx: &ExecutionContext) -> Result<String>;
}

/// Reads a non-empty string field from an action config.
pub(crate) fn config_str<'a>(config: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    config
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Reads a required string field from an action config.
pub(crate) fn require_str<'a>(
    provider: &str,
    config: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str> {
    config_str(config, key).ok_or_else(|| {
        ContentflowError::configuration(format!("{provider} requires '{key}' in its configuration"))
    })
}
