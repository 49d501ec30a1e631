//! Registries pre-populated with the built-in providers.

use super::http::build_client;
use super::{
    ActionProviderRegistry, BulkSmsProvider, CreateContentProvider, ElevenLabsSpeechProvider,
    GoogleSearchProvider, LlmProviderRegistry, NewsApiProvider, OpenAiChatProvider,
    OpenAiImageProvider, OpenAiSpeechProvider, SocialPostProvider, TaxonomyActionProvider,
    WebhookActionProvider,
};
use crate::collaborators::{ContentStore, TaxonomySource};
use crate::errors::Result;
use crate::settings::Settings;
use crate::webhook::WebhookDispatcher;
use std::sync::Arc;

/// Builds the LLM registry: `openai`, `openai_image`, `openai_tts`, `elevenlabs`.
pub fn default_llm_registry(settings: &Settings) -> Result<LlmProviderRegistry> {
    let client = build_client(settings.llm_timeout(), &settings.user_agent)?;
    let registry = LlmProviderRegistry::new("llm provider");

    let (c, timeout) = (client.clone(), settings.llm_timeout());
    registry.register(OpenAiChatProvider::ID, move || {
        Arc::new(OpenAiChatProvider::new(c.clone(), timeout))
    });

    let (c, timeout) = (client.clone(), settings.image_timeout());
    registry.register(OpenAiImageProvider::ID, move || {
        Arc::new(OpenAiImageProvider::new(c.clone(), timeout))
    });

    let (c, timeout, dir) = (
        client.clone(),
        settings.speech_timeout(),
        settings.audio_output_dir.clone(),
    );
    registry.register(OpenAiSpeechProvider::ID, move || {
        Arc::new(OpenAiSpeechProvider::new(c.clone(), timeout, dir.clone()))
    });

    let (c, timeout, dir) = (
        client,
        settings.speech_timeout(),
        settings.audio_output_dir.clone(),
    );
    registry.register(ElevenLabsSpeechProvider::ID, move || {
        Arc::new(ElevenLabsSpeechProvider::new(c.clone(), timeout, dir.clone()))
    });

    tracing::debug!(providers = ?registry.ids(), "Built LLM provider registry");
    Ok(registry)
}

/// Builds the action registry with every built-in action provider.
pub fn default_action_registry(
    settings: &Settings,
    taxonomy: Arc<dyn TaxonomySource>,
    content: Arc<dyn ContentStore>,
) -> Result<ActionProviderRegistry> {
    let client = build_client(settings.fetch_timeout(), &settings.user_agent)?;
    let timeout = settings.fetch_timeout();
    let registry = ActionProviderRegistry::new("action provider");

    let dispatcher = WebhookDispatcher::new(client.clone(), settings.retry.clone());
    registry.register(WebhookActionProvider::ID, move || {
        Arc::new(WebhookActionProvider::new(dispatcher.clone()))
    });

    registry.register(TaxonomyActionProvider::ID, move || {
        Arc::new(TaxonomyActionProvider::new(Arc::clone(&taxonomy)))
    });

    registry.register(CreateContentProvider::ID, move || {
        Arc::new(CreateContentProvider::new(Arc::clone(&content)))
    });

    let c = client.clone();
    registry.register(BulkSmsProvider::ID, move || {
        Arc::new(BulkSmsProvider::new(c.clone(), timeout))
    });

    let c = client.clone();
    registry.register(SocialPostProvider::ID, move || {
        Arc::new(SocialPostProvider::new(c.clone(), timeout))
    });

    let c = client.clone();
    registry.register(GoogleSearchProvider::ID, move || {
        Arc::new(GoogleSearchProvider::new(c.clone(), timeout))
    });

    let c = client.clone();
    registry.register(NewsApiProvider::ID, move || {
        Arc::new(NewsApiProvider::new(c.clone(), timeout))
    });

    #[cfg(feature = "extraction")]
    {
        let c = client.clone();
        registry.register(super::UrlFetchProvider::ID, move || {
            Arc::new(super::UrlFetchProvider::new(c.clone(), timeout))
        });
    }

    tracing::debug!(providers = ?registry.ids(), "Built action provider registry");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{InMemoryContentStore, InMemoryTaxonomySource};

    #[test]
    fn test_default_llm_registry_ids() {
        let registry = default_llm_registry(&Settings::default()).unwrap();
        for id in ["openai", "openai_image", "openai_tts", "elevenlabs"] {
            assert!(registry.contains(id), "missing {id}");
        }
        assert_eq!(registry.get("openai").unwrap().id(), "openai");
    }

    #[test]
    fn test_default_action_registry_ids() {
        let registry = default_action_registry(
            &Settings::default(),
            Arc::new(InMemoryTaxonomySource::new()),
            Arc::new(InMemoryContentStore::new()),
        )
        .unwrap();
        for id in [
            "webhook",
            "taxonomy",
            "create_content",
            "bulk_sms",
            "social_post",
            "google_search",
            "news_api",
        ] {
            assert!(registry.contains(id), "missing {id}");
        }
        assert!(registry.get("nope").is_err());
    }
}
