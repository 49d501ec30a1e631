//! Static model-name to provider-id lookup table.

/// Provider used for model names missing from [`MODEL_PROVIDERS`].
pub const DEFAULT_PROVIDER: &str = "openai";

/// Known model names and the provider that serves them.
pub const MODEL_PROVIDERS: &[(&str, &str)] = &[
    ("gpt-4", "openai"),
    ("gpt-4-turbo", "openai"),
    ("gpt-4o", "openai"),
    ("gpt-4o-mini", "openai"),
    ("gpt-3.5-turbo", "openai"),
    ("dall-e-2", "openai_image"),
    ("dall-e-3", "openai_image"),
    ("tts-1", "openai_tts"),
    ("tts-1-hd", "openai_tts"),
    ("eleven_monolingual_v1", "elevenlabs"),
    ("eleven_multilingual_v2", "elevenlabs"),
];

/// Looks up the provider for a model, if the model is known.
#[must_use]
pub fn lookup_provider(model: &str) -> Option<&'static str> {
    let model = model.trim();
    MODEL_PROVIDERS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(model))
        .map(|(_, provider)| *provider)
}

/// Resolves the provider for a model, falling back to [`DEFAULT_PROVIDER`].
#[must_use]
pub fn resolve_provider(model: &str) -> &'static str {
    lookup_provider(model).unwrap_or_else(|| {
        tracing::debug!(model, default = DEFAULT_PROVIDER, "Unknown model, using default provider");
        DEFAULT_PROVIDER
    })
}
