//! Error types for the contentflow engine.
//!
//! Every failure a step, provider or collaborator can raise is classified
//! into one [`ContentflowError`] variant. Only [`ContentflowError::Transport`]
//! is considered retryable, and only the webhook dispatcher retries it.

use std::collections::HashMap;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ContentflowError>;

/// The main error type for contentflow operations.
#[derive(Debug, Error)]
pub enum ContentflowError {
    /// Required provider/model configuration is missing or invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is missing or malformed.
        message: String,
    },

    /// An external API answered with a non-2xx status or an unexpected body.
    #[error("Provider '{provider}' error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Provider {
        /// Provider id.
        provider: String,
        /// HTTP status, when the failure came from a response.
        status: Option<u16>,
        /// Offending URL, when known.
        url: Option<String>,
        /// Error detail.
        message: String,
    },

    /// A network-level failure (connect, timeout, broken request).
    #[error("Transport error calling {url} after {attempts} attempt(s) ({retry_attempts} retry attempts allowed): {message}")]
    Transport {
        /// Target URL.
        url: String,
        /// Total attempts performed.
        attempts: u32,
        /// Retries the policy allowed.
        retry_attempts: u32,
        /// Message of the last underlying error.
        message: String,
    },

    /// Upstream output could not be parsed by a downstream consumer.
    #[error("Validation error: {message}")]
    Validation {
        /// Error detail.
        message: String,
    },

    /// A referenced entity could not be loaded.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Entity kind ("pipeline", "provider config", ...).
        entity: String,
        /// Identifier that was looked up.
        id: String,
    },

    /// The step type does not implement the executable contract.
    #[error("Step type '{step_type}' is not executable")]
    NotExecutable {
        /// The step type id.
        step_type: String,
    },

    /// The pipeline is disabled and refuses to run.
    #[error("Pipeline '{pipeline_id}' is disabled")]
    PipelineDisabled {
        /// The pipeline id.
        pipeline_id: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ContentflowError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a provider error without HTTP details.
    #[must_use]
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            status: None,
            url: None,
            message: message.into(),
        }
    }

    /// Creates a provider error for a non-2xx HTTP response.
    #[must_use]
    pub fn http_status(
        provider: impl Into<String>,
        url: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            status: Some(status),
            url: Some(url.into()),
            message: body.into(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(
        url: impl Into<String>,
        attempts: u32,
        retry_attempts: u32,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            url: url.into(),
            attempts,
            retry_attempts,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a not-executable error.
    #[must_use]
    pub fn not_executable(step_type: impl Into<String>) -> Self {
        Self::NotExecutable {
            step_type: step_type.into(),
        }
    }

    /// Returns a stable name for the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "ConfigurationError",
            Self::Provider { .. } => "ProviderError",
            Self::Transport { .. } => "TransportError",
            Self::Validation { .. } => "ValidationError",
            Self::NotFound { .. } => "NotFoundError",
            Self::NotExecutable { .. } => "NotExecutableError",
            Self::PipelineDisabled { .. } => "PipelineDisabledError",
            Self::Serialization(_) => "SerializationError",
            Self::Io(_) => "IoError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Whether the failure is network-level and therefore retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.kind()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));

        match self {
            Self::Provider {
                provider,
                status,
                url,
                ..
            } => {
                map.insert("provider".to_string(), serde_json::json!(provider));
                if let Some(status) = status {
                    map.insert("status".to_string(), serde_json::json!(status));
                }
                if let Some(url) = url {
                    map.insert("url".to_string(), serde_json::json!(url));
                }
            }
            Self::Transport {
                url,
                attempts,
                retry_attempts,
                ..
            } => {
                map.insert("url".to_string(), serde_json::json!(url));
                map.insert("attempts".to_string(), serde_json::json!(attempts));
                map.insert("retry_attempts".to_string(), serde_json::json!(retry_attempts));
            }
            Self::NotFound { entity, id } => {
                map.insert("entity".to_string(), serde_json::json!(entity));
                map.insert("id".to_string(), serde_json::json!(id));
            }
            _ => {}
        }

        map
    }
}

impl From<serde_json::Error> for ContentflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_is_retryable() {
        assert!(ContentflowError::transport("http://x", 1, 3, "refused").is_retryable());
        assert!(!ContentflowError::http_status("webhook", "http://x", 500, "boom").is_retryable());
        assert!(!ContentflowError::configuration("missing model").is_retryable());
    }

    #[test]
    fn test_provider_error_display_includes_status() {
        let err = ContentflowError::http_status("webhook", "http://x/hook", 502, "bad gateway");
        let text = err.to_string();
        assert!(text.contains("webhook"));
        assert!(text.contains("HTTP 502"));
        assert!(text.contains("bad gateway"));
    }

    #[test]
    fn test_transport_error_names_retry_attempts() {
        let err = ContentflowError::transport("http://x", 4, 3, "connection refused");
        assert!(err.to_string().contains("3 retry attempts"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_to_dict() {
        let err = ContentflowError::not_found("provider config", "gpt");
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "NotFoundError");
        assert_eq!(dict.get("entity").unwrap(), "provider config");
        assert_eq!(dict.get("id").unwrap(), "gpt");
    }

    #[test]
    fn test_from_serde_json() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: ContentflowError = parse.unwrap_err().into();
        assert_eq!(err.kind(), "SerializationError");
    }
}
