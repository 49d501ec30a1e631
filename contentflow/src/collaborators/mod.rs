//! Ports to the collaborators that own data the engine only reads or creates.
//!
//! Each port is a trait the host application implements against its own
//! storage. In-memory implementations are provided for embedding and tests.

mod memory;

pub use memory::{
    InMemoryContentStore, InMemoryFileStore, InMemoryProviderConfigStore, InMemoryTaxonomySource,
};

use crate::errors::Result;
use crate::providers::ProviderConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An uploaded media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    /// File id.
    pub id: String,
    /// Public URL.
    pub url: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Duration for audio/video, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

/// A published content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Item id.
    pub id: String,
    /// Title.
    pub title: String,
    /// Full body.
    #[serde(default)]
    pub body: String,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Lead image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A new content item to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContentItem {
    /// Title.
    pub title: String,
    /// Body.
    pub body: String,
}

/// A taxonomy term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyTerm {
    /// Term id.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Loads provider configurations by id.
#[async_trait]
pub trait ProviderConfigStore: Send + Sync {
    /// Loads a provider config, or `NotFound`.
    async fn load_provider_config(&self, id: &str) -> Result<ProviderConfig>;
}

/// Loads uploaded files by id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Loads a file, or `NotFound`.
    async fn load_file(&self, id: &str) -> Result<FileInfo>;
}

/// Loads and creates content items.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Loads a content item, or `NotFound`.
    async fn load_content(&self, id: &str) -> Result<ContentItem>;

    /// Creates a content item and returns it with its new id.
    async fn create_content(&self, item: NewContentItem) -> Result<ContentItem>;
}

/// Lists taxonomy terms.
#[async_trait]
pub trait TaxonomySource: Send + Sync {
    /// Returns the terms of a vocabulary, or `NotFound` for unknown vocabularies.
    async fn terms(&self, vocabulary: &str) -> Result<Vec<TaxonomyTerm>>;
}

/// The collaborators handed to step data handlers and the result ingestor.
#[derive(Clone)]
pub struct Collaborators {
    /// Provider configuration storage.
    pub provider_configs: Arc<dyn ProviderConfigStore>,
    /// Uploaded file storage.
    pub files: Arc<dyn FileStore>,
    /// Content item storage.
    pub content: Arc<dyn ContentStore>,
}

impl Collaborators {
    /// Creates a collaborator set.
    #[must_use]
    pub fn new(
        provider_configs: Arc<dyn ProviderConfigStore>,
        files: Arc<dyn FileStore>,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            provider_configs,
            files,
            content,
        }
    }

    /// Creates a collaborator set backed by empty in-memory stores.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryProviderConfigStore::new()),
            Arc::new(InMemoryFileStore::new()),
            Arc::new(InMemoryContentStore::new()),
        )
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
