//! In-memory collaborator implementations.

use super::{
    ContentItem, ContentStore, FileInfo, FileStore, NewContentItem, ProviderConfigStore,
    TaxonomySource, TaxonomyTerm,
};
use crate::errors::{ContentflowError, Result};
use crate::providers::ProviderConfig;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Provider configs kept in a map.
#[derive(Debug, Default)]
pub struct InMemoryProviderConfigStore {
    configs: RwLock<HashMap<String, ProviderConfig>>,
}

impl InMemoryProviderConfigStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a config.
    pub fn insert(&self, config: ProviderConfig) {
        self.configs.write().insert(config.id.clone(), config);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_config(self, config: ProviderConfig) -> Self {
        self.insert(config);
        self
    }
}

#[async_trait]
impl ProviderConfigStore for InMemoryProviderConfigStore {
    async fn load_provider_config(&self, id: &str) -> Result<ProviderConfig> {
        self.configs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ContentflowError::not_found("provider config", id))
    }
}

/// Files kept in a map.
#[derive(Debug, Default)]
pub struct InMemoryFileStore {
    files: RwLock<HashMap<String, FileInfo>>,
}

impl InMemoryFileStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a file.
    pub fn insert(&self, file: FileInfo) {
        self.files.write().insert(file.id.clone(), file);
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn load_file(&self, id: &str) -> Result<FileInfo> {
        self.files
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ContentflowError::not_found("file", id))
    }
}

/// Content items kept in a map; ids are sequential.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    items: RwLock<Vec<ContentItem>>,
}

impl InMemoryContentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an existing item.
    pub fn insert(&self, item: ContentItem) {
        self.items.write().push(item);
    }

    /// Returns all items, oldest first.
    #[must_use]
    pub fn items(&self) -> Vec<ContentItem> {
        self.items.read().clone()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn load_content(&self, id: &str) -> Result<ContentItem> {
        self.items
            .read()
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| ContentflowError::not_found("content item", id))
    }

    async fn create_content(&self, item: NewContentItem) -> Result<ContentItem> {
        let mut items = self.items.write();
        let created = ContentItem {
            id: (items.len() + 1).to_string(),
            title: item.title,
            body: item.body,
            summary: None,
            image_url: None,
        };
        items.push(created.clone());
        Ok(created)
    }
}

/// Vocabularies kept in a map.
#[derive(Debug, Default)]
pub struct InMemoryTaxonomySource {
    vocabularies: RwLock<HashMap<String, Vec<TaxonomyTerm>>>,
}

impl InMemoryTaxonomySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the terms of a vocabulary.
    pub fn set_terms(&self, vocabulary: impl Into<String>, terms: Vec<TaxonomyTerm>) {
        self.vocabularies.write().insert(vocabulary.into(), terms);
    }
}

#[async_trait]
impl TaxonomySource for InMemoryTaxonomySource {
    async fn terms(&self, vocabulary: &str) -> Result<Vec<TaxonomyTerm>> {
        self.vocabularies
            .read()
            .get(vocabulary)
            .cloned()
            .ok_or_else(|| ContentflowError::not_found("vocabulary", vocabulary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_provider_config_store() {
        let store = InMemoryProviderConfigStore::new()
            .with_config(ProviderConfig::new("gpt", "openai").with_model("gpt-4"));

        let loaded = store.load_provider_config("gpt").await.unwrap();
        assert_eq!(loaded.model.as_deref(), Some("gpt-4"));

        let missing = store.load_provider_config("nope").await.unwrap_err();
        assert_eq!(missing.kind(), "NotFoundError");
    }

    #[tokio::test]
    async fn test_content_store_assigns_ids() {
        let store = InMemoryContentStore::new();
        let first = store
            .create_content(NewContentItem {
                title: "One".into(),
                body: "b".into(),
            })
            .await
            .unwrap();
        let second = store
            .create_content(NewContentItem {
                title: "Two".into(),
                body: "b".into(),
            })
            .await
            .unwrap();

        assert_eq!(first.id, "1");
        assert_eq!(second.id, "2");
        assert_eq!(store.load_content("2").await.unwrap().title, "Two");
    }

    #[test]
    fn test_taxonomy_source_unknown_vocabulary() {
        let source = InMemoryTaxonomySource::new();
        let result = tokio_test::block_on(source.terms("tags"));
        assert!(matches!(result, Err(ContentflowError::NotFound { .. })));
    }
}
