//! Pipeline persistence port and its in-memory implementation.

use super::Pipeline;
use crate::errors::{ContentflowError, Result};
use async_trait::async_trait;
use dashmap::DashMap;

/// Loads and saves pipelines. Saves are last-writer-wins.
#[async_trait]
pub trait PipelineRepository: Send + Sync {
    /// Loads a pipeline, or `NotFound`.
    async fn load(&self, id: &str) -> Result<Pipeline>;

    /// Saves a pipeline, replacing any stored version.
    async fn save(&self, pipeline: &Pipeline) -> Result<()>;

    /// Ids of all stored pipelines.
    async fn list_ids(&self) -> Result<Vec<String>>;
}

/// Pipelines held in a concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryPipelineRepository {
    pipelines: DashMap<String, Pipeline>,
}

impl InMemoryPipelineRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a pipeline.
    pub fn insert(&self, pipeline: Pipeline) {
        self.pipelines.insert(pipeline.id().to_string(), pipeline);
    }

    /// Returns a copy of a stored pipeline.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Pipeline> {
        self.pipelines.get(id).map(|p| p.value().clone())
    }
}

#[async_trait]
impl PipelineRepository for InMemoryPipelineRepository {
    async fn load(&self, id: &str) -> Result<Pipeline> {
        self.get(id)
            .ok_or_else(|| ContentflowError::not_found("pipeline", id))
    }

    async fn save(&self, pipeline: &Pipeline) -> Result<()> {
        self.insert(pipeline.clone());
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.pipelines.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }
}
