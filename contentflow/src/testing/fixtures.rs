//! Test fixtures for pipeline runs.

use std::sync::Arc;

use crate::collaborators::{
    Collaborators, InMemoryContentStore, InMemoryFileStore, InMemoryProviderConfigStore,
};
use crate::events::CollectingEventSink;
use crate::pipeline::{InMemoryPipelineRepository, Pipeline};
use crate::providers::{ActionProviderRegistry, LlmProviderRegistry};
use crate::runner::RunDriver;
use crate::steps::StepServices;

/// Step services backed by empty provider registries.
///
/// Register mocks on `services.llm` / `services.actions` as needed.
#[must_use]
pub fn mock_services() -> StepServices {
    StepServices::new(
        Arc::new(LlmProviderRegistry::new("llm provider")),
        Arc::new(ActionProviderRegistry::new("action provider")),
    )
}

/// Everything a driver test needs, wired to in-memory stores.
#[derive(Debug)]
pub struct TestHarness {
    /// Pipeline storage.
    pub repository: Arc<InMemoryPipelineRepository>,
    /// Provider configs handed to the step data handlers.
    pub provider_configs: Arc<InMemoryProviderConfigStore>,
    /// Uploaded files.
    pub files: Arc<InMemoryFileStore>,
    /// Created content.
    pub content: Arc<InMemoryContentStore>,
    /// Provider registries.
    pub services: StepServices,
    /// Every event the driver emitted.
    pub events: Arc<CollectingEventSink>,
}

impl TestHarness {
    /// Creates an empty harness.
    #[must_use]
    pub fn new() -> Self {
        Self {
            repository: Arc::new(InMemoryPipelineRepository::new()),
            provider_configs: Arc::new(InMemoryProviderConfigStore::new()),
            files: Arc::new(InMemoryFileStore::new()),
            content: Arc::new(InMemoryContentStore::new()),
            services: mock_services(),
            events: Arc::new(CollectingEventSink::new()),
        }
    }

    /// Stores a pipeline.
    #[must_use]
    pub fn with_pipeline(self, pipeline: Pipeline) -> Self {
        self.repository.insert(pipeline);
        self
    }

    /// The collaborator set over this harness's stores.
    #[must_use]
    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            self.provider_configs.clone(),
            self.files.clone(),
            self.content.clone(),
        )
    }

    /// A driver over this harness with built-in step types and handlers.
    #[must_use]
    pub fn driver(&self) -> RunDriver {
        RunDriver::new(
            self.repository.clone(),
            self.collaborators(),
            self.services.clone(),
        )
        .with_event_sink(self.events.clone())
    }

    /// Reloads a stored pipeline.
    ///
    /// # Panics
    ///
    /// Panics when the pipeline was never stored.
    #[must_use]
    pub fn pipeline(&self, id: &str) -> Pipeline {
        self.repository
            .get(id)
            .unwrap_or_else(|| panic!("pipeline '{id}' not stored"))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
