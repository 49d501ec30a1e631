//! # Contentflow
//!
//! The step execution core of an automated content-generation system.
//!
//! A pipeline is an ordered list of typed steps. Running it resolves each
//! step's stored configuration, executes the step against an external
//! provider and feeds its output into the next step through a shared
//! execution context.
//!
//! - **Step types**: model calls, actions, searches and uploads, resolved
//!   through a registry and executed in ascending weight order
//! - **Providers**: model and action services addressed by id, created lazily
//! - **Webhooks**: validated outbound HTTP with bounded retries on transport
//!   failures
//! - **Failure tracking**: pipelines disable themselves after repeated failed
//!   runs
//! - **Ingestion**: results produced elsewhere are written back into a
//!   pipeline's steps
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use contentflow::prelude::*;
//!
//! let pipeline = Pipeline::new("daily-digest", "Daily digest")
//!     .with_step(StepDefinition::llm("Write a digest of today's headlines").with_weight(0))
//!     .with_step(StepDefinition::action("webhook", json!({"webhook_url": "https://hooks.example.com"})).with_weight(1));
//!
//! let repository = Arc::new(InMemoryPipelineRepository::new());
//! repository.insert(pipeline);
//!
//! let taxonomy = Arc::new(InMemoryTaxonomySource::new());
//! let driver = RunDriver::from_settings(&Settings::from_env()?, repository, Collaborators::in_memory(), taxonomy)?;
//! let report = driver.run("daily-digest").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod collaborators;
pub mod context;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod observability;
pub mod pipeline;
pub mod providers;
pub mod runner;
pub mod settings;
pub mod steps;
pub mod testing;
pub mod webhook;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::collaborators::{
        Collaborators, ContentItem, ContentStore, FileInfo, FileStore, NewContentItem,
        ProviderConfigStore, TaxonomySource, TaxonomyTerm,
    };
    pub use crate::context::{render_template, ExecutionContext, RunIdentity};
    pub use crate::errors::{ContentflowError, Result};
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, PipelineEvent,
    };
    pub use crate::handlers::{StepDataHandler, StepDataHandlerManager};
    pub use crate::pipeline::{
        InMemoryPipelineRepository, Pipeline, PipelineRepository, RecurringFrequency, Schedule,
        ScheduleType,
    };
    pub use crate::providers::{
        ActionProvider, ActionProviderRegistry, LlmProvider, LlmProviderRegistry, ProviderConfig,
    };
    pub use crate::runner::{IngestReport, ResultIngestor, RunDriver, RunReport, StepRunReport, StepStatus};
    pub use crate::settings::Settings;
    pub use crate::steps::{
        ExecutableStep, StepCollection, StepDefinition, StepServices, StepType, StepTypeRegistry,
    };
    pub use crate::webhook::{HttpMethod, WebhookAuth, WebhookConfig, WebhookDispatcher};
}
