//! Step types: the units of work a pipeline runs.
//!
//! A stored [`StepDefinition`] is turned into a live [`StepType`] instance by
//! the [`StepTypeRegistry`]. Instances that can run also implement
//! [`ExecutableStep`] and expose it through [`StepType::as_executable`].

mod action;
mod base;
pub mod collection;
mod definition;
mod llm;
mod registry;
mod search;
mod upload;

pub use action::ActionStep;
pub use base::{ConfigurableStep, StepServices};
pub use collection::StepCollection;
pub use definition::{
    ActionPayload, LlmPayload, ResolvedStepData, SearchPayload, StepConfiguration,
    StepDefinition, StepPayload, UploadPayload, ACTION_STEP, LLM_STEP, SEARCH_STEP, UPLOAD_STEP,
};
pub use llm::LlmStep;
pub use registry::{StepFactory, StepInstances, StepTypeRegistry};
pub use search::SearchStep;
pub use upload::UploadStep;

use crate::context::ExecutionContext;
use crate::errors::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// Base contract of a step instance.
pub trait StepType: Send + Sync + Debug {
    /// Step type id.
    fn id(&self) -> &str;

    /// Uuid of the bound definition.
    fn uuid(&self) -> &str;

    /// Human-readable label.
    fn label(&self) -> &str;

    /// Sort key.
    fn weight(&self) -> i32;

    /// Sets the sort key.
    fn set_weight(&mut self, weight: i32);

    /// Current configuration.
    fn configuration(&self) -> &StepConfiguration;

    /// Replaces the configuration.
    fn set_configuration(&mut self, configuration: StepConfiguration);

    /// The executable contract, when this type implements it.
    fn as_executable(&mut self) -> Option<&mut dyn ExecutableStep> {
        None
    }
}

/// A step that can run.
#[async_trait]
pub trait ExecutableStep: Send + Sync {
    /// Runs the step and returns its output. Recording the output into the
    /// context is the caller's job.
    async fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<String>;
}
