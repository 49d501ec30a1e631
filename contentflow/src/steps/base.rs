//! The configurable base every built-in step type is layered on.

use super::{StepConfiguration, StepDefinition, StepType};
use crate::providers::{ActionProviderRegistry, LlmProviderRegistry, DEFAULT_PROVIDER};
use std::sync::Arc;

/// Services step instances dispatch to.
#[derive(Debug, Clone)]
pub struct StepServices {
    /// LLM providers.
    pub llm: Arc<LlmProviderRegistry>,
    /// Action providers.
    pub actions: Arc<ActionProviderRegistry>,
    /// Provider used when a model name is not in the lookup table.
    pub default_llm_provider: String,
}

impl StepServices {
    /// Creates the service set.
    #[must_use]
    pub fn new(llm: Arc<LlmProviderRegistry>, actions: Arc<ActionProviderRegistry>) -> Self {
        Self {
            llm,
            actions,
            default_llm_provider: DEFAULT_PROVIDER.to_string(),
        }
    }

    /// Overrides the fallback provider.
    #[must_use]
    pub fn with_default_llm_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_llm_provider = provider.into();
        self
    }
}

/// Base state of a step instance: identity, weight and configuration.
///
/// On its own it is a valid, non-executable step type. Executable types
/// embed it and delegate the base contract to it.
#[derive(Debug, Clone)]
pub struct ConfigurableStep {
    step_type_id: String,
    uuid: String,
    weight: i32,
    configuration: StepConfiguration,
}

impl ConfigurableStep {
    /// Binds a base step to a stored definition.
    #[must_use]
    pub fn new(definition: StepDefinition) -> Self {
        Self {
            step_type_id: definition.step_type_id,
            uuid: definition.uuid,
            weight: definition.weight,
            configuration: definition.configuration,
        }
    }

    /// Description, falling back to the step type id.
    #[must_use]
    pub fn description(&self) -> &str {
        if self.configuration.step_description.is_empty() {
            &self.step_type_id
        } else {
            &self.configuration.step_description
        }
    }

    /// Output key, if one is declared.
    #[must_use]
    pub fn output_key(&self) -> Option<&str> {
        self.configuration.step_output_key.as_deref()
    }

    /// Declared required output keys.
    #[must_use]
    pub fn required_steps(&self) -> &[String] {
        &self.configuration.required_steps
    }

    /// Cached last response.
    #[must_use]
    pub fn response(&self) -> Option<&str> {
        self.configuration.response.as_deref()
    }
}

impl StepType for ConfigurableStep {
    fn id(&self) -> &str {
        &self.step_type_id
    }

    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn label(&self) -> &str {
        self.description()
    }

    fn weight(&self) -> i32 {
        self.weight
    }

    fn set_weight(&mut self, weight: i32) {
        self.weight = weight;
    }

    fn configuration(&self) -> &StepConfiguration {
        &self.configuration
    }

    fn set_configuration(&mut self, configuration: StepConfiguration) {
        self.configuration = configuration;
    }
}

/// Implements the base [`StepType`] contract by delegating to a `base` field,
/// and exposes the type as executable.
macro_rules! executable_step_type {
    ($ty:ty) => {
        impl $crate::steps::StepType for $ty {
            fn id(&self) -> &str {
                self.base.id()
            }

            fn uuid(&self) -> &str {
                self.base.uuid()
            }

            fn label(&self) -> &str {
                self.base.label()
            }

            fn weight(&self) -> i32 {
                self.base.weight()
            }

            fn set_weight(&mut self, weight: i32) {
                self.base.set_weight(weight);
            }

            fn configuration(&self) -> &$crate::steps::StepConfiguration {
                self.base.configuration()
            }

            fn set_configuration(&mut self, configuration: $crate::steps::StepConfiguration) {
                self.base.set_configuration(configuration);
            }

            fn as_executable(&mut self) -> Option<&mut dyn $crate::steps::ExecutableStep> {
                Some(self)
            }
        }
    };
}

pub(crate) use executable_step_type;
