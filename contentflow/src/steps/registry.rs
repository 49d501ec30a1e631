//! Step type registry and per-pipeline instance cache.

use super::{
    ActionStep, ConfigurableStep, LlmStep, SearchStep, StepDefinition, StepServices, StepType,
    UploadStep, ACTION_STEP, LLM_STEP, SEARCH_STEP, UPLOAD_STEP,
};
use crate::errors::{ContentflowError, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Factory producing a step instance bound to a stored definition.
pub type StepFactory = Box<dyn Fn(StepDefinition, &StepServices) -> Box<dyn StepType> + Send + Sync>;

/// Maps step type ids to factories.
pub struct StepTypeRegistry {
    factories: HashMap<String, StepFactory>,
}

impl StepTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Creates a registry with the four built-in step types.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(LLM_STEP, |d, s| Box::new(LlmStep::new(d, s)));
        registry.register(ACTION_STEP, |d, s| Box::new(ActionStep::new(d, s)));
        registry.register(SEARCH_STEP, |d, s| Box::new(SearchStep::new(d, s)));
        registry.register(UPLOAD_STEP, |d, s| Box::new(UploadStep::new(d, s)));
        registry
    }

    /// Registers a factory. Replaces any earlier registration.
    pub fn register<F>(&mut self, step_type_id: impl Into<String>, factory: F)
    where
        F: Fn(StepDefinition, &StepServices) -> Box<dyn StepType> + Send + Sync + 'static,
    {
        self.factories.insert(step_type_id.into(), Box::new(factory));
    }

    /// Registers a type that has no behavior of its own.
    pub fn register_plain(&mut self, step_type_id: impl Into<String>) {
        self.register(step_type_id, |d, _| Box::new(ConfigurableStep::new(d)));
    }

    /// Whether a step type id is registered.
    #[must_use]
    pub fn contains(&self, step_type_id: &str) -> bool {
        self.factories.contains_key(step_type_id)
    }

    /// Creates a fresh instance for a definition.
    pub fn create(
        &self,
        definition: StepDefinition,
        services: &StepServices,
    ) -> Result<Box<dyn StepType>> {
        let factory = self
            .factories
            .get(&definition.step_type_id)
            .ok_or_else(|| ContentflowError::not_found("step type", &definition.step_type_id))?;
        Ok(factory(definition, services))
    }
}

impl Default for StepTypeRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for StepTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.factories.keys().collect();
        ids.sort();
        f.debug_struct("StepTypeRegistry").field("types", &ids).finish()
    }
}

/// Step instances of one loaded pipeline, created on first access.
#[derive(Debug, Default)]
pub struct StepInstances {
    instances: HashMap<String, Box<dyn StepType>>,
}

impl StepInstances {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instance for a definition, creating it on first access.
    pub fn get_or_create(
        &mut self,
        definition: &StepDefinition,
        registry: &StepTypeRegistry,
        services: &StepServices,
    ) -> Result<&mut Box<dyn StepType>> {
        match self.instances.entry(definition.uuid.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                tracing::trace!(step_uuid = %definition.uuid, step_type = %definition.step_type_id, "Creating step instance");
                Ok(entry.insert(registry.create(definition.clone(), services)?))
            }
        }
    }

    /// Drops a cached instance.
    pub fn evict(&mut self, uuid: &str) {
        self.instances.remove(uuid);
    }

    /// Number of cached instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
