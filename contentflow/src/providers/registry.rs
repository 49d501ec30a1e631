//! Registries mapping provider ids to implementations.

use super::{ActionProvider, LlmProvider};
use crate::errors::{ContentflowError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Factory function type for creating providers.
pub type ProviderFactory<P> = Box<dyn Fn() -> Arc<P> + Send + Sync>;

/// Registry of LLM providers.
pub type LlmProviderRegistry = ProviderRegistry<dyn LlmProvider>;

/// Registry of action providers.
pub type ActionProviderRegistry = ProviderRegistry<dyn ActionProvider>;

/// Maps provider ids to constructors and memoizes constructed instances.
///
/// Adding a provider is a matter of registering an id and a constructor;
/// dispatch code never changes.
pub struct ProviderRegistry<P: ?Sized> {
    kind: &'static str,
    factories: RwLock<HashMap<String, ProviderFactory<P>>>,
    instances: RwLock<HashMap<String, Arc<P>>>,
}

impl<P: ?Sized + Send + Sync> ProviderRegistry<P> {
    /// Creates an empty registry. `kind` names the provider family in errors.
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            factories: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a constructor. Replaces any earlier registration.
    pub fn register<F>(&self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<P> + Send + Sync + 'static,
    {
        let id = id.into();
        self.instances.write().remove(&id);
        self.factories.write().insert(id, Box::new(factory));
    }

    /// Registers a ready-made instance.
    pub fn register_instance(&self, id: impl Into<String>, provider: Arc<P>) {
        let id = id.into();
        self.factories.write().remove(&id);
        self.instances.write().insert(id, provider);
    }

    /// Returns the provider for an id, constructing it on first use.
    pub fn get(&self, id: &str) -> Result<Arc<P>> {
        if let Some(instance) = self.instances.read().get(id) {
            return Ok(Arc::clone(instance));
        }

        let instance = {
            let factories = self.factories.read();
            let factory = factories
                .get(id)
                .ok_or_else(|| ContentflowError::not_found(self.kind, id))?;
            factory()
        };

        let mut instances = self.instances.write();
        let entry = instances.entry(id.to_string()).or_insert(instance);
        Ok(Arc::clone(entry))
    }

    /// Whether an id is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.instances.read().contains_key(id) || self.factories.read().contains_key(id)
    }

    /// Registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .factories
            .read()
            .keys()
            .chain(self.instances.read().keys())
            .cloned()
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

impl<P: ?Sized> std::fmt::Debug for ProviderRegistry<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("kind", &self.kind)
            .field("factory_count", &self.factories.read().len())
            .field("instance_count", &self.instances.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn id(&self) -> &str {
            "echo"
        }

        async fn call(&self, _config: &ProviderConfig, prompt: &str) -> Result<String> {
            Ok(prompt.to_string())
        }
    }

    #[test]
    fn test_unknown_provider_is_not_found() {
        let registry = LlmProviderRegistry::new("llm provider");
        let err = registry.get("missing").err().unwrap();
        assert_eq!(err.to_string(), "llm provider 'missing' not found");
    }

    #[test]
    fn test_factory_is_memoized() {
        let registry = LlmProviderRegistry::new("llm provider");
        let constructed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructed);

        registry.register("echo", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(EchoProvider) as Arc<dyn LlmProvider>
        });

        let first = registry.get("echo").unwrap();
        let second = registry.get("echo").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_instance_and_ids() {
        let registry = LlmProviderRegistry::new("llm provider");
        registry.register_instance("b", Arc::new(EchoProvider));
        registry.register("a", || Arc::new(EchoProvider) as Arc<dyn LlmProvider>);

        assert!(registry.contains("a"));
        assert!(registry.contains("b"));
        assert_eq!(registry.ids(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_registered_provider_is_callable() {
        let registry = LlmProviderRegistry::new("llm provider");
        registry.register_instance("echo", Arc::new(EchoProvider));

        let provider = registry.get("echo").unwrap();
        let out = provider
            .call(&ProviderConfig::new("c", "echo"), "hello")
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }
}
