//! Search step.

use super::action::merge_resolved;
use super::base::executable_step_type;
use super::{ConfigurableStep, ExecutableStep, StepDefinition, StepPayload, StepServices, StepType};
use crate::context::{render_template, ExecutionContext};
use crate::errors::{ContentflowError, Result};
use crate::providers::{GoogleSearchProvider, NewsApiProvider};
use async_trait::async_trait;

/// Renders its query and runs it against Google or NewsAPI, depending on
/// which config block is present. Google wins when both are.
#[derive(Debug, Clone)]
pub struct SearchStep {
    base: ConfigurableStep,
    services: StepServices,
}

impl SearchStep {
    /// Binds the step to a definition.
    #[must_use]
    pub fn new(definition: StepDefinition, services: &StepServices) -> Self {
        Self {
            base: ConfigurableStep::new(definition),
            services: services.clone(),
        }
    }
}

#[async_trait]
impl ExecutableStep for SearchStep {
    async fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<String> {
        let configuration = self.base.configuration();
        let StepPayload::Search(payload) = &configuration.payload else {
            return Err(ContentflowError::configuration(format!(
                "step '{}' has no search configuration",
                self.base.uuid()
            )));
        };

        let (service, block) = match (&payload.google_search_config, &payload.news_api_config) {
            (Some(block), _) => (GoogleSearchProvider::ID, block),
            (None, Some(block)) => (NewsApiProvider::ID, block),
            (None, None) => {
                return Err(ContentflowError::configuration(format!(
                    "step '{}' has neither a Google nor a NewsAPI configuration",
                    self.base.uuid()
                )))
            }
        };

        let query = render_template(&payload.query, ctx);
        let query = query.trim();
        if query.is_empty() {
            return Err(ContentflowError::configuration(format!(
                "step '{}' has an empty search query",
                self.base.uuid()
            )));
        }

        let mut config = merge_resolved(block, &configuration.resolved);
        if let serde_json::Value::Object(map) = &mut config {
            map.insert("query".to_string(), query.into());
        }

        let provider = self.services.actions.get(service).map_err(|_| {
            ContentflowError::configuration(format!("search provider '{service}' is not registered"))
        })?;
        tracing::debug!(step_uuid = self.base.uuid(), service, query, "Running search");
        provider.execute(&config, ctx).await
    }
}

executable_step_type!(SearchStep);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::SearchPayload;
    use crate::testing::{mock_services, MockActionProvider};
    use std::sync::Arc;

    fn search_step(payload: SearchPayload, services: &StepServices) -> SearchStep {
        SearchStep::new(
            StepDefinition::new(crate::steps::SEARCH_STEP, StepPayload::Search(payload)),
            services,
        )
    }

    #[tokio::test]
    async fn test_news_block_routes_to_news_api() {
        let services = mock_services();
        let news = Arc::new(MockActionProvider::new("news_api").with_response("[]"));
        services.actions.register_instance("news_api", news.clone());

        let mut step = search_step(
            SearchPayload {
                query: "news about {topic}".to_string(),
                news_api_config: Some(serde_json::json!({"api_key": "k"})),
                ..Default::default()
            },
            &services,
        );
        let mut ctx = ExecutionContext::for_pipeline("p");
        ctx.record_output("s", Some("topic"), "tides");

        step.execute(&mut ctx).await.unwrap();
        let config = &news.calls()[0];
        assert_eq!(config["query"], "news about tides");
        assert_eq!(config["api_key"], "k");
    }

    #[tokio::test]
    async fn test_requires_a_config_block() {
        let services = mock_services();
        let mut step = search_step(
            SearchPayload {
                query: "x".to_string(),
                ..Default::default()
            },
            &services,
        );
        let err = step.execute(&mut ExecutionContext::for_pipeline("p")).await.unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[tokio::test]
    async fn test_requires_a_query() {
        let services = mock_services();
        let mut step = search_step(
            SearchPayload {
                query: "  ".to_string(),
                google_search_config: Some(serde_json::json!({})),
                ..Default::default()
            },
            &services,
        );
        let err = step.execute(&mut ExecutionContext::for_pipeline("p")).await.unwrap_err();
        assert!(err.to_string().contains("empty search query"));
    }
}
