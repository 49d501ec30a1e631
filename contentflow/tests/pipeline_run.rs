//! End-to-end runs over in-memory stores and mock providers.

use std::sync::Arc;

use contentflow::errors::ContentflowError;
use contentflow::pipeline::{Pipeline, FAILURE_THRESHOLD};
use contentflow::providers::ProviderConfig;
use contentflow::runner::StepStatus;
use contentflow::steps::{
    LlmPayload, SearchPayload, StepDefinition, StepPayload, StepTypeRegistry, LLM_STEP,
    SEARCH_STEP,
};
use contentflow::testing::{FailingProvider, MockActionProvider, MockLlmProvider, TestHarness};
use pretty_assertions::assert_eq;
use serde_json::json;

fn model_step(model: &str, prompt: &str) -> StepDefinition {
    StepDefinition::new(
        LLM_STEP,
        StepPayload::Llm(LlmPayload {
            prompt: prompt.to_string(),
            llm_service: Some(model.to_string()),
            ..Default::default()
        }),
    )
}

fn google_step(query: &str) -> StepDefinition {
    StepDefinition::new(
        SEARCH_STEP,
        StepPayload::Search(SearchPayload {
            query: query.to_string(),
            google_search_config: Some(json!({"api_key": "k", "cx": "c"})),
            ..Default::default()
        }),
    )
}

#[tokio::test]
async fn test_steps_run_in_weight_order() {
    let search = google_step("news about {previous_result}")
        .with_uuid("search")
        .with_weight(2);
    let model = model_step("gpt-4o", "Write a headline")
        .with_uuid("model")
        .with_weight(0);
    let action = StepDefinition::action("notify", json!({"channel": "ops"}))
        .with_uuid("action")
        .with_weight(1);

    let harness = TestHarness::new().with_pipeline(
        Pipeline::new("p1", "Ordering")
            .with_step(search)
            .with_step(model)
            .with_step(action),
    );
    let llm = Arc::new(MockLlmProvider::new("openai").with_response("draft"));
    let notify = Arc::new(MockActionProvider::new("notify").with_response("sent"));
    let google = Arc::new(MockActionProvider::new("google_search").with_response("[hits]"));
    harness.services.llm.register_instance("openai", llm.clone());
    harness.services.actions.register_instance("notify", notify.clone());
    harness.services.actions.register_instance("google_search", google.clone());

    let report = harness.driver().run("p1").await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.executed_uuids(), vec!["model", "action", "search"]);
    assert_eq!(report.context.results(), ["draft", "sent", "[hits]"]);
    assert_eq!(notify.seen_results(), vec![vec!["draft".to_string()]]);
    assert_eq!(google.calls()[0]["query"], "news about sent");

    let stored = harness.pipeline("p1");
    assert_eq!(
        stored.steps().get("model").unwrap().configuration.response.as_deref(),
        Some("draft")
    );
    assert_eq!(stored.execution_failures(), 0);
    assert!(stored.last_run_at().is_some());
}

#[tokio::test]
async fn test_failed_step_does_not_stop_the_run() {
    let harness = TestHarness::new().with_pipeline(
        Pipeline::new("p1", "Partial")
            .with_step(
                StepDefinition::action("flaky", json!({}))
                    .with_uuid("first")
                    .with_description("Notify editors"),
            )
            .with_step(
                StepDefinition::action("notify", json!({}))
                    .with_uuid("second")
                    .with_weight(1),
            ),
    );
    harness
        .services
        .actions
        .register_instance("flaky", Arc::new(FailingProvider::new("flaky", "down")));
    harness
        .services
        .actions
        .register_instance("notify", Arc::new(MockActionProvider::new("notify").with_response("ok")));

    let report = harness.driver().run("p1").await.unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    let first = &report.steps[0];
    assert_eq!(first.status, StepStatus::Failed);
    assert_eq!(first.error_kind.as_deref(), Some("ProviderError"));
    assert!(first.progress_message.starts_with("Step 1 of 2 (Notify editors) failed"));
    assert_eq!(report.steps[1].progress_message, "Step 2 of 2 (action_step) completed");
    assert!(report
        .context
        .error_message()
        .unwrap()
        .starts_with("Notify editors:"));
    assert_eq!(report.execution_failures, 1);
}

#[tokio::test]
async fn test_pipeline_disables_after_repeated_failed_runs() {
    let failing = Arc::new(FailingProvider::new("openai", "quota exceeded"));
    let harness = TestHarness::new()
        .with_pipeline(Pipeline::new("p1", "Doomed").with_step(model_step("gpt-4o", "hi")));
    harness.services.llm.register_instance("openai", failing.clone());
    let driver = harness.driver();

    for run in 1..=FAILURE_THRESHOLD {
        let report = driver.run("p1").await.unwrap();
        assert_eq!(report.execution_failures, run);
        assert_eq!(report.pipeline_disabled, run == FAILURE_THRESHOLD);
    }

    let stored = harness.pipeline("p1");
    assert!(!stored.is_enabled());
    assert_eq!(stored.execution_failures(), FAILURE_THRESHOLD);

    let err = driver.run("p1").await.unwrap_err();
    assert!(matches!(err, ContentflowError::PipelineDisabled { .. }));
    assert_eq!(failing.call_count(), FAILURE_THRESHOLD as usize);
    assert_eq!(harness.events.events_of_type("pipeline.disabled").len(), 1);
}

#[tokio::test]
async fn test_successful_run_resets_failure_counter() {
    let llm = Arc::new(MockLlmProvider::new("openai").with_response("ok"));
    let harness = TestHarness::new()
        .with_pipeline(Pipeline::new("p1", "Recovering").with_step(model_step("gpt-4o", "hi")));
    harness.services.llm.register_instance("openai", llm);

    let mut pipeline = harness.pipeline("p1");
    pipeline.increment_execution_failures();
    pipeline.increment_execution_failures();
    harness.repository.insert(pipeline);

    let report = harness.driver().run("p1").await.unwrap();

    assert_eq!(report.execution_failures, 0);
    assert!(harness.pipeline("p1").is_enabled());
}

#[tokio::test]
async fn test_non_executable_step_type_is_reported() {
    let harness = TestHarness::new().with_pipeline(
        Pipeline::new("p1", "Notes")
            .with_step(StepDefinition::new("note", StepPayload::default()).with_uuid("note"))
            .with_step(
                StepDefinition::action("notify", json!({}))
                    .with_uuid("after")
                    .with_weight(1),
            ),
    );
    harness
        .services
        .actions
        .register_instance("notify", Arc::new(MockActionProvider::new("notify").with_response("ok")));
    let mut step_types = StepTypeRegistry::with_builtin();
    step_types.register_plain("note");

    let report = harness
        .driver()
        .with_step_types(step_types)
        .run("p1")
        .await
        .unwrap();

    assert_eq!(report.steps[0].status, StepStatus::NotExecutable);
    assert_eq!(report.steps[0].error_kind.as_deref(), Some("NotExecutableError"));
    assert!(report.steps[1].is_success());
}

#[tokio::test]
async fn test_unknown_step_type_fails_only_that_step() {
    let harness = TestHarness::new().with_pipeline(
        Pipeline::new("p1", "Ghost")
            .with_step(StepDefinition::new("ghost", StepPayload::default()).with_uuid("ghost")),
    );

    let report = harness.driver().run("p1").await.unwrap();

    assert_eq!(report.steps[0].status, StepStatus::Failed);
    assert_eq!(report.steps[0].error_kind.as_deref(), Some("NotFoundError"));
}

#[tokio::test]
async fn test_stored_llm_config_reaches_the_provider() {
    let harness = TestHarness::new().with_pipeline(
        Pipeline::new("p1", "Configured").with_step(StepDefinition::new(
            LLM_STEP,
            StepPayload::Llm(LlmPayload {
                prompt: "Summarize".to_string(),
                llm_config: Some("writer".to_string()),
                ..Default::default()
            }),
        )),
    );
    harness.provider_configs.insert(
        ProviderConfig::new("writer", "openai")
            .with_model("gpt-4o-mini")
            .with_parameter("temperature", json!(0.2)),
    );
    let llm = Arc::new(MockLlmProvider::new("openai").with_response("summary"));
    harness.services.llm.register_instance("openai", llm.clone());

    let report = harness.driver().run("p1").await.unwrap();

    assert!(report.is_success());
    let (config, prompt) = &llm.calls()[0];
    assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
    assert_eq!(config.parameter("temperature"), Some(&json!(0.2)));
    assert_eq!(prompt, "Summarize");
}

#[tokio::test]
async fn test_output_keys_feed_later_templates() {
    let harness = TestHarness::new().with_pipeline(
        Pipeline::new("p1", "Keys")
            .with_step(model_step("gpt-4o", "Title please").with_output_key("title"))
            .with_step(model_step("gpt-4o", "Expand on {title}").with_weight(1)),
    );
    let llm = Arc::new(MockLlmProvider::new("openai").with_response("Rust 2026"));
    harness.services.llm.register_instance("openai", llm.clone());

    harness.driver().run("p1").await.unwrap();

    assert_eq!(llm.calls()[1].1, "Expand on Rust 2026");
}

#[tokio::test]
async fn test_run_emits_lifecycle_events() {
    let harness = TestHarness::new()
        .with_pipeline(Pipeline::new("p1", "Events").with_step(model_step("gpt-4o", "hi")));
    harness
        .services
        .llm
        .register_instance("openai", Arc::new(MockLlmProvider::new("openai")));

    harness.driver().run("p1").await.unwrap();

    let types: Vec<_> = harness
        .events
        .events()
        .iter()
        .map(|e| e.event_type())
        .collect();
    assert_eq!(
        types,
        vec!["run.started", "step.started", "step.completed", "run.completed"]
    );
}

#[tokio::test]
async fn test_missing_pipeline_is_not_found() {
    let harness = TestHarness::new();
    let err = harness.driver().run("nope").await.unwrap_err();
    assert_eq!(err.kind(), "NotFoundError");
}
