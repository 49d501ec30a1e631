//! Stored step definitions and their typed configuration.

use crate::collaborators::{ContentItem, FileInfo};
use crate::errors::{ContentflowError, Result};
use crate::providers::ProviderConfig;
use serde::{Deserialize, Serialize};

/// Step type id of the language-model step.
pub const LLM_STEP: &str = "llm_step";
/// Step type id of the action step.
pub const ACTION_STEP: &str = "action_step";
/// Step type id of the search step.
pub const SEARCH_STEP: &str = "search_step";
/// Step type id of the upload step.
pub const UPLOAD_STEP: &str = "upload_step";

const BASE_KEYS: &[&str] = &[
    "id",
    "type",
    "uuid",
    "weight",
    "step_description",
    "step_output_key",
    "required_steps",
    "response",
];

/// Payload of a language-model step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmPayload {
    /// Prompt template.
    #[serde(default)]
    pub prompt: String,
    /// Id of a stored provider config.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_config: Option<String>,
    /// Model name (or provider id) used when no config is referenced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_service: Option<String>,
}

/// Payload of an action step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionPayload {
    /// Action provider id.
    #[serde(default)]
    pub action_service: String,
    /// Provider-specific action config.
    #[serde(default)]
    pub action_config: serde_json::Value,
    /// Id of a content item to attach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    /// Id of a stored provider config holding credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config: Option<String>,
}

/// Payload of a search step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPayload {
    /// Query template.
    #[serde(default)]
    pub query: String,
    /// Google Custom Search settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_search_config: Option<serde_json::Value>,
    /// NewsAPI settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_api_config: Option<serde_json::Value>,
    /// Id of a stored provider config holding the API credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config: Option<String>,
}

/// Payload of an upload step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadPayload {
    /// Id of the uploaded file.
    #[serde(default)]
    pub file_id: String,
    /// Optional action provider the file is handed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_service: Option<String>,
    /// Config for that action provider.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub action_config: serde_json::Value,
}

/// Type-specific part of a step configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum StepPayload {
    /// `llm_step`
    Llm(LlmPayload),
    /// `action_step`
    Action(ActionPayload),
    /// `search_step`
    Search(SearchPayload),
    /// `upload_step`
    Upload(UploadPayload),
    /// Any other step type; fields are kept verbatim.
    Other(serde_json::Map<String, serde_json::Value>),
}

impl Default for StepPayload {
    fn default() -> Self {
        Self::Other(serde_json::Map::new())
    }
}

impl StepPayload {
    fn from_fields(
        step_type_id: &str,
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self> {
        let value = serde_json::Value::Object(fields);
        let invalid = |e: serde_json::Error| {
            ContentflowError::configuration(format!("invalid {step_type_id} configuration: {e}"))
        };
        Ok(match step_type_id {
            LLM_STEP => Self::Llm(serde_json::from_value(value).map_err(invalid)?),
            ACTION_STEP => Self::Action(serde_json::from_value(value).map_err(invalid)?),
            SEARCH_STEP => Self::Search(serde_json::from_value(value).map_err(invalid)?),
            UPLOAD_STEP => Self::Upload(serde_json::from_value(value).map_err(invalid)?),
            _ => match value {
                serde_json::Value::Object(map) => Self::Other(map),
                _ => Self::default(),
            },
        })
    }

    fn to_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        let value = match self {
            Self::Llm(p) => serde_json::to_value(p),
            Self::Action(p) => serde_json::to_value(p),
            Self::Search(p) => serde_json::to_value(p),
            Self::Upload(p) => serde_json::to_value(p),
            Self::Other(map) => return map.clone(),
        };
        match value {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// Execution-ready data attached by a step data handler. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedStepData {
    /// Loaded provider config (LLM config, action credentials or search credentials).
    pub provider_config: Option<ProviderConfig>,
    /// Provider id the step should dispatch to.
    pub provider_id: Option<String>,
    /// Model name resolved from the config.
    pub model: Option<String>,
    /// Loaded content item.
    pub content: Option<ContentItem>,
    /// Loaded uploaded file.
    pub file: Option<FileInfo>,
}

impl ResolvedStepData {
    /// Whether nothing has been resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A step's configuration: the shared base record plus the typed payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepConfiguration {
    /// Human-readable description.
    pub step_description: String,
    /// Key under which the output is stored in the run context.
    pub step_output_key: Option<String>,
    /// Output keys this step expects earlier steps to have produced.
    pub required_steps: Vec<String>,
    /// Last response, cached after each execution.
    pub response: Option<String>,
    /// Type-specific payload.
    pub payload: StepPayload,
    /// Handler-resolved data.
    pub resolved: ResolvedStepData,
}

/// One step as stored in a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub struct StepDefinition {
    /// Unique within the owning pipeline.
    pub uuid: String,
    /// Step type id in the [`StepTypeRegistry`](super::StepTypeRegistry).
    pub step_type_id: String,
    /// Sort key, ascending.
    pub weight: i32,
    /// Configuration.
    pub configuration: StepConfiguration,
}

impl StepDefinition {
    /// Creates a definition with a fresh uuid.
    #[must_use]
    pub fn new(step_type_id: impl Into<String>, payload: StepPayload) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            step_type_id: step_type_id.into(),
            weight: 0,
            configuration: StepConfiguration {
                payload,
                ..Default::default()
            },
        }
    }

    /// Creates a language-model step.
    #[must_use]
    pub fn llm(prompt: impl Into<String>) -> Self {
        Self::new(
            LLM_STEP,
            StepPayload::Llm(LlmPayload {
                prompt: prompt.into(),
                ..Default::default()
            }),
        )
    }

    /// Creates an action step.
    #[must_use]
    pub fn action(action_service: impl Into<String>, action_config: serde_json::Value) -> Self {
        Self::new(
            ACTION_STEP,
            StepPayload::Action(ActionPayload {
                action_service: action_service.into(),
                action_config,
                ..Default::default()
            }),
        )
    }

    /// Creates a search step.
    #[must_use]
    pub fn search(query: impl Into<String>) -> Self {
        Self::new(
            SEARCH_STEP,
            StepPayload::Search(SearchPayload {
                query: query.into(),
                ..Default::default()
            }),
        )
    }

    /// Creates an upload step.
    #[must_use]
    pub fn upload(file_id: impl Into<String>) -> Self {
        Self::new(
            UPLOAD_STEP,
            StepPayload::Upload(UploadPayload {
                file_id: file_id.into(),
                ..Default::default()
            }),
        )
    }

    /// Sets the uuid.
    #[must_use]
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    /// Sets the weight.
    #[must_use]
    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.configuration.step_description = description.into();
        self
    }

    /// Sets the output key.
    #[must_use]
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.configuration.step_output_key = Some(key.into());
        self
    }

    /// Sets the required output keys.
    #[must_use]
    pub fn with_required_steps<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.configuration.required_steps = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Reads a definition from its flat payload form.
    ///
    /// The step type id is taken from `id`, falling back to `type`. A missing
    /// `uuid` gets a fresh one. Everything that is not a base key goes to the
    /// typed payload.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self> {
        let object = payload.as_object().ok_or_else(|| {
            ContentflowError::configuration("step definition must be a JSON object")
        })?;
        let text = |key: &str| {
            object
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        let step_type_id = text("id")
            .or_else(|| text("type"))
            .ok_or_else(|| ContentflowError::configuration("step definition has no type id"))?
            .to_string();
        let uuid = text("uuid").map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);
        let weight = match object.get("weight") {
            None | Some(serde_json::Value::Null) => 0,
            Some(serde_json::Value::String(s)) => s.trim().parse().map_err(|_| {
                ContentflowError::configuration(format!("step '{uuid}' has invalid weight '{s}'"))
            })?,
            Some(v) => v
                .as_i64()
                .and_then(|w| i32::try_from(w).ok())
                .ok_or_else(|| {
                    ContentflowError::configuration(format!("step '{uuid}' has invalid weight {v}"))
                })?,
        };
        let required_steps = match object.get("required_steps") {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect(),
            Some(serde_json::Value::String(list)) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        let fields: serde_json::Map<String, serde_json::Value> = object
            .iter()
            .filter(|(k, _)| !BASE_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            configuration: StepConfiguration {
                step_description: text("step_description").unwrap_or_default().to_string(),
                step_output_key: text("step_output_key").map(str::to_string),
                required_steps,
                response: object
                    .get("response")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                payload: StepPayload::from_fields(&step_type_id, fields)?,
                resolved: ResolvedStepData::default(),
            },
            uuid,
            step_type_id,
            weight,
        })
    }

    /// Writes the flat payload form. Handler-resolved data is never included.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        let mut map = self.configuration.payload.to_fields();
        let config = &self.configuration;
        map.insert("id".to_string(), self.step_type_id.clone().into());
        map.insert("type".to_string(), self.step_type_id.clone().into());
        map.insert("uuid".to_string(), self.uuid.clone().into());
        map.insert("weight".to_string(), self.weight.into());
        map.insert(
            "step_description".to_string(),
            config.step_description.clone().into(),
        );
        if let Some(key) = &config.step_output_key {
            map.insert("step_output_key".to_string(), key.clone().into());
        }
        map.insert(
            "required_steps".to_string(),
            serde_json::json!(config.required_steps),
        );
        if let Some(response) = &config.response {
            map.insert("response".to_string(), response.clone().into());
        }
        serde_json::Value::Object(map)
    }
}

impl TryFrom<serde_json::Value> for StepDefinition {
    type Error = ContentflowError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        Self::from_payload(&value)
    }
}

impl From<StepDefinition> for serde_json::Value {
    fn from(definition: StepDefinition) -> Self {
        definition.to_payload()
    }
}
