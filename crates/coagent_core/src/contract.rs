use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const HOOK_SUMMARY_SCHEMA_VERSION: &str = "v1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LifecycleHookEvent {
    #[serde(rename = "DeploymentId")]
    pub deployment_id: String,
    #[serde(rename = "LifecycleEventHookExecutionId")]
    pub lifecycle_event_hook_execution_id: String,
    #[serde(
        rename = "CurrentVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_version: Option<String>,
    #[serde(rename = "NewVersion", default, skip_serializing_if = "Option::is_none")]
    pub new_version: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LifecycleStatus {
    Succeeded,
    Failed,
}

impl LifecycleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        }
    }

    pub fn from_checks(checks: &[CheckOutcome]) -> Self {
        if checks.iter().all(|check| check.passed) {
            Self::Succeeded
        } else {
            Self::Failed
        }
    }
}

impl std::fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body sent to the deployment controller's status-reporting call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub deployment_id: String,
    pub lifecycle_event_hook_execution_id: String,
    pub status: LifecycleStatus,
}

impl StatusReport {
    pub fn for_event(event: &LifecycleHookEvent, status: LifecycleStatus) -> Self {
        Self {
            deployment_id: event.deployment_id.clone(),
            lifecycle_event_hook_execution_id: event.lifecycle_event_hook_execution_id.clone(),
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    PreTraffic,
    PostTraffic,
}

impl HookKind {
    pub fn component(self) -> &'static str {
        match self {
            Self::PreTraffic => "pre_traffic_hook",
            Self::PostTraffic => "post_traffic_hook",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckOutcome {
    pub fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HookSummary {
    pub hook: HookKind,
    pub deployment_id: String,
    pub status: LifecycleStatus,
    pub checks: Vec<CheckOutcome>,
    pub schema_version: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HookError {
    #[error("invalid lifecycle event: {0}")]
    InvalidEvent(String),

    #[error("check '{check}' could not run: {message}")]
    CheckFailed { check: String, message: String },

    #[error("failed to report lifecycle status {status}: {message}")]
    ReportFailed {
        status: LifecycleStatus,
        message: String,
    },
}

/// Incoming AI proxy body. Fields stay optional so absence maps to a 400
/// instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProxyRequest {
    #[serde(rename = "type", default)]
    pub flow_type: Option<String>,
    #[serde(default)]
    pub input: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedProxyRequest {
    pub flow_type: String,
    pub input: Map<String, Value>,
}

impl ProxyRequest {
    pub fn validate(self) -> Result<ValidatedProxyRequest, ProxyError> {
        let flow_type = self
            .flow_type
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                ProxyError::InvalidRequest("Missing required field: type".to_string())
            })?;

        let input = match self.input {
            Some(Value::Object(map)) => map,
            Some(Value::Null) | None => {
                return Err(ProxyError::InvalidRequest(
                    "Missing required field: input".to_string(),
                ));
            }
            Some(_) => {
                return Err(ProxyError::InvalidRequest(
                    "Field 'input' must be a JSON object".to_string(),
                ));
            }
        };

        Ok(ValidatedProxyRequest { flow_type, input })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxyResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProxyErrorBody>,
}

impl ProxyResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn from_error(error: &ProxyError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ProxyErrorBody {
                code: error.code().to_string(),
                message: error.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProxyError {
    #[error("Method {0} is not allowed; use POST")]
    MethodNotAllowed(String),

    #[error("Malformed JSON body: {0}")]
    InvalidJson(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Unsupported flow type '{0}'")]
    UnsupportedFlow(String),

    #[error("Missing required input field '{field}' for flow '{flow}'")]
    InvalidInput { flow: String, field: String },

    /// The detail is logged, never returned to the caller.
    #[error("Model invocation failed")]
    Model(String),
}

impl ProxyError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            Self::InvalidJson(_) => "INVALID_JSON",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::UnsupportedFlow(_) => "UNSUPPORTED_FLOW",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::Model(_) => "MODEL_ERROR",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::MethodNotAllowed(_) => 405,
            Self::Model(_) => 500,
            _ => 400,
        }
    }
}
