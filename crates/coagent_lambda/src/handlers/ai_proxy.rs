use std::time::Instant;

use coagent_core::contract::{ProxyError, ProxyRequest, ProxyResponse};
use coagent_core::flows::FlowKind;
use coagent_core::json_repair::parse_model_output;
use serde_json::Value;

use crate::adapters::model::ModelClient;
use crate::config::AiProxyConfig;
use crate::handlers::http::{
    extract_json_body, is_preflight, json_response, preflight_response, request_method,
    ApiGatewayResponse,
};

const COMPONENT: &str = "ai_proxy";

pub fn handle_ai_proxy_event(
    event: Value,
    config: &AiProxyConfig,
    model: &dyn ModelClient,
) -> ApiGatewayResponse {
    let origin = config.cors_allow_origin.as_str();
    if is_preflight(&event) {
        return preflight_response(origin);
    }

    // Direct invocations carry no method and run as POST.
    let outcome = match request_method(&event).map(str::to_ascii_uppercase) {
        Some(method) if method != "POST" => Err(ProxyError::MethodNotAllowed(method)),
        _ => run_flow(event, model),
    };

    match outcome {
        Ok(data) => json_response(200, origin, &ProxyResponse::ok(data)),
        Err(error) => {
            match &error {
                ProxyError::Model(detail) => tracing::error!(
                    component = COMPONENT,
                    event = "model_failed",
                    error = %detail,
                ),
                other => tracing::warn!(
                    component = COMPONENT,
                    event = "request_rejected",
                    code = other.code(),
                    error = %other,
                ),
            }
            json_response(
                error.status_code(),
                origin,
                &ProxyResponse::from_error(&error),
            )
        }
    }
}

fn run_flow(event: Value, model: &dyn ModelClient) -> Result<Value, ProxyError> {
    let body = extract_json_body(event).map_err(ProxyError::InvalidJson)?;
    let request: ProxyRequest = serde_json::from_value(body)
        .map_err(|error| ProxyError::InvalidRequest(format!("Malformed request: {error}")))?;
    let request = request.validate()?;

    let flow = FlowKind::parse(&request.flow_type)
        .ok_or_else(|| ProxyError::UnsupportedFlow(request.flow_type.clone()))?;
    let prompt = flow.build_prompt(&request.input)?;

    tracing::info!(
        component = COMPONENT,
        event = "proxy_request",
        flow = flow.as_str(),
        max_tokens = prompt.max_tokens,
    );

    let started_at = Instant::now();
    let raw = model.complete(&prompt).map_err(ProxyError::Model)?;
    tracing::info!(
        component = COMPONENT,
        event = "model_invoked",
        flow = flow.as_str(),
        duration_ms = started_at.elapsed().as_millis() as u64,
        output_chars = raw.chars().count(),
    );

    let parsed = parse_model_output(&raw);
    if !parsed.is_structured() {
        tracing::warn!(
            component = COMPONENT,
            event = "model_output_unparsed",
            flow = flow.as_str(),
        );
    }
    Ok(parsed.into_data())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use coagent_core::flows::PromptSpec;
    use serde_json::json;

    use super::*;

    struct ScriptedModel {
        reply: Result<String, String>,
        prompts: Mutex<Vec<PromptSpec>>,
    }

    impl ScriptedModel {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().expect("poisoned mutex").len()
        }
    }

    impl ModelClient for ScriptedModel {
        fn complete(&self, prompt: &PromptSpec) -> Result<String, String> {
            self.prompts
                .lock()
                .expect("poisoned mutex")
                .push(prompt.clone());
            self.reply.clone()
        }
    }

    fn post(body: Value) -> Value {
        json!({"httpMethod": "POST", "body": body.to_string()})
    }

    fn body_of(response: &ApiGatewayResponse) -> Value {
        serde_json::from_str(&response.body).expect("response body is json")
    }

    #[test]
    fn preflight_skips_the_model() {
        let model = ScriptedModel::replying("{}");
        let response = handle_ai_proxy_event(
            json!({"requestContext": {"http": {"method": "OPTIONS"}}}),
            &AiProxyConfig::default(),
            &model,
        );

        assert_eq!(response.status_code, 200);
        assert_eq!(model.calls(), 0);
    }

    #[test]
    fn missing_input_is_a_bad_request() {
        let model = ScriptedModel::replying("{}");
        let response = handle_ai_proxy_event(
            post(json!({"type": "blog-post"})),
            &AiProxyConfig::default(),
            &model,
        );

        assert_eq!(response.status_code, 400);
        assert_eq!(body_of(&response)["error"]["code"], "INVALID_REQUEST");
        assert_eq!(model.calls(), 0);
    }

    #[test]
    fn non_post_methods_are_refused() {
        let model = ScriptedModel::replying("{}");
        let body = json!({"type": "blog-post", "input": {"topic": "x"}}).to_string();
        let response = handle_ai_proxy_event(
            json!({"httpMethod": "DELETE", "body": body}),
            &AiProxyConfig::default(),
            &model,
        );

        assert_eq!(response.status_code, 405);
        assert_eq!(body_of(&response)["error"]["code"], "METHOD_NOT_ALLOWED");
        assert_eq!(response.headers["Access-Control-Allow-Methods"], "POST, OPTIONS");
        assert_eq!(model.calls(), 0);
    }

    #[test]
    fn malformed_body_is_a_bad_request() {
        let response = handle_ai_proxy_event(
            json!({"httpMethod": "POST", "body": "{not json"}),
            &AiProxyConfig::default(),
            &ScriptedModel::replying("{}"),
        );

        assert_eq!(response.status_code, 400);
        assert_eq!(body_of(&response)["error"]["code"], "INVALID_JSON");
    }

    #[test]
    fn unknown_flow_is_rejected() {
        let response = handle_ai_proxy_event(
            post(json!({"type": "agent-memory", "input": {"topic": "x"}})),
            &AiProxyConfig::default(),
            &ScriptedModel::replying("{}"),
        );

        assert_eq!(response.status_code, 400);
        assert_eq!(body_of(&response)["error"]["code"], "UNSUPPORTED_FLOW");
    }

    #[test]
    fn model_failure_hides_upstream_detail() {
        let response = handle_ai_proxy_event(
            post(json!({"type": "market-update", "input": {"location": "Austin, TX"}})),
            &AiProxyConfig::default(),
            &ScriptedModel::failing("ThrottlingException: rate exceeded"),
        );

        assert_eq!(response.status_code, 500);
        let body = body_of(&response);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["message"], "Model invocation failed");
    }

    #[test]
    fn configured_origin_is_echoed() {
        let config = AiProxyConfig {
            cors_allow_origin: "https://app.example.com".to_string(),
            ..AiProxyConfig::default()
        };
        let response = handle_ai_proxy_event(
            post(json!({"type": "blog-post", "input": {"topic": "staging tips"}})),
            &config,
            &ScriptedModel::replying("{\"title\": \"Staging\"}"),
        );

        assert_eq!(
            response.headers["Access-Control-Allow-Origin"],
            "https://app.example.com"
        );
    }
}
