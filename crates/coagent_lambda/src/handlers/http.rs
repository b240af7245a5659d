use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const CORS_ALLOW_METHODS: &str = "POST, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";

const NOT_AN_OBJECT: &str = "Request body must be a JSON object";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

/// Method from either the REST (`httpMethod`) or HTTP API
/// (`requestContext.http.method`) event shape.
pub fn request_method(event: &Value) -> Option<&str> {
    event
        .get("httpMethod")
        .and_then(Value::as_str)
        .or_else(|| {
            event
                .pointer("/requestContext/http/method")
                .and_then(Value::as_str)
        })
}

pub fn is_preflight(event: &Value) -> bool {
    request_method(event)
        .map(|method| method.eq_ignore_ascii_case("OPTIONS"))
        .unwrap_or(false)
}

/// Unwraps the JSON object body of a proxy event, decoding base64 bodies
/// first. Direct invocations without a `body` field are treated as the body
/// itself.
pub fn extract_json_body(event: Value) -> Result<Value, String> {
    let Some(object) = event.as_object() else {
        return Err("Request payload must be a JSON object".to_string());
    };

    let base64_encoded = object
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let Some(body) = object.get("body") else {
        return Ok(event);
    };

    match body {
        Value::Null => Ok(json!({})),
        Value::Object(_) => Ok(body.clone()),
        Value::String(text) if base64_encoded => parse_object_body(&decode_base64_body(text)?),
        Value::String(text) => parse_object_body(text),
        _ => Err(NOT_AN_OBJECT.to_string()),
    }
}

fn decode_base64_body(text: &str) -> Result<String, String> {
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|error| format!("Invalid base64 body: {error}"))?;
    String::from_utf8(bytes).map_err(|error| format!("Body is not valid UTF-8: {error}"))
}

fn parse_object_body(text: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(text).map_err(|error| error.to_string())? {
        body @ Value::Object(_) => Ok(body),
        _ => Err(NOT_AN_OBJECT.to_string()),
    }
}

pub fn cors_headers(allow_origin: &str) -> Value {
    json!({
        "Content-Type": "application/json",
        "Access-Control-Allow-Origin": allow_origin,
        "Access-Control-Allow-Methods": CORS_ALLOW_METHODS,
        "Access-Control-Allow-Headers": CORS_ALLOW_HEADERS,
    })
}

pub fn preflight_response(allow_origin: &str) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code: 200,
        headers: cors_headers(allow_origin),
        body: String::new(),
    }
}

pub fn json_response(
    status_code: u16,
    allow_origin: &str,
    payload: &impl Serialize,
) -> ApiGatewayResponse {
    match serde_json::to_string(payload) {
        Ok(body) => ApiGatewayResponse {
            status_code,
            headers: cors_headers(allow_origin),
            body,
        },
        Err(error) => ApiGatewayResponse {
            status_code: 500,
            headers: cors_headers(allow_origin),
            body: json!({
                "success": false,
                "error": {
                    "code": "SERIALIZATION_ERROR",
                    "message": error.to_string(),
                },
            })
            .to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_method_from_both_event_shapes() {
        assert_eq!(request_method(&json!({"httpMethod": "POST"})), Some("POST"));
        assert_eq!(
            request_method(&json!({"requestContext": {"http": {"method": "OPTIONS"}}})),
            Some("OPTIONS")
        );
        assert!(is_preflight(&json!({"httpMethod": "options"})));
        assert!(!is_preflight(&json!({"type": "blog-post"})));
    }

    #[test]
    fn string_body_is_parsed() {
        let body = extract_json_body(json!({"body": "{\"type\":\"blog-post\"}"}))
            .expect("body should parse");
        assert_eq!(body, json!({"type": "blog-post"}));
    }

    #[test]
    fn direct_invocation_payload_is_passed_through() {
        let payload = json!({"type": "blog-post", "input": {"topic": "rates"}});
        assert_eq!(
            extract_json_body(payload.clone()).expect("payload should pass"),
            payload
        );
    }

    #[test]
    fn base64_body_is_decoded_before_parsing() {
        let body = extract_json_body(json!({
            "body": "eyJ0eXBlIjoiYmxvZy1wb3N0IiwiaW5wdXQiOnsidG9waWMiOiJyYXRlcyJ9fQ==",
            "isBase64Encoded": true
        }))
        .expect("encoded body should parse");
        assert_eq!(body, json!({"type": "blog-post", "input": {"topic": "rates"}}));

        let error = extract_json_body(json!({"body": "not base64!", "isBase64Encoded": true}))
            .expect_err("garbage should fail");
        assert!(error.contains("base64"));
    }

    #[test]
    fn non_object_string_bodies_are_rejected() {
        for text in ["[\"blog-post\", {\"topic\": \"x\"}]", "\"blog-post\"", "42", "null"] {
            let error = extract_json_body(json!({"body": text}))
                .expect_err("only objects are accepted");
            assert_eq!(error, "Request body must be a JSON object", "body: {text}");
        }
    }

    #[test]
    fn preflight_carries_fixed_cors_headers() {
        let response = preflight_response("*");
        assert_eq!(response.status_code, 200);
        assert!(response.body.is_empty());
        assert_eq!(response.headers["Access-Control-Allow-Methods"], "POST, OPTIONS");
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
    }
}
