use aws_sdk_bedrockruntime::primitives::Blob;
use coagent_core::flows::PromptSpec;
use serde_json::{json, Value};

pub const ANTHROPIC_BEDROCK_VERSION: &str = "bedrock-2023-05-31";

pub trait ModelClient {
    /// Returns the model's text completion for the prompt.
    fn complete(&self, prompt: &PromptSpec) -> Result<String, String>;
}

pub struct BedrockModelClient {
    client: aws_sdk_bedrockruntime::Client,
    model_id: String,
}

impl BedrockModelClient {
    pub fn new(client: aws_sdk_bedrockruntime::Client, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }
}

pub fn anthropic_request_body(prompt: &PromptSpec) -> Value {
    json!({
        "anthropic_version": ANTHROPIC_BEDROCK_VERSION,
        "max_tokens": prompt.max_tokens,
        "temperature": prompt.temperature,
        "system": prompt.system,
        "messages": [
            {
                "role": "user",
                "content": [{ "type": "text", "text": prompt.user }]
            }
        ],
    })
}

pub fn extract_completion_text(body: &[u8]) -> Result<String, String> {
    let response: Value = serde_json::from_slice(body)
        .map_err(|error| format!("model response is not valid JSON: {error}"))?;

    let blocks = response
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| "model response must include a content array".to_string())?;

    let text: String = blocks
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        return Err("model response contained no text".to_string());
    }
    Ok(text)
}

impl ModelClient for BedrockModelClient {
    fn complete(&self, prompt: &PromptSpec) -> Result<String, String> {
        let body = serde_json::to_vec(&anthropic_request_body(prompt))
            .map_err(|error| format!("failed to serialize model request: {error}"))?;
        let client = self.client.clone();
        let model_id = self.model_id.clone();

        let response_body = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .invoke_model()
                    .model_id(model_id)
                    .content_type("application/json")
                    .accept("application/json")
                    .body(Blob::new(body))
                    .send()
                    .await
                    .map(|output| output.body().as_ref().to_vec())
                    .map_err(|error| format!("failed to invoke bedrock model: {error}"))
            })
        })?;

        extract_completion_text(&response_body)
    }
}
