use coagent_lambda::adapters::model::BedrockModelClient;
use coagent_lambda::config::{process_environment, AiProxyConfig};
use coagent_lambda::handlers::ai_proxy::handle_ai_proxy_event;
use coagent_lambda::handlers::http::ApiGatewayResponse;
use coagent_lambda::logging::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct RuntimeDependencies {
    config: AiProxyConfig,
    model: BedrockModelClient,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<ApiGatewayResponse, Error> {
    Ok(handle_ai_proxy_event(event.payload, &deps.config, &deps.model))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = AiProxyConfig::from_env(&process_environment());
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let model = BedrockModelClient::new(
        aws_sdk_bedrockruntime::Client::new(&aws_config),
        config.model_id.clone(),
    );
    let deps = RuntimeDependencies { config, model };
    let deps = &deps;

    lambda_runtime::run(service_fn(move |event| async move {
        handle_request(event, deps).await
    }))
    .await
}
