use coagent_core::contract::HookSummary;
use coagent_lambda::adapters::status_reporter::CodeDeployStatusReporter;
use coagent_lambda::config::process_environment;
use coagent_lambda::handlers::pre_traffic::handle_pre_traffic_event;
use coagent_lambda::logging::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(
    event: LambdaEvent<Value>,
    reporter: &CodeDeployStatusReporter,
) -> Result<HookSummary, Error> {
    handle_pre_traffic_event(event.payload, &process_environment(), reporter).map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let reporter = CodeDeployStatusReporter::new(aws_sdk_codedeploy::Client::new(&aws_config));
    let reporter = &reporter;

    lambda_runtime::run(service_fn(move |event| async move {
        handle_request(event, reporter).await
    }))
    .await
}
