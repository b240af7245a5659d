use chrono::Utc;
use coagent_core::contract::HookSummary;
use coagent_lambda::adapters::metrics::CloudWatchMetricSource;
use coagent_lambda::adapters::status_reporter::CodeDeployStatusReporter;
use coagent_lambda::config::{process_environment, PostTrafficConfig};
use coagent_lambda::handlers::post_traffic::handle_post_traffic_event;
use coagent_lambda::logging::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct RuntimeDependencies {
    metrics: CloudWatchMetricSource,
    reporter: CodeDeployStatusReporter,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<HookSummary, Error> {
    handle_post_traffic_event(event.payload, Utc::now(), &deps.metrics, &deps.reporter)
        .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = PostTrafficConfig::from_env(&process_environment())?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        metrics: CloudWatchMetricSource::new(
            aws_sdk_cloudwatch::Client::new(&aws_config),
            config.target_function_name,
        ),
        reporter: CodeDeployStatusReporter::new(aws_sdk_codedeploy::Client::new(&aws_config)),
    };
    let deps = &deps;

    lambda_runtime::run(service_fn(move |event| async move {
        handle_request(event, deps).await
    }))
    .await
}
