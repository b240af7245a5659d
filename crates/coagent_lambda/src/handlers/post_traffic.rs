use chrono::{DateTime, Utc};
use coagent_core::checks::{check_metric_threshold, check_smoke_test, MonitoredMetric};
use coagent_core::contract::{HookError, HookKind, HookSummary};
use serde_json::Value;

use crate::adapters::metrics::{MetricSource, MetricWindow};
use crate::adapters::status_reporter::LifecycleStatusReporter;
use crate::handlers::lifecycle::{parse_lifecycle_event, run_lifecycle_hook};

pub fn handle_post_traffic_event(
    payload: Value,
    now: DateTime<Utc>,
    metrics: &dyn MetricSource,
    reporter: &dyn LifecycleStatusReporter,
) -> Result<HookSummary, HookError> {
    let event = parse_lifecycle_event(payload)?;
    let window = MetricWindow::trailing(now);

    run_lifecycle_hook(HookKind::PostTraffic, &event, reporter, || {
        let mut checks = Vec::with_capacity(MonitoredMetric::ALL.len() + 1);
        for metric in MonitoredMetric::ALL {
            let observed = metrics
                .sum_over_window(metric, &window)
                .map_err(|message| HookError::CheckFailed {
                    check: metric.check_name().to_string(),
                    message,
                })?;
            checks.push(check_metric_threshold(metric, observed));
        }
        checks.push(check_smoke_test());
        Ok(checks)
    })
}
