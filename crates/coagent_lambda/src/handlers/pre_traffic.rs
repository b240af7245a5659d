use coagent_core::checks::{pre_traffic_checks, EnvironmentSnapshot};
use coagent_core::contract::{HookError, HookKind, HookSummary};
use serde_json::Value;

use crate::adapters::status_reporter::LifecycleStatusReporter;
use crate::handlers::lifecycle::{parse_lifecycle_event, run_lifecycle_hook};

pub fn handle_pre_traffic_event(
    payload: Value,
    env: &EnvironmentSnapshot,
    reporter: &dyn LifecycleStatusReporter,
) -> Result<HookSummary, HookError> {
    let event = parse_lifecycle_event(payload)?;
    run_lifecycle_hook(HookKind::PreTraffic, &event, reporter, || {
        Ok(pre_traffic_checks(env))
    })
}
