use coagent_core::contract::{
    CheckOutcome, HookError, HookKind, HookSummary, LifecycleHookEvent, LifecycleStatus,
    StatusReport, HOOK_SUMMARY_SCHEMA_VERSION,
};
use serde_json::Value;

use crate::adapters::status_reporter::LifecycleStatusReporter;

pub fn parse_lifecycle_event(payload: Value) -> Result<LifecycleHookEvent, HookError> {
    let event: LifecycleHookEvent = serde_json::from_value(payload)
        .map_err(|error| HookError::InvalidEvent(error.to_string()))?;

    if event.deployment_id.trim().is_empty() {
        return Err(HookError::InvalidEvent("DeploymentId cannot be empty".to_string()));
    }
    if event.lifecycle_event_hook_execution_id.trim().is_empty() {
        return Err(HookError::InvalidEvent(
            "LifecycleEventHookExecutionId cannot be empty".to_string(),
        ));
    }

    Ok(event)
}

/// Runs the checks once and reports the aggregate status to the deployment
/// controller. Errors are reported as `Failed` before being returned.
pub fn run_lifecycle_hook(
    hook: HookKind,
    event: &LifecycleHookEvent,
    reporter: &dyn LifecycleStatusReporter,
    run_checks: impl FnOnce() -> Result<Vec<CheckOutcome>, HookError>,
) -> Result<HookSummary, HookError> {
    tracing::info!(
        component = hook.component(),
        event = "hook_started",
        deployment_id = %event.deployment_id,
        execution_id = %event.lifecycle_event_hook_execution_id,
        current_version = event.current_version.as_deref().unwrap_or(""),
        new_version = event.new_version.as_deref().unwrap_or(""),
    );

    let checks = match run_checks() {
        Ok(value) => value,
        Err(error) => return Err(report_failure(hook, event, reporter, error)),
    };

    for check in &checks {
        tracing::info!(
            component = hook.component(),
            event = "check_completed",
            deployment_id = %event.deployment_id,
            check = %check.name,
            passed = check.passed,
            detail = %check.detail,
        );
    }

    let status = LifecycleStatus::from_checks(&checks);
    if let Err(message) = reporter.report_status(&StatusReport::for_event(event, status)) {
        let error = HookError::ReportFailed { status, message };
        return Err(match status {
            LifecycleStatus::Succeeded => report_failure(hook, event, reporter, error),
            LifecycleStatus::Failed => {
                log_hook_failure(hook, event, &error);
                error
            }
        });
    }

    tracing::info!(
        component = hook.component(),
        event = "status_reported",
        deployment_id = %event.deployment_id,
        status = status.as_str(),
    );

    Ok(HookSummary {
        hook,
        deployment_id: event.deployment_id.clone(),
        status,
        checks,
        schema_version: HOOK_SUMMARY_SCHEMA_VERSION.to_string(),
    })
}

fn report_failure(
    hook: HookKind,
    event: &LifecycleHookEvent,
    reporter: &dyn LifecycleStatusReporter,
    error: HookError,
) -> HookError {
    log_hook_failure(hook, event, &error);

    let report = StatusReport::for_event(event, LifecycleStatus::Failed);
    if let Err(report_error) = reporter.report_status(&report) {
        tracing::error!(
            component = hook.component(),
            event = "failure_report_failed",
            deployment_id = %event.deployment_id,
            error = %report_error,
        );
    }

    error
}

fn log_hook_failure(hook: HookKind, event: &LifecycleHookEvent, error: &HookError) {
    tracing::error!(
        component = hook.component(),
        event = "hook_failed",
        deployment_id = %event.deployment_id,
        error = %error,
    );
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct CapturingReporter {
        reports: Mutex<Vec<StatusReport>>,
        fail_on: Option<LifecycleStatus>,
    }

    impl CapturingReporter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(status: LifecycleStatus) -> Self {
            Self {
                reports: Mutex::new(Vec::new()),
                fail_on: Some(status),
            }
        }

        pub fn statuses(&self) -> Vec<LifecycleStatus> {
            self.reports
                .lock()
                .expect("poisoned mutex")
                .iter()
                .map(|report| report.status)
                .collect()
        }
    }

    impl LifecycleStatusReporter for CapturingReporter {
        fn report_status(&self, report: &StatusReport) -> Result<(), String> {
            self.reports
                .lock()
                .expect("poisoned mutex")
                .push(report.clone());
            if self.fail_on == Some(report.status) {
                return Err("codedeploy unavailable".to_string());
            }
            Ok(())
        }
    }

    pub fn sample_event() -> LifecycleHookEvent {
        LifecycleHookEvent {
            deployment_id: "d-TEST123".to_string(),
            lifecycle_event_hook_execution_id: "exec-42".to_string(),
            current_version: Some("6".to_string()),
            new_version: Some("7".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::test_support::{sample_event, CapturingReporter};
    use super::*;

    #[test]
    fn rejects_event_without_execution_id() {
        let error = parse_lifecycle_event(json!({"DeploymentId": "d-1"}))
            .expect_err("execution id is required");
        assert!(matches!(error, HookError::InvalidEvent(_)));

        let error = parse_lifecycle_event(json!({
            "DeploymentId": "d-1",
            "LifecycleEventHookExecutionId": " "
        }))
        .expect_err("blank execution id should fail");
        assert_eq!(
            error.to_string(),
            "invalid lifecycle event: LifecycleEventHookExecutionId cannot be empty"
        );
    }

    #[test]
    fn check_error_is_reported_failed_and_returned() {
        let reporter = CapturingReporter::new();
        let error = run_lifecycle_hook(HookKind::PostTraffic, &sample_event(), &reporter, || {
            Err(HookError::CheckFailed {
                check: "error_count".to_string(),
                message: "throttled".to_string(),
            })
        })
        .expect_err("check error should propagate");

        assert!(matches!(error, HookError::CheckFailed { .. }));
        assert_eq!(reporter.statuses(), vec![LifecycleStatus::Failed]);
    }

    #[test]
    fn failed_success_report_falls_back_to_failed() {
        let reporter = CapturingReporter::failing_on(LifecycleStatus::Succeeded);
        let error = run_lifecycle_hook(HookKind::PreTraffic, &sample_event(), &reporter, || {
            Ok(vec![CheckOutcome::pass("connectivity", "ok")])
        })
        .expect_err("report failure should propagate");

        assert!(matches!(
            error,
            HookError::ReportFailed {
                status: LifecycleStatus::Succeeded,
                ..
            }
        ));
        assert_eq!(
            reporter.statuses(),
            vec![LifecycleStatus::Succeeded, LifecycleStatus::Failed]
        );
    }

    #[test]
    fn failed_failure_report_is_not_retried() {
        let reporter = CapturingReporter::failing_on(LifecycleStatus::Failed);
        run_lifecycle_hook(HookKind::PreTraffic, &sample_event(), &reporter, || {
            Ok(vec![CheckOutcome::fail("node_env", "NODE_ENV is not set")])
        })
        .expect_err("report failure should propagate");

        assert_eq!(reporter.statuses(), vec![LifecycleStatus::Failed]);
    }
}
