use aws_sdk_codedeploy::types::LifecycleEventStatus;
use coagent_core::contract::{LifecycleStatus, StatusReport};

pub trait LifecycleStatusReporter {
    fn report_status(&self, report: &StatusReport) -> Result<(), String>;
}

pub struct CodeDeployStatusReporter {
    client: aws_sdk_codedeploy::Client,
}

impl CodeDeployStatusReporter {
    pub fn new(client: aws_sdk_codedeploy::Client) -> Self {
        Self { client }
    }
}

fn to_sdk_status(status: LifecycleStatus) -> LifecycleEventStatus {
    match status {
        LifecycleStatus::Succeeded => LifecycleEventStatus::Succeeded,
        LifecycleStatus::Failed => LifecycleEventStatus::Failed,
    }
}

impl LifecycleStatusReporter for CodeDeployStatusReporter {
    fn report_status(&self, report: &StatusReport) -> Result<(), String> {
        let client = self.client.clone();
        let deployment_id = report.deployment_id.clone();
        let execution_id = report.lifecycle_event_hook_execution_id.clone();
        let status = to_sdk_status(report.status);

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_lifecycle_event_hook_execution_status()
                    .deployment_id(deployment_id)
                    .lifecycle_event_hook_execution_id(execution_id)
                    .status(status)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to put lifecycle hook status: {error}"))
            })
        })
    }
}
