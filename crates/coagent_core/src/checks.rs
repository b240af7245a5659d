use std::collections::BTreeMap;

use crate::contract::CheckOutcome;

pub const REQUIRED_ENVIRONMENT_VARIABLES: [&str; 5] = [
    "AWS_REGION",
    "DYNAMODB_TABLE_NAME",
    "S3_BUCKET_NAME",
    "COGNITO_USER_POOL_ID",
    "COGNITO_CLIENT_ID",
];
pub const NODE_ENV_VARIABLE: &str = "NODE_ENV";
pub const ALLOWED_NODE_ENVS: [&str; 3] = ["development", "staging", "production"];

pub const METRIC_WINDOW_SECONDS: i64 = 300;
pub const MAX_ERROR_COUNT: f64 = 5.0;
pub const MAX_THROTTLE_COUNT: f64 = 3.0;

pub const CHECK_REQUIRED_ENVIRONMENT: &str = "required_environment";
pub const CHECK_CONNECTIVITY: &str = "connectivity";
pub const CHECK_NODE_ENV: &str = "node_env";
pub const CHECK_SMOKE_TEST: &str = "smoke_test";

/// Point-in-time copy of the process environment the checks run against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvironmentSnapshot {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Blank values count as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

pub fn check_required_environment(env: &EnvironmentSnapshot) -> CheckOutcome {
    let missing: Vec<&str> = REQUIRED_ENVIRONMENT_VARIABLES
        .iter()
        .copied()
        .filter(|name| env.get(name).is_none())
        .collect();

    if missing.is_empty() {
        CheckOutcome::pass(
            CHECK_REQUIRED_ENVIRONMENT,
            format!(
                "all {} required variables present",
                REQUIRED_ENVIRONMENT_VARIABLES.len()
            ),
        )
    } else {
        CheckOutcome::fail(
            CHECK_REQUIRED_ENVIRONMENT,
            format!("missing environment variables: {}", missing.join(", ")),
        )
    }
}

// Placeholder until the hook gets network access to the data plane.
pub fn check_connectivity() -> CheckOutcome {
    CheckOutcome::pass(CHECK_CONNECTIVITY, "connectivity placeholder")
}

pub fn check_node_env(env: &EnvironmentSnapshot) -> CheckOutcome {
    match env.get(NODE_ENV_VARIABLE) {
        Some(value) if ALLOWED_NODE_ENVS.contains(&value) => {
            CheckOutcome::pass(CHECK_NODE_ENV, format!("{NODE_ENV_VARIABLE}={value}"))
        }
        Some(value) => CheckOutcome::fail(
            CHECK_NODE_ENV,
            format!(
                "{NODE_ENV_VARIABLE}={value} is not one of {}",
                ALLOWED_NODE_ENVS.join(", ")
            ),
        ),
        None => CheckOutcome::fail(CHECK_NODE_ENV, format!("{NODE_ENV_VARIABLE} is not set")),
    }
}

pub fn pre_traffic_checks(env: &EnvironmentSnapshot) -> Vec<CheckOutcome> {
    vec![
        check_required_environment(env),
        check_connectivity(),
        check_node_env(env),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitoredMetric {
    Errors,
    Throttles,
}

impl MonitoredMetric {
    pub const ALL: [Self; 2] = [Self::Errors, Self::Throttles];

    pub fn metric_name(self) -> &'static str {
        match self {
            Self::Errors => "Errors",
            Self::Throttles => "Throttles",
        }
    }

    pub fn check_name(self) -> &'static str {
        match self {
            Self::Errors => "error_count",
            Self::Throttles => "throttle_count",
        }
    }

    pub fn max_allowed(self) -> f64 {
        match self {
            Self::Errors => MAX_ERROR_COUNT,
            Self::Throttles => MAX_THROTTLE_COUNT,
        }
    }
}

pub fn check_metric_threshold(metric: MonitoredMetric, observed: f64) -> CheckOutcome {
    let detail = format!(
        "{} in last {}s: {observed} (max {})",
        metric.metric_name(),
        METRIC_WINDOW_SECONDS,
        metric.max_allowed()
    );
    // NaN never passes.
    if observed <= metric.max_allowed() {
        CheckOutcome::pass(metric.check_name(), detail)
    } else {
        CheckOutcome::fail(metric.check_name(), detail)
    }
}

// Placeholder until a real invocation of the new version is wired in.
pub fn check_smoke_test() -> CheckOutcome {
    CheckOutcome::pass(CHECK_SMOKE_TEST, "smoke test placeholder")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_env() -> EnvironmentSnapshot {
        EnvironmentSnapshot::from_pairs([
            ("AWS_REGION", "us-east-1"),
            ("DYNAMODB_TABLE_NAME", "coagent-prod"),
            ("S3_BUCKET_NAME", "coagent-assets"),
            ("COGNITO_USER_POOL_ID", "us-east-1_abc"),
            ("COGNITO_CLIENT_ID", "client-123"),
            ("NODE_ENV", "production"),
        ])
    }

    #[test]
    fn complete_environment_passes_every_pre_traffic_check() {
        let checks = pre_traffic_checks(&complete_env());
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|check| check.passed), "{checks:?}");
    }

    #[test]
    fn missing_and_blank_variables_are_reported_by_name() {
        let env = EnvironmentSnapshot::from_pairs([
            ("AWS_REGION", "us-east-1"),
            ("DYNAMODB_TABLE_NAME", "   "),
            ("COGNITO_USER_POOL_ID", "pool"),
            ("COGNITO_CLIENT_ID", "client"),
        ]);

        let outcome = check_required_environment(&env);
        assert!(!outcome.passed);
        assert_eq!(
            outcome.detail,
            "missing environment variables: DYNAMODB_TABLE_NAME, S3_BUCKET_NAME"
        );
    }

    #[test]
    fn node_env_outside_allowed_set_fails() {
        let env = EnvironmentSnapshot::from_pairs([("NODE_ENV", "test")]);
        assert!(!check_node_env(&env).passed);
        assert!(!check_node_env(&EnvironmentSnapshot::default()).passed);
        for allowed in ALLOWED_NODE_ENVS {
            let env = EnvironmentSnapshot::from_pairs([("NODE_ENV", allowed)]);
            assert!(check_node_env(&env).passed, "{allowed} should pass");
        }
    }

    #[test]
    fn metric_thresholds_are_inclusive() {
        assert!(check_metric_threshold(MonitoredMetric::Errors, 5.0).passed);
        assert!(!check_metric_threshold(MonitoredMetric::Errors, 6.0).passed);
        assert!(check_metric_threshold(MonitoredMetric::Throttles, 3.0).passed);
        assert!(!check_metric_threshold(MonitoredMetric::Throttles, 3.5).passed);
        assert!(!check_metric_threshold(MonitoredMetric::Errors, f64::NAN).passed);
    }
}
