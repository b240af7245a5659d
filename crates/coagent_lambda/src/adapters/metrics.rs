use aws_sdk_cloudwatch::primitives::DateTime as SdkDateTime;
use aws_sdk_cloudwatch::types::{Dimension, Statistic};
use chrono::{DateTime, Duration, Utc};
use coagent_core::checks::{MonitoredMetric, METRIC_WINDOW_SECONDS};

pub const LAMBDA_METRIC_NAMESPACE: &str = "AWS/Lambda";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MetricWindow {
    pub fn trailing(end: DateTime<Utc>) -> Self {
        Self {
            start: end - Duration::seconds(METRIC_WINDOW_SECONDS),
            end,
        }
    }
}

pub trait MetricSource {
    /// Sum of the metric over the window; no datapoints means zero.
    fn sum_over_window(
        &self,
        metric: MonitoredMetric,
        window: &MetricWindow,
    ) -> Result<f64, String>;
}

pub struct CloudWatchMetricSource {
    client: aws_sdk_cloudwatch::Client,
    function_name: String,
}

impl CloudWatchMetricSource {
    pub fn new(client: aws_sdk_cloudwatch::Client, function_name: impl Into<String>) -> Self {
        Self {
            client,
            function_name: function_name.into(),
        }
    }
}

impl MetricSource for CloudWatchMetricSource {
    fn sum_over_window(
        &self,
        metric: MonitoredMetric,
        window: &MetricWindow,
    ) -> Result<f64, String> {
        let client = self.client.clone();
        let dimension = Dimension::builder()
            .name("FunctionName")
            .value(self.function_name.clone())
            .build();
        let start = SdkDateTime::from_secs(window.start.timestamp());
        let end = SdkDateTime::from_secs(window.end.timestamp());

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .get_metric_statistics()
                    .namespace(LAMBDA_METRIC_NAMESPACE)
                    .metric_name(metric.metric_name())
                    .dimensions(dimension)
                    .start_time(start)
                    .end_time(end)
                    .period(METRIC_WINDOW_SECONDS as i32)
                    .statistics(Statistic::Sum)
                    .send()
                    .await
                    .map(|output| {
                        output
                            .datapoints()
                            .iter()
                            .filter_map(|datapoint| datapoint.sum())
                            .sum::<f64>()
                    })
                    .map_err(|error| {
                        format!(
                            "failed to query {} metric from cloudwatch: {error}",
                            metric.metric_name()
                        )
                    })
            })
        })
    }
}
