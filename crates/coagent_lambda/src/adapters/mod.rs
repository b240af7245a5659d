pub mod metrics;
pub mod model;
pub mod status_reporter;
