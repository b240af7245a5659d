//! Shared deployment-hook and AI-proxy domain primitives.
//!
//! This crate owns the lifecycle hook contract, the validation checks with
//! their fixed thresholds, the AI flow catalog and model-output parsing. It
//! intentionally excludes AWS SDK and Lambda runtime concerns, which live in
//! `coagent_lambda`.

pub mod checks;
pub mod contract;
pub mod flows;
pub mod json_repair;
