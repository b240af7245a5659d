//! AWS-oriented adapters and handlers for the deployment hooks and the AI proxy.
//!
//! Handlers are synchronous and depend only on the adapter traits, so they can
//! be driven from tests with in-memory fakes. The AWS SDK implementations of
//! those traits bridge into the async clients from inside the Lambda runtime.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
