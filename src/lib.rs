//! AWS messaging trace propagation - workspace-level end-to-end tests.
//!
//! This is a virtual package that provides workspace-level integration tests.
//! The actual functionality is provided by the workspace member crates:
//!
//! - `opentelemetry-aws-messaging`: Trace context in SNS/SQS message attributes
//! - `opentelemetry-lambda-tower`: Invocation spans for Lambda handlers
