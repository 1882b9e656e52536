//! Event-specific trace context extractors.
//!
//! Each extractor is feature-gated:
//!
//! - `http` - API Gateway HTTP API (v2) and REST API (v1)
//! - `sqs` - SQS message events, including SNS notifications delivered
//!   through SQS without raw message delivery
//! - `sns` - SNS notification events
//!
//! [`generic::GenericEventExtractor`] is always available for payloads that
//! carry no trace context.

pub mod generic;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "sqs")]
pub mod sqs;

#[cfg(feature = "sns")]
pub mod sns;
