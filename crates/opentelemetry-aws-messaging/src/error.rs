//! Error types for message attribute handling.

use thiserror::Error;

/// Errors raised while unwrapping an SNS notification from an SQS body.
///
/// Extraction treats every variant as "no embedded context"; the type is
/// public for callers that parse envelopes directly.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum UnwrapError {
    /// The body is not shaped like an SNS notification.
    #[error("message body is not an SNS notification envelope")]
    NotAnEnvelope,

    /// The body looked like an envelope but failed to deserialise.
    #[error("malformed SNS notification envelope")]
    Json(#[from] serde_json::Error),
}
