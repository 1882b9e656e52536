//! SNS notifications delivered to SQS with raw message delivery disabled.
//!
//! When an SQS queue subscribes to an SNS topic without raw delivery, the
//! whole SNS notification (including its message attributes) is serialised
//! as JSON into the SQS message body, and the SQS message itself carries no
//! trace attributes.
//!
//! See <https://docs.aws.amazon.com/sns/latest/dg/sns-large-payload-raw-message-delivery.html>.

use super::{AttributeGetter, get_ignore_case};
use crate::codec::decode_sns;
use crate::error::UnwrapError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MESSAGE_ATTRIBUTES_FIELD: &str = "\"MessageAttributes\"";

/// The subset of an SNS notification envelope needed for propagation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedNotification {
    /// Notification type, usually `"Notification"`.
    #[serde(rename = "Type", default)]
    pub notification_type: Option<String>,
    /// SNS message id.
    #[serde(rename = "MessageId", default)]
    pub message_id: Option<String>,
    /// ARN of the publishing topic.
    #[serde(rename = "TopicArn", default)]
    pub topic_arn: Option<String>,
    /// Message attributes keyed by name.
    #[serde(rename = "MessageAttributes", default)]
    pub message_attributes: Option<HashMap<String, EmbeddedAttribute>>,
}

/// An SNS message attribute as serialised in a notification envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedAttribute {
    /// Declared data type, e.g. `String` or `String.Array`. An attribute
    /// without one is kept but never decoded.
    #[serde(rename = "Type", default)]
    pub data_type: Option<String>,
    /// Attribute value; may be null in the envelope.
    #[serde(rename = "Value", default)]
    pub value: Option<String>,
}

impl EmbeddedNotification {
    /// Parses an SQS body as an SNS notification envelope.
    ///
    /// # Errors
    ///
    /// Returns [`UnwrapError::NotAnEnvelope`] when the body fails the cheap
    /// shape check, and [`UnwrapError::Json`] when deserialisation fails.
    pub fn from_body(body: &str) -> Result<Self, UnwrapError> {
        if !looks_like_envelope(body) {
            return Err(UnwrapError::NotAnEnvelope);
        }
        Ok(serde_json::from_str(body)?)
    }
}

impl AttributeGetter for EmbeddedNotification {
    fn lookup(&self, name: &str) -> Option<Vec<&str>> {
        let attribute = get_ignore_case(self.message_attributes.as_ref()?, name)?;
        decode_sns(
            attribute.data_type.as_deref().unwrap_or_default(),
            attribute.value.as_deref(),
        )
    }

    fn names(&self) -> Vec<&str> {
        self.message_attributes
            .iter()
            .flat_map(|attributes| attributes.keys())
            .map(String::as_str)
            .collect()
    }
}

/// Cheap pre-filter run before any JSON parsing.
fn looks_like_envelope(body: &str) -> bool {
    body.trim_start().starts_with('{') && body.contains(MESSAGE_ATTRIBUTES_FIELD)
}

/// Returns the embedded SNS notification of an SQS body, if there is one.
///
/// Ordinary bodies and malformed envelopes both yield `None`; the latter is
/// logged at debug level.
pub fn try_unwrap(body: &str) -> Option<EmbeddedNotification> {
    match EmbeddedNotification::from_body(body) {
        Ok(notification) => Some(notification),
        Err(UnwrapError::NotAnEnvelope) => None,
        Err(e) => {
            tracing::debug!(
                target: "otel_messaging",
                error = %e,
                "Ignoring SQS body that looked like an SNS notification"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENVELOPE: &str = r#"{
      "Type": "Notification",
      "MessageId": "95df01b4-ee98-5cb9-9903-4c221d41eb5e",
      "TopicArn": "arn:aws:sns:us-east-1:123456789012:my-topic",
      "Message": "Hello from SNS!",
      "Timestamp": "2024-01-01T00:00:00.000Z",
      "MessageAttributes": {
        "traceparent": {"Type": "String", "Value": "00-5759e988bd862e3fe1be46a994272793-53995c3f42cd8ad8-01"},
        "tags": {"Type": "String.Array", "Value": "a,b,c"},
        "count": {"Type": "Number", "Value": "3"},
        "empty": {"Type": "String", "Value": null}
      }
    }"#;

    #[test]
    fn test_unwrap_envelope() {
        let notification = try_unwrap(ENVELOPE).unwrap();

        assert_eq!(notification.notification_type.as_deref(), Some("Notification"));
        assert_eq!(
            notification.topic_arn.as_deref(),
            Some("arn:aws:sns:us-east-1:123456789012:my-topic")
        );
        assert_eq!(
            notification.lookup("TraceParent"),
            Some(vec!["00-5759e988bd862e3fe1be46a994272793-53995c3f42cd8ad8-01"])
        );
    }

    #[test]
    fn test_decodes_by_declared_type() {
        let notification = try_unwrap(ENVELOPE).unwrap();

        assert_eq!(notification.lookup("tags"), Some(vec!["a", "b", "c"]));
        assert_eq!(notification.lookup("count"), None);
        assert_eq!(notification.lookup("empty"), None);
        assert_eq!(notification.lookup("missing"), None);
    }

    #[test]
    fn test_plain_body_is_not_parsed() {
        assert!(try_unwrap("Hello from SQS!").is_none());
        assert!(try_unwrap(r#"{"orderId": 12345}"#).is_none());
        assert!(matches!(
            EmbeddedNotification::from_body("[1, 2, 3]"),
            Err(UnwrapError::NotAnEnvelope)
        ));
    }

    #[test]
    fn test_leading_whitespace_is_allowed() {
        let body = format!("\n   {}", ENVELOPE.trim());
        assert!(try_unwrap(&body).is_some());
    }

    #[test]
    fn test_malformed_envelope_is_swallowed() {
        let body = r#"{"MessageAttributes": {"traceparent": "#;
        assert!(try_unwrap(body).is_none());
        assert!(matches!(
            EmbeddedNotification::from_body(body),
            Err(UnwrapError::Json(_))
        ));
    }

    #[test]
    fn test_shape_mismatch_is_swallowed() {
        assert!(try_unwrap(r#"{"MessageAttributes": "not a map"}"#).is_none());
    }

    #[test]
    fn test_attribute_without_type_is_skipped() {
        let body = r#"{
          "Type": "Notification",
          "MessageAttributes": {
            "traceparent": {"Type": "String", "Value": "00-5759e988bd862e3fe1be46a994272793-53995c3f42cd8ad8-01"},
            "untyped": {"Value": "x"}
          }
        }"#;

        let notification = try_unwrap(body).unwrap();

        assert_eq!(notification.lookup("untyped"), None);
        assert_eq!(
            notification.lookup("traceparent"),
            Some(vec!["00-5759e988bd862e3fe1be46a994272793-53995c3f42cd8ad8-01"])
        );
    }

    #[test]
    fn test_null_attributes() {
        let notification = try_unwrap(r#"{"MessageAttributes": null}"#).unwrap();

        assert!(notification.names().is_empty());
        assert_eq!(notification.lookup("traceparent"), None);
    }
}
