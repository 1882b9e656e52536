//! SNS event extractor for notification triggers.

use crate::attributes::{record_key_values, resource_name_from_arn};
use crate::extractor::TraceContextExtractor;
use aws_lambda_events::sns::SnsEvent;
use opentelemetry::KeyValue;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry_aws_messaging::{PropagationContext, extract_sns_event};
use opentelemetry_semantic_conventions::attribute::{
    MESSAGING_BATCH_MESSAGE_COUNT, MESSAGING_DESTINATION_NAME, MESSAGING_MESSAGE_ID,
    MESSAGING_OPERATION_TYPE, MESSAGING_SYSTEM,
};
use tracing::Span;

/// Extractor for SNS notification events.
///
/// The parent context is read from the message attributes of the last
/// record; `String.Array` attributes are split on commas.
#[derive(Clone, Debug, Default)]
pub struct SnsEventExtractor;

impl SnsEventExtractor {
    /// Creates a new SNS event extractor.
    pub fn new() -> Self {
        Self
    }

    /// Messaging attributes describing the notification batch.
    pub fn messaging_attributes(&self, event: &SnsEvent) -> Vec<KeyValue> {
        let mut attributes = vec![
            KeyValue::new(MESSAGING_SYSTEM, "aws_sns"),
            KeyValue::new(MESSAGING_OPERATION_TYPE, "process"),
            KeyValue::new(MESSAGING_BATCH_MESSAGE_COUNT, event.records.len() as i64),
        ];

        if let Some(record) = event.records.first() {
            if let Some(topic) = resource_name_from_arn(&record.sns.topic_arn) {
                attributes.push(KeyValue::new(MESSAGING_DESTINATION_NAME, topic.to_string()));
            }
            if event.records.len() == 1 && !record.sns.message_id.is_empty() {
                attributes.push(KeyValue::new(
                    MESSAGING_MESSAGE_ID,
                    record.sns.message_id.clone(),
                ));
            }
        }

        attributes
    }
}

impl TraceContextExtractor<SnsEvent> for SnsEventExtractor {
    fn extract_context(
        &self,
        event: &SnsEvent,
        propagator: &dyn TextMapPropagator,
    ) -> PropagationContext {
        extract_sns_event(event, propagator)
    }

    fn trigger_type(&self) -> &'static str {
        "pubsub"
    }

    fn record_attributes(&self, event: &SnsEvent, span: &Span) {
        record_key_values(span, self.messaging_attributes(event));
    }
}
