//! SQS event extractor for message queue triggers.
//!
//! The parent context comes from the message attributes of the batch's last
//! record, falling back to an SNS notification embedded in its body when the
//! queue subscribes to a topic without raw message delivery.

use crate::attributes::{record_key_values, resource_name_from_arn};
use crate::extractor::TraceContextExtractor;
use aws_lambda_events::sqs::SqsEvent;
use opentelemetry::KeyValue;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry_aws_messaging::{PropagationContext, extract_sqs_event};
use opentelemetry_semantic_conventions::attribute::{
    MESSAGING_BATCH_MESSAGE_COUNT, MESSAGING_DESTINATION_NAME, MESSAGING_MESSAGE_ID,
    MESSAGING_OPERATION_TYPE, MESSAGING_SYSTEM,
};
use tracing::Span;

/// Extractor for SQS message events.
///
/// # Example
///
/// ```ignore
/// use opentelemetry_lambda_tower::{OtelTracingLayer, SqsEventExtractor};
///
/// let layer = OtelTracingLayer::new(SqsEventExtractor::new());
/// ```
#[derive(Clone, Debug, Default)]
pub struct SqsEventExtractor;

impl SqsEventExtractor {
    /// Creates a new SQS event extractor.
    pub fn new() -> Self {
        Self
    }

    /// Messaging attributes describing the batch.
    pub fn messaging_attributes(&self, event: &SqsEvent) -> Vec<KeyValue> {
        let mut attributes = vec![
            KeyValue::new(MESSAGING_SYSTEM, "aws_sqs"),
            KeyValue::new(MESSAGING_OPERATION_TYPE, "process"),
            KeyValue::new(MESSAGING_BATCH_MESSAGE_COUNT, event.records.len() as i64),
        ];

        if let Some(queue) = event
            .records
            .first()
            .and_then(|record| record.event_source_arn.as_deref())
            .and_then(resource_name_from_arn)
        {
            attributes.push(KeyValue::new(MESSAGING_DESTINATION_NAME, queue.to_string()));
        }

        if let [record] = event.records.as_slice()
            && let Some(message_id) = &record.message_id
        {
            attributes.push(KeyValue::new(MESSAGING_MESSAGE_ID, message_id.clone()));
        }

        attributes
    }
}

impl TraceContextExtractor<SqsEvent> for SqsEventExtractor {
    fn extract_context(
        &self,
        event: &SqsEvent,
        propagator: &dyn TextMapPropagator,
    ) -> PropagationContext {
        extract_sqs_event(event, propagator)
    }

    fn trigger_type(&self) -> &'static str {
        "pubsub"
    }

    fn record_attributes(&self, event: &SqsEvent, span: &Span) {
        record_key_values(span, self.messaging_attributes(event));
    }
}
