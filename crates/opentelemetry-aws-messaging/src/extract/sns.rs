//! Trace context extraction from SNS events.

use super::{AttributeGetter, extract_with, get_ignore_case};
use crate::codec::decode_sns;
use crate::context::PropagationContext;
use aws_lambda_events::sns::{MessageAttribute, SnsEvent, SnsRecord};
use opentelemetry::propagation::TextMapPropagator;
use std::collections::HashMap;

/// SNS message attributes viewed through [`AttributeGetter`].
#[derive(Debug, Clone, Copy)]
pub struct SnsAttributes<'a>(pub &'a HashMap<String, MessageAttribute>);

impl AttributeGetter for SnsAttributes<'_> {
    fn lookup(&self, name: &str) -> Option<Vec<&str>> {
        let attribute = get_ignore_case(self.0, name)?;
        decode_sns(&attribute.data_type, Some(&attribute.value))
    }

    fn names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }
}

/// Extracts the trace context carried by a single SNS record.
pub fn extract_sns_record(
    record: &SnsRecord,
    propagator: &dyn TextMapPropagator,
) -> PropagationContext {
    extract_with(&SnsAttributes(&record.sns.message_attributes), propagator)
}

/// Extracts the trace context of an SNS event from its last record.
pub fn extract_sns_event(event: &SnsEvent, propagator: &dyn TextMapPropagator) -> PropagationContext {
    event
        .records
        .last()
        .map(|record| extract_sns_record(record, propagator))
        .unwrap_or_default()
}

/// [`extract_sns_event`] using the globally registered propagator.
pub fn extract_sns_event_global(event: &SnsEvent) -> PropagationContext {
    opentelemetry::global::get_text_map_propagator(|propagator| {
        extract_sns_event(event, propagator)
    })
}
