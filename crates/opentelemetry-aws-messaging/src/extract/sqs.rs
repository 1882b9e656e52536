//! Trace context extraction from SQS events.

use super::raw_delivery::try_unwrap;
use super::{AttributeGetter, extract_with, get_ignore_case};
use crate::codec::decode_sqs;
use crate::context::PropagationContext;
use aws_lambda_events::sqs::{SqsEvent, SqsMessage, SqsMessageAttribute};
use opentelemetry::propagation::TextMapPropagator;
use std::collections::HashMap;

/// Native SQS message attributes viewed through [`AttributeGetter`].
#[derive(Debug, Clone, Copy)]
pub struct SqsAttributes<'a>(pub &'a HashMap<String, SqsMessageAttribute>);

impl AttributeGetter for SqsAttributes<'_> {
    fn lookup(&self, name: &str) -> Option<Vec<&str>> {
        let attribute = get_ignore_case(self.0, name)?;
        let values = decode_sqs(attribute.string_value.as_deref(), &attribute.string_list_values);
        (!values.is_empty()).then_some(values)
    }

    fn names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }
}

/// Extracts the trace context carried by a single SQS message.
///
/// Native message attributes are tried first. When they carry nothing, the
/// body is checked for an SNS notification delivered without raw message
/// delivery and its embedded attributes are used instead.
pub fn extract_sqs_message(
    message: &SqsMessage,
    propagator: &dyn TextMapPropagator,
) -> PropagationContext {
    let native = extract_with(&SqsAttributes(&message.message_attributes), propagator);
    if !native.is_empty() {
        return native;
    }

    message
        .body
        .as_deref()
        .and_then(try_unwrap)
        .map(|notification| extract_with(&notification, propagator))
        .unwrap_or_default()
}

/// Extracts the trace context of an SQS batch from its last record.
///
/// An empty batch yields the empty context.
pub fn extract_sqs_event(event: &SqsEvent, propagator: &dyn TextMapPropagator) -> PropagationContext {
    event
        .records
        .last()
        .map(|message| extract_sqs_message(message, propagator))
        .unwrap_or_default()
}

/// [`extract_sqs_event`] using the globally registered propagator.
pub fn extract_sqs_event_global(event: &SqsEvent) -> PropagationContext {
    opentelemetry::global::get_text_map_propagator(|propagator| {
        extract_sqs_event(event, propagator)
    })
}
