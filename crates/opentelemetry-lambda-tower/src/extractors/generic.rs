//! Extractor for payloads that carry no trace context.

use crate::extractor::TraceContextExtractor;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry_aws_messaging::PropagationContext;
use std::fmt;
use std::marker::PhantomData;

/// Extractor for arbitrary payloads, such as scheduled events or direct
/// invocations.
///
/// Never yields a parent, so the invocation span is parented by the cloud
/// trace header or becomes a new root.
pub struct GenericEventExtractor<T> {
    trigger: &'static str,
    _payload: PhantomData<fn(&T)>,
}

impl<T> GenericEventExtractor<T> {
    /// Creates an extractor reporting the `other` trigger type.
    pub fn new() -> Self {
        Self::with_trigger("other")
    }

    /// Creates an extractor reporting a specific trigger type, e.g. `timer`.
    pub fn with_trigger(trigger: &'static str) -> Self {
        Self {
            trigger,
            _payload: PhantomData,
        }
    }
}

impl<T> Default for GenericEventExtractor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for GenericEventExtractor<T> {
    fn clone(&self) -> Self {
        Self::with_trigger(self.trigger)
    }
}

impl<T> fmt::Debug for GenericEventExtractor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericEventExtractor")
            .field("trigger", &self.trigger)
            .finish()
    }
}

impl<T: 'static> TraceContextExtractor<T> for GenericEventExtractor<T> {
    fn extract_context(&self, _payload: &T, _propagator: &dyn TextMapPropagator) -> PropagationContext {
        PropagationContext::default()
    }

    fn trigger_type(&self) -> &'static str {
        self.trigger
    }
}
