//! Carrier-independent trace identity extracted from or injected into messages.

use opentelemetry::Context;
use opentelemetry::baggage::BaggageExt;
use opentelemetry::trace::{SpanContext, TraceContextExt};

/// An immutable bundle of trace identifiers, trace flags, trace state and
/// baggage.
///
/// The default value is the empty context, meaning "no parent": a span
/// started from it becomes a new trace root.
#[derive(Clone, Debug, Default)]
pub struct PropagationContext(Context);

impl PropagationContext {
    /// Wraps an OpenTelemetry context, typically the output of a propagator.
    pub fn new(cx: Context) -> Self {
        Self(cx)
    }

    /// Builds a context carrying only a remote span context.
    pub fn from_span_context(span_context: SpanContext) -> Self {
        Self(Context::new().with_remote_span_context(span_context))
    }

    /// Returns `true` when neither a valid span context nor any baggage is
    /// present.
    pub fn is_empty(&self) -> bool {
        !self.0.span().span_context().is_valid() && self.0.baggage().len() == 0
    }

    /// The span context carried by this propagation context.
    pub fn span_context(&self) -> SpanContext {
        self.0.span().span_context().clone()
    }

    /// Borrows the underlying OpenTelemetry context.
    pub fn as_context(&self) -> &Context {
        &self.0
    }

    /// Consumes the wrapper, returning the underlying OpenTelemetry context.
    pub fn into_context(self) -> Context {
        self.0
    }

    /// Returns `Some(self)` when the context is not empty.
    ///
    /// Lets fallback chains be written with `Option` combinators.
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

impl From<Context> for PropagationContext {
    fn from(cx: Context) -> Self {
        Self::new(cx)
    }
}

impl From<PropagationContext> for Context {
    fn from(cx: PropagationContext) -> Self {
        cx.into_context()
    }
}
