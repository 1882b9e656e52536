//! Trait definition for trace context extraction from Lambda events.

use opentelemetry::propagation::TextMapPropagator;
use opentelemetry_aws_messaging::PropagationContext;
use tracing::Span;

/// Extracts a parent trace context from Lambda event payloads.
///
/// Each known event shape gets one implementation: messaging envelopes read
/// their message attributes, API Gateway requests read their headers, and
/// payloads that carry no context return the empty context. Dispatch is by
/// payload type, so an extractor never inspects shapes it does not know.
///
/// # Type Parameters
///
/// * `T` - The Lambda event payload type (e.g., `SqsEvent`, `ApiGatewayV2httpRequest`)
///
/// # Example
///
/// ```ignore
/// use opentelemetry_lambda_tower::TraceContextExtractor;
/// use opentelemetry_aws_messaging::PropagationContext;
///
/// #[derive(Clone)]
/// struct MyExtractor;
///
/// impl TraceContextExtractor<MyEvent> for MyExtractor {
///     fn extract_context(
///         &self,
///         _payload: &MyEvent,
///         _propagator: &dyn opentelemetry::propagation::TextMapPropagator,
///     ) -> PropagationContext {
///         PropagationContext::default()
///     }
///
///     fn trigger_type(&self) -> &'static str {
///         "other"
///     }
/// }
/// ```
pub trait TraceContextExtractor<T>: Clone + Send + Sync + 'static {
    /// Extracts the parent context carried by the payload.
    ///
    /// Returns the empty context when the payload carries none. Extraction
    /// must start from an empty context, never from the ambient one.
    fn extract_context(&self, payload: &T, propagator: &dyn TextMapPropagator)
    -> PropagationContext;

    /// Returns the FaaS trigger type for semantic conventions.
    ///
    /// One of `"http"`, `"pubsub"`, `"datasource"`, `"timer"` or `"other"`.
    fn trigger_type(&self) -> &'static str;

    /// Records event-specific attributes on the invocation span.
    ///
    /// Called once, after the parent has been attached. Unknown or missing
    /// fields are simply not recorded.
    fn record_attributes(&self, _payload: &T, _span: &Span) {}
}
