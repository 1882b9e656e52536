//! Direct invocation wrappers for handlers that do not go through tower.

use crate::attributes::{InvocationOutput, lambda_context_attributes, record_key_values, span_name};
use crate::cold_start::check_cold_start;
use crate::config::TracingConfig;
use crate::extractor::TraceContextExtractor;
use crate::flush::ProviderFlush;
use crate::future::OtelTracingFuture;
use crate::invocation::InvocationSpan;
use crate::resolver::ParentContextResolver;
use lambda_runtime::{Context as LambdaContext, LambdaEvent};
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry_aws_messaging::PropagationContext;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::fmt::{self, Display};
use std::future::Future;
use std::sync::Arc;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Starts, records and ends invocation spans around handler calls.
///
/// Every handler shape is supported: synchronous or asynchronous, returning
/// a value or `()`. The handler's result is returned unchanged, and the span
/// is closed and the providers flushed before the wrapper returns, whatever
/// the outcome.
///
/// # Example
///
/// ```ignore
/// use opentelemetry_lambda_tower::{InvocationTracer, SqsEventExtractor, TracingConfig};
///
/// let tracer = InvocationTracer::new(SqsEventExtractor::new(), TracingConfig::load()?)
///     .with_tracer_provider(provider);
///
/// lambda_runtime::run(service_fn(|event| {
///     tracer.trace_async(event, |event| async move { handle(event).await })
/// }))
/// .await
/// ```
#[derive(Clone)]
pub struct InvocationTracer<E> {
    extractor: E,
    config: Arc<TracingConfig>,
    tracer_provider: Option<Arc<SdkTracerProvider>>,
    logger_provider: Option<Arc<SdkLoggerProvider>>,
    propagator: Option<Arc<dyn TextMapPropagator + Send + Sync>>,
}

impl<E> InvocationTracer<E> {
    /// Creates a tracer using the global propagator and no providers to
    /// flush.
    pub fn new(extractor: E, config: TracingConfig) -> Self {
        Self {
            extractor,
            config: Arc::new(config),
            tracer_provider: None,
            logger_provider: None,
            propagator: None,
        }
    }

    /// Sets the tracer provider flushed at the end of each invocation.
    pub fn with_tracer_provider(mut self, provider: Arc<SdkTracerProvider>) -> Self {
        self.tracer_provider = Some(provider);
        self
    }

    /// Sets the logger provider flushed at the end of each invocation.
    pub fn with_logger_provider(mut self, provider: Arc<SdkLoggerProvider>) -> Self {
        self.logger_provider = Some(provider);
        self
    }

    /// Uses `propagator` for event extraction instead of the global one.
    pub fn with_propagator<P>(self, propagator: P) -> Self
    where
        P: TextMapPropagator + Send + Sync + 'static,
    {
        self.with_shared_propagator(Arc::new(propagator))
    }

    pub(crate) fn with_shared_propagator(
        mut self,
        propagator: Arc<dyn TextMapPropagator + Send + Sync>,
    ) -> Self {
        self.propagator = Some(propagator);
        self
    }

    /// The configuration this tracer was built with.
    pub fn config(&self) -> &TracingConfig {
        &self.config
    }

    fn provider_flush(&self) -> ProviderFlush {
        ProviderFlush::new(
            self.tracer_provider.clone(),
            self.logger_provider.clone(),
            self.config.flush_on_end,
            self.config.flush_timeout,
        )
    }

    /// Starts the span for one invocation.
    ///
    /// The parent is `parent` when it is non-empty, otherwise it is resolved
    /// from the payload and the cloud trace header.
    pub fn start<T>(
        &self,
        payload: &T,
        lambda_ctx: &LambdaContext,
        parent: Option<PropagationContext>,
    ) -> InvocationSpan
    where
        E: TraceContextExtractor<T>,
    {
        let resolver = ParentContextResolver::new(self.config.disable_xray_context_extraction);
        let resolve = |propagator: &dyn TextMapPropagator| {
            resolver.resolve(parent.clone(), &self.extractor, payload, lambda_ctx, propagator)
        };
        let (parent, _) = match &self.propagator {
            Some(propagator) => resolve(propagator.as_ref()),
            None => opentelemetry::global::get_text_map_propagator(|p| resolve(p)),
        };

        let span = self.open_span(payload, lambda_ctx, parent);
        InvocationSpan::new(span, self.provider_flush())
    }

    fn open_span<T>(
        &self,
        payload: &T,
        lambda_ctx: &LambdaContext,
        parent: PropagationContext,
    ) -> Span
    where
        E: TraceContextExtractor<T>,
    {
        let span = tracing::info_span!(
            target: "otel_lifecycle",
            "lambda.invoke",
            otel.name = %span_name(lambda_ctx),
            otel.kind = "server",
            faas.trigger = %self.extractor.trigger_type(),
            faas.invocation_id = tracing::field::Empty,
            faas.coldstart = check_cold_start(),
        );

        // An empty parent makes the span a trace root instead of a child of
        // whatever tracing span is current, such as the runtime's own.
        let _ = span.set_parent(parent.into_context());
        if !lambda_ctx.request_id.is_empty() {
            span.record("faas.invocation_id", lambda_ctx.request_id.as_str());
        }

        record_key_values(&span, lambda_context_attributes(lambda_ctx));
        self.extractor.record_attributes(payload, &span);
        for (key, value) in &self.config.attributes {
            span.set_attribute(key.clone(), value.clone());
        }

        span
    }

    /// Runs a synchronous handler inside an invocation span.
    pub fn trace<T, R, Err, F>(&self, event: LambdaEvent<T>, handler: F) -> Result<R, Err>
    where
        E: TraceContextExtractor<T>,
        F: FnOnce(LambdaEvent<T>) -> Result<R, Err>,
        R: InvocationOutput,
        Err: Display,
    {
        self.trace_with_parent(event, None, handler)
    }

    /// [`trace`](Self::trace) with a parent resolved by the caller.
    pub fn trace_with_parent<T, R, Err, F>(
        &self,
        event: LambdaEvent<T>,
        parent: Option<PropagationContext>,
        handler: F,
    ) -> Result<R, Err>
    where
        E: TraceContextExtractor<T>,
        F: FnOnce(LambdaEvent<T>) -> Result<R, Err>,
        R: InvocationOutput,
        Err: Display,
    {
        let mut invocation = self.start(&event.payload, &event.context, parent);
        let result = invocation.span().in_scope(|| handler(event));
        invocation.record_result(&result);
        invocation.finish();
        result
    }

    /// Runs an asynchronous handler inside an invocation span.
    ///
    /// The returned future ends the span and flushes when dropped before
    /// completion.
    pub fn trace_async<T, R, Err, F, Fut>(
        &self,
        event: LambdaEvent<T>,
        handler: F,
    ) -> OtelTracingFuture<Fut, R, Err>
    where
        E: TraceContextExtractor<T>,
        F: FnOnce(LambdaEvent<T>) -> Fut,
        Fut: Future<Output = Result<R, Err>>,
        R: InvocationOutput,
        Err: Display,
    {
        self.trace_async_with_parent(event, None, handler)
    }

    /// [`trace_async`](Self::trace_async) with a parent resolved by the
    /// caller.
    pub fn trace_async_with_parent<T, R, Err, F, Fut>(
        &self,
        event: LambdaEvent<T>,
        parent: Option<PropagationContext>,
        handler: F,
    ) -> OtelTracingFuture<Fut, R, Err>
    where
        E: TraceContextExtractor<T>,
        F: FnOnce(LambdaEvent<T>) -> Fut,
        Fut: Future<Output = Result<R, Err>>,
        R: InvocationOutput,
        Err: Display,
    {
        let invocation = self.start(&event.payload, &event.context, parent);
        let future = invocation.span().in_scope(|| handler(event));
        OtelTracingFuture::new(future, invocation)
    }
}

impl<E: fmt::Debug> fmt::Debug for InvocationTracer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationTracer")
            .field("extractor", &self.extractor)
            .field("config", &self.config)
            .field("tracer_provider", &self.tracer_provider.is_some())
            .field("logger_provider", &self.logger_provider.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::FALLBACK_SPAN_NAME;
    use crate::extractors::generic::GenericEventExtractor;
    use crate::invocation::INCOMPLETE_INVOCATION;
    use crate::test_support::{TestTelemetry, attribute, lambda_context};
    use opentelemetry::trace::{SpanId, SpanKind, Status};
    use opentelemetry::Value;
    use opentelemetry_sdk::propagation::TraceContextPropagator;
    use serial_test::serial;

    const XRAY_HEADER: &str =
        "Root=1-5759e988-bd862e3fe1be46a994272793;Parent=53995c3f42cd8ad8;Sampled=1";

    fn tracer(telemetry: &TestTelemetry) -> InvocationTracer<GenericEventExtractor<String>> {
        InvocationTracer::new(
            GenericEventExtractor::new(),
            TracingConfig::builder().attribute("team", "payments").build(),
        )
        .with_tracer_provider(telemetry.provider())
        .with_propagator(TraceContextPropagator::new())
    }

    fn event(lambda_ctx: LambdaContext) -> LambdaEvent<String> {
        LambdaEvent::new("payload".to_string(), lambda_ctx)
    }

    #[derive(Debug)]
    struct HandlerError(&'static str);

    impl Display for HandlerError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    #[test]
    #[serial]
    fn test_sync_success() {
        let telemetry = TestTelemetry::install();
        let tracer = tracer(&telemetry);

        let result: Result<serde_json::Value, HandlerError> = tracer
            .trace(event(lambda_context("my-function")), |event| {
                assert_eq!(event.payload, "payload");
                Ok(serde_json::json!({"statusCode": 202}))
            });

        assert_eq!(result.unwrap()["statusCode"], 202);
        let span = telemetry.single_span();
        assert_eq!(span.name, "my-function");
        assert_eq!(span.span_kind, SpanKind::Server);
        assert_eq!(span.status, Status::Ok);
        assert_eq!(
            attribute(&span, "http.response.status_code"),
            Some(Value::I64(202))
        );
        assert_eq!(attribute(&span, "faas.name"), Some("my-function".into()));
        assert_eq!(attribute(&span, "team"), Some("payments".into()));
        assert_eq!(attribute(&span, "faas.invocation_id"), Some("req-1".into()));
    }

    #[test]
    #[serial]
    fn test_sync_failure_records_exception_and_returns_original_error() {
        let telemetry = TestTelemetry::install();
        let tracer = tracer(&telemetry);

        let result: Result<(), HandlerError> = tracer
            .trace(event(lambda_context("my-function")), |_| Err(HandlerError("boom")));

        assert_eq!(result.unwrap_err().0, "boom");
        let span = telemetry.single_span();
        assert!(matches!(span.status, Status::Error { .. }));

        let exception = span
            .events
            .iter()
            .find(|event| event.name == "exception")
            .expect("exception event");
        assert!(exception.attributes.iter().any(|kv| {
            kv.key.as_str() == "exception.message" && kv.value == Value::from("boom")
        }));
        let exception_type = exception
            .attributes
            .iter()
            .find(|kv| kv.key.as_str() == "exception.type")
            .map(|kv| kv.value.as_str().into_owned())
            .expect("exception.type");
        assert!(exception_type.ends_with("HandlerError"));
    }

    #[test]
    #[serial]
    fn test_unknown_function_uses_fallback_name() {
        let telemetry = TestTelemetry::install();

        tracer(&telemetry)
            .trace(event(LambdaContext::default()), |_| Ok::<(), HandlerError>(()))
            .unwrap();

        assert_eq!(telemetry.single_span().name, FALLBACK_SPAN_NAME);
    }

    #[test]
    #[serial]
    fn test_cloud_trace_header_parent() {
        let telemetry = TestTelemetry::install();
        let mut lambda_ctx = lambda_context("my-function");
        lambda_ctx.xray_trace_id = Some(XRAY_HEADER.to_string());

        tracer(&telemetry)
            .trace(event(lambda_ctx), |_| Ok::<(), HandlerError>(()))
            .unwrap();

        let span = telemetry.single_span();
        assert_eq!(
            span.span_context.trace_id().to_string(),
            "5759e988bd862e3fe1be46a994272793"
        );
        assert_eq!(
            span.parent_span_id,
            SpanId::from_hex("53995c3f42cd8ad8").unwrap()
        );
    }

    #[test]
    #[serial]
    fn test_explicit_parent_wins_over_cloud_trace_header() {
        let telemetry = TestTelemetry::install();
        let mut lambda_ctx = lambda_context("my-function");
        lambda_ctx.xray_trace_id = Some(XRAY_HEADER.to_string());
        let explicit = crate::xray::trace_header_context(
            "Root=1-4bf92f35-77b34da6a3ce929d0e0e4736;Parent=00f067aa0ba902b7;Sampled=1",
        );

        tracer(&telemetry)
            .trace_with_parent(event(lambda_ctx), explicit, |_| Ok::<(), HandlerError>(()))
            .unwrap();

        let span = telemetry.single_span();
        assert_eq!(
            span.span_context.trace_id().to_string(),
            "4bf92f3577b34da6a3ce929d0e0e4736"
        );
    }

    #[test]
    #[serial]
    fn test_no_parent_starts_new_trace() {
        let telemetry = TestTelemetry::install();

        temp_env::with_var_unset(crate::xray::TRACE_HEADER_ENV_VAR, || {
            tracer(&telemetry)
                .trace(event(lambda_context("my-function")), |_| {
                    Ok::<(), HandlerError>(())
                })
                .unwrap();
        });

        assert_eq!(telemetry.single_span().parent_span_id, SpanId::INVALID);
    }

    #[test]
    #[serial]
    fn test_no_parent_ignores_enclosing_span() {
        let telemetry = TestTelemetry::install();

        temp_env::with_var_unset(crate::xray::TRACE_HEADER_ENV_VAR, || {
            tracing::info_span!("Lambda runtime invoke").in_scope(|| {
                tracer(&telemetry)
                    .trace(event(lambda_context("my-function")), |_| {
                        Ok::<(), HandlerError>(())
                    })
                    .unwrap();
            });
        });

        let spans = telemetry.spans();
        let outer = spans
            .iter()
            .find(|span| span.name == "Lambda runtime invoke")
            .unwrap();
        let invocation = spans.iter().find(|span| span.name == "my-function").unwrap();
        assert_eq!(invocation.parent_span_id, SpanId::INVALID);
        assert_ne!(
            invocation.span_context.trace_id(),
            outer.span_context.trace_id()
        );
    }

    #[test]
    #[serial]
    fn test_panicking_handler_still_ends_span() {
        let telemetry = TestTelemetry::install();
        let tracer = tracer(&telemetry);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            tracer.trace(event(lambda_context("my-function")), |_| -> Result<(), HandlerError> {
                panic!("handler panicked")
            })
        }));

        assert!(outcome.is_err());
        let span = telemetry.single_span();
        assert_eq!(span.status, Status::error(INCOMPLETE_INVOCATION));
    }

    #[tokio::test]
    #[serial]
    async fn test_async_success_and_failure() {
        let telemetry = TestTelemetry::install();
        let tracer = tracer(&telemetry);

        let ok = tracer
            .trace_async(event(lambda_context("my-function")), |_| async {
                Ok::<_, HandlerError>(())
            })
            .await;
        let err = tracer
            .trace_async(event(lambda_context("my-function")), |_| async {
                Err::<(), _>(HandlerError("async boom"))
            })
            .await;

        assert!(ok.is_ok());
        assert_eq!(err.unwrap_err().0, "async boom");
        let spans = telemetry.spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].status, Status::Ok);
        assert!(matches!(spans[1].status, Status::Error { .. }));
    }

    #[tokio::test]
    #[serial]
    async fn test_cancelled_future_ends_span() {
        let telemetry = TestTelemetry::install();
        let tracer = tracer(&telemetry);

        let future = tracer.trace_async(event(lambda_context("my-function")), |_| {
            std::future::pending::<Result<(), HandlerError>>()
        });
        drop(future);

        let span = telemetry.single_span();
        assert_eq!(span.status, Status::error(INCOMPLETE_INVOCATION));
    }

    #[test]
    #[serial]
    fn test_child_spans_are_parented_by_invocation() {
        let telemetry = TestTelemetry::install();

        tracer(&telemetry)
            .trace(event(lambda_context("my-function")), |_| {
                tracing::info_span!("child").in_scope(|| Ok::<(), HandlerError>(()))
            })
            .unwrap();

        let spans = telemetry.spans();
        let child = spans.iter().find(|s| s.name == "child").unwrap();
        let parent = spans.iter().find(|s| s.name == "my-function").unwrap();
        assert_eq!(child.parent_span_id, parent.span_context.span_id());
    }
}
