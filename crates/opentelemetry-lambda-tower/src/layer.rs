//! Tower Layer implementation for OpenTelemetry tracing.

use crate::config::TracingConfig;
use crate::service::OtelTracingService;
use crate::tracer::InvocationTracer;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::sync::Arc;
use std::time::Duration;
use tower::Layer;

/// Tower layer that adds invocation spans to Lambda handlers.
///
/// # Example
///
/// ```ignore
/// use opentelemetry_lambda_tower::{OtelTracingLayer, SqsEventExtractor};
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(OtelTracingLayer::new(SqsEventExtractor::new()))
///     .service(my_handler);
/// ```
#[derive(Clone, Debug)]
pub struct OtelTracingLayer<E> {
    tracer: InvocationTracer<E>,
}

impl<E> OtelTracingLayer<E> {
    /// Creates a layer with the default [`TracingConfig`], the global
    /// propagator and no providers to flush.
    pub fn new(extractor: E) -> Self {
        Self {
            tracer: InvocationTracer::new(extractor, TracingConfig::default()),
        }
    }

    /// Creates a builder for more detailed configuration.
    pub fn builder(extractor: E) -> OtelTracingLayerBuilder<E> {
        OtelTracingLayerBuilder::new(extractor)
    }

    /// The tracer shared by every service this layer produces.
    pub fn tracer(&self) -> &InvocationTracer<E> {
        &self.tracer
    }
}

impl<S, E: Clone> Layer<S> for OtelTracingLayer<E> {
    type Service = OtelTracingService<S, E>;

    fn layer(&self, inner: S) -> Self::Service {
        OtelTracingService::new(inner, self.tracer.clone())
    }
}

/// Builder for configuring an [`OtelTracingLayer`].
///
/// # Example
///
/// ```ignore
/// use opentelemetry_lambda_tower::{OtelTracingLayer, TracingConfig, SqsEventExtractor};
/// use std::time::Duration;
///
/// let layer = OtelTracingLayer::builder(SqsEventExtractor::new())
///     .config(TracingConfig::load()?)
///     .tracer_provider(my_provider)
///     .flush_timeout(Duration::from_secs(2))
///     .build();
/// ```
#[must_use = "builders do nothing unless .build() is called"]
pub struct OtelTracingLayerBuilder<E> {
    extractor: E,
    config: TracingConfig,
    tracer_provider: Option<Arc<SdkTracerProvider>>,
    logger_provider: Option<Arc<SdkLoggerProvider>>,
    propagator: Option<Arc<dyn TextMapPropagator + Send + Sync>>,
}

impl<E> OtelTracingLayerBuilder<E> {
    /// Creates a new builder with the given extractor.
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            config: TracingConfig::default(),
            tracer_provider: None,
            logger_provider: None,
            propagator: None,
        }
    }

    /// Replaces the whole configuration, e.g. with [`TracingConfig::load`].
    pub fn config(mut self, config: TracingConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the tracer provider flushed after each invocation.
    pub fn tracer_provider(mut self, provider: Arc<SdkTracerProvider>) -> Self {
        self.tracer_provider = Some(provider);
        self
    }

    /// Sets the logger provider flushed after each invocation.
    ///
    /// Without one, logs are not flushed before Lambda freezes the
    /// execution environment.
    pub fn logger_provider(mut self, provider: Arc<SdkLoggerProvider>) -> Self {
        self.logger_provider = Some(provider);
        self
    }

    /// Uses `propagator` for event extraction instead of the global one.
    pub fn propagator<P>(mut self, propagator: P) -> Self
    where
        P: TextMapPropagator + Send + Sync + 'static,
    {
        self.propagator = Some(Arc::new(propagator));
        self
    }

    /// Sets whether providers are flushed after each invocation.
    ///
    /// Default: `true`
    pub fn flush_on_end(mut self, flush: bool) -> Self {
        self.config.flush_on_end = flush;
        self
    }

    /// Sets the upper bound on the flush at the end of an invocation.
    ///
    /// Default: 5 seconds
    pub fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.config.flush_timeout = timeout;
        self
    }

    /// Stops falling back to the cloud trace header when the event carries
    /// no context.
    pub fn disable_xray_context_extraction(mut self, disable: bool) -> Self {
        self.config.disable_xray_context_extraction = disable;
        self
    }

    /// Builds an [`InvocationTracer`] for handlers outside tower.
    pub fn build_tracer(self) -> InvocationTracer<E> {
        let mut tracer = InvocationTracer::new(self.extractor, self.config);
        if let Some(provider) = self.tracer_provider {
            tracer = tracer.with_tracer_provider(provider);
        }
        if let Some(provider) = self.logger_provider {
            tracer = tracer.with_logger_provider(provider);
        }
        if let Some(propagator) = self.propagator {
            tracer = tracer.with_shared_propagator(propagator);
        }
        tracer
    }

    /// Builds the configured layer.
    pub fn build(self) -> OtelTracingLayer<E> {
        OtelTracingLayer {
            tracer: self.build_tracer(),
        }
    }
}
