//! Shared fixtures for unit tests.

use lambda_runtime::{Config, Context as LambdaContext};
use opentelemetry::Value;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider, SpanData};
use std::sync::Arc;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;

/// An in-memory exporter wired into a thread-local `tracing` subscriber.
pub(crate) struct TestTelemetry {
    exporter: InMemorySpanExporter,
    provider: Arc<SdkTracerProvider>,
    _guard: DefaultGuard,
}

impl TestTelemetry {
    pub(crate) fn install() -> Self {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let subscriber = tracing_subscriber::registry()
            .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("test")));

        Self {
            exporter,
            provider: Arc::new(provider),
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    pub(crate) fn provider(&self) -> Arc<SdkTracerProvider> {
        Arc::clone(&self.provider)
    }

    pub(crate) fn spans(&self) -> Vec<SpanData> {
        self.exporter.get_finished_spans().unwrap()
    }

    pub(crate) fn single_span(&self) -> SpanData {
        let mut spans = self.spans();
        assert_eq!(spans.len(), 1, "expected exactly one span, got {spans:?}");
        spans.remove(0)
    }
}

pub(crate) fn attribute(span: &SpanData, key: &str) -> Option<Value> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.clone())
}

pub(crate) fn lambda_context(function_name: &str) -> LambdaContext {
    let mut config = Config::default();
    config.function_name = function_name.to_string();
    config.version = "$LATEST".to_string();
    config.memory = 128;

    let mut lambda_ctx = LambdaContext::default();
    lambda_ctx.env_config = Arc::new(config);
    lambda_ctx.request_id = "req-1".to_string();
    lambda_ctx.invoked_function_arn =
        format!("arn:aws:lambda:us-east-1:123456789012:function:{function_name}");
    lambda_ctx
}
