//! Force-flushing of telemetry providers at the end of an invocation.
//!
//! Lambda may freeze the execution environment as soon as the handler
//! returns, so buffered spans and logs must be handed to their exporters
//! before the invocation completes.

use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::sync::Arc;
use std::time::Duration;

/// The providers to flush, and how.
#[derive(Clone, Debug, Default)]
pub(crate) struct ProviderFlush {
    tracer_provider: Option<Arc<SdkTracerProvider>>,
    logger_provider: Option<Arc<SdkLoggerProvider>>,
    enabled: bool,
    timeout: Duration,
}

impl ProviderFlush {
    pub(crate) fn new(
        tracer_provider: Option<Arc<SdkTracerProvider>>,
        logger_provider: Option<Arc<SdkLoggerProvider>>,
        enabled: bool,
        timeout: Duration,
    ) -> Self {
        Self {
            tracer_provider,
            logger_provider,
            enabled,
            timeout,
        }
    }

    /// Returns `true` if there is anything to flush.
    pub(crate) fn is_active(&self) -> bool {
        self.enabled && (self.tracer_provider.is_some() || self.logger_provider.is_some())
    }

    /// Flushes on the calling thread, without a timeout.
    pub(crate) fn flush_blocking(&self) {
        if !self.is_active() {
            return;
        }

        if let Some(Err(e)) = self.tracer_provider.as_ref().map(|p| p.force_flush()) {
            tracing::warn!(target: "otel_lifecycle", error = ?e, "Failed to flush tracer provider");
        }

        if let Some(Err(e)) = self.logger_provider.as_ref().map(|p| p.force_flush()) {
            tracing::warn!(target: "otel_lifecycle", error = ?e, "Failed to flush logger provider");
        }
    }

    /// Flushes on the blocking pool, giving up after the configured timeout.
    ///
    /// A flush that times out keeps running in the background.
    pub(crate) async fn flush(self) {
        if !self.is_active() {
            return;
        }

        let timeout = self.timeout;
        let flush = tokio::task::spawn_blocking(move || self.flush_blocking());
        match tokio::time::timeout(timeout, flush).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(target: "otel_lifecycle", error = %e, "Provider flush task failed");
            }
            Err(_) => {
                tracing::warn!(
                    target: "otel_lifecycle",
                    timeout_ms = timeout.as_millis() as u64,
                    "Provider flush timed out"
                );
            }
        }
    }
}
