//! The span covering a single handler invocation.

use crate::attributes::{InvocationOutput, record_key_values};
use crate::flush::ProviderFlush;
use opentelemetry::trace::Status;
use std::fmt::Display;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Status description for invocations dropped before they completed.
pub const INCOMPLETE_INVOCATION: &str = "invocation did not complete";

/// Lifecycle state of an [`InvocationSpan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    /// The span is open and the handler has not finished.
    Started,
    /// The handler returned successfully.
    Succeeded,
    /// The handler failed, or the invocation was abandoned.
    Failed,
    /// The span is closed and the providers were flushed.
    Stopped,
}

/// Guard owning the span of one handler invocation.
///
/// The span is closed and the providers are flushed exactly once: by
/// [`finish`](Self::finish), by the asynchronous wrappers, or when the guard
/// is dropped. Dropping a guard that never recorded an outcome (a panicking
/// handler, a cancelled future) marks the span as failed first.
#[must_use = "dropping the guard ends the invocation span immediately"]
#[derive(Debug)]
pub struct InvocationSpan {
    span: Span,
    state: InvocationState,
    flush: ProviderFlush,
}

impl InvocationSpan {
    pub(crate) fn new(span: Span, flush: ProviderFlush) -> Self {
        Self {
            span,
            state: InvocationState::Started,
            flush,
        }
    }

    /// The `tracing` span to enter while the handler runs.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Current lifecycle state.
    pub fn state(&self) -> InvocationState {
        self.state
    }

    /// Records a successful handler output.
    pub fn record_output<R: InvocationOutput + ?Sized>(&mut self, output: &R) {
        if self.state != InvocationState::Started {
            return;
        }
        record_key_values(&self.span, output.output_attributes());
        self.span.set_status(Status::Ok);
        self.state = InvocationState::Succeeded;
    }

    /// Records a handler failure as an `exception` span event and sets the
    /// span status to error with the failure's message.
    ///
    /// `exception.type` is the static type name of `E`. For boxed errors such
    /// as `lambda_runtime::Error` that is the box type, not the concrete
    /// error inside it.
    pub fn record_error<E: Display + ?Sized>(&mut self, error: &E) {
        if self.state != InvocationState::Started {
            return;
        }
        let message = error.to_string();
        tracing::error!(
            target: "otel_lifecycle",
            parent: &self.span,
            {
                "exception.type" = std::any::type_name::<E>(),
                "exception.message" = message.as_str()
            },
            "exception"
        );
        self.span.set_status(Status::error(message));
        self.state = InvocationState::Failed;
    }

    /// Records either outcome of a handler.
    pub fn record_result<R: InvocationOutput, E: Display>(&mut self, result: &Result<R, E>) {
        match result {
            Ok(output) => self.record_output(output),
            Err(error) => self.record_error(error),
        }
    }

    /// Closes the span and flushes the providers on the calling thread.
    pub fn finish(mut self) {
        self.close().flush_blocking();
    }

    /// Closes the span and flushes the providers, bounded by the configured
    /// flush timeout.
    pub async fn finish_async(mut self) {
        self.close().flush().await;
    }

    /// Closes the span and hands back the flush still to be performed.
    ///
    /// Subsequent calls are no-ops returning an inactive flush.
    pub(crate) fn close(&mut self) -> ProviderFlush {
        if self.state == InvocationState::Stopped {
            return ProviderFlush::default();
        }
        if self.state == InvocationState::Started {
            self.span.set_status(Status::error(INCOMPLETE_INVOCATION));
            tracing::warn!(target: "otel_lifecycle", "Invocation ended without an outcome");
        }

        // The exporter only sees the span once its last handle is gone.
        drop(std::mem::replace(&mut self.span, Span::none()));
        self.state = InvocationState::Stopped;
        std::mem::take(&mut self.flush)
    }
}

impl Drop for InvocationSpan {
    fn drop(&mut self) {
        if self.state != InvocationState::Stopped {
            self.close().flush_blocking();
        }
    }
}
