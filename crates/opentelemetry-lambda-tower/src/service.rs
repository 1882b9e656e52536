//! Tower Service implementation for OpenTelemetry tracing.

use crate::attributes::InvocationOutput;
use crate::extractor::TraceContextExtractor;
use crate::future::OtelTracingFuture;
use crate::tracer::InvocationTracer;
use lambda_runtime::LambdaEvent;
use std::fmt::Display;
use std::task::{Context, Poll};
use tower::Service;

/// Tower service that runs every invocation of the inner service inside an
/// invocation span.
///
/// Per call it:
/// 1. Resolves the parent context from the event or the cloud trace header
/// 2. Starts the span with Lambda and trigger attributes
/// 3. Invokes the inner service with the span entered
/// 4. Records the outcome, ends the span and flushes
///
/// The inner service's response and error pass through unchanged.
#[derive(Clone, Debug)]
pub struct OtelTracingService<S, E> {
    inner: S,
    tracer: InvocationTracer<E>,
}

impl<S, E> OtelTracingService<S, E> {
    pub(crate) fn new(inner: S, tracer: InvocationTracer<E>) -> Self {
        Self { inner, tracer }
    }

    /// The wrapped service.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S, E, T> Service<LambdaEvent<T>> for OtelTracingService<S, E>
where
    S: Service<LambdaEvent<T>>,
    S::Response: InvocationOutput,
    S::Error: Display,
    E: TraceContextExtractor<T>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = OtelTracingFuture<S::Future, S::Response, S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, event: LambdaEvent<T>) -> Self::Future {
        let invocation = self.tracer.start(&event.payload, &event.context, None);

        // The inner future must not hold its own span handle, otherwise the
        // span outlives the flush.
        let future = {
            let _entered = invocation.span().enter();
            self.inner.call(event)
        };

        OtelTracingFuture::new(future, invocation)
    }
}
