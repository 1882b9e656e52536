//! Future that ends an invocation span once the handler completes.

use crate::attributes::InvocationOutput;
use crate::flush::ProviderFlush;
use crate::invocation::InvocationSpan;
use pin_project::pin_project;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

type PendingFlush = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Future wrapping an instrumented handler.
///
/// The inner future is polled inside the invocation span. When it resolves,
/// the outcome is recorded, the span is closed and the providers are flushed
/// before the handler's result is returned unchanged. The flush is bounded
/// by the configured timeout.
///
/// Dropping the future early ends the span as failed and flushes on the
/// dropping thread.
#[pin_project]
pub struct OtelTracingFuture<F, T, E> {
    // Declared before the guard so the handler future is gone by the time
    // the span closes.
    #[pin]
    inner: F,
    invocation: Option<InvocationSpan>,
    flushing: Option<(PendingFlush, Result<T, E>)>,
}

impl<F, T, E> OtelTracingFuture<F, T, E> {
    pub(crate) fn new(inner: F, invocation: InvocationSpan) -> Self {
        Self {
            inner,
            invocation: Some(invocation),
            flushing: None,
        }
    }
}

impl<F, T, E> Future for OtelTracingFuture<F, T, E>
where
    F: Future<Output = Result<T, E>>,
    T: InvocationOutput,
    E: Display,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();

        if this.flushing.is_none() {
            let result = {
                let _entered = this.invocation.as_ref().map(|i| i.span().enter());
                ready!(this.inner.as_mut().poll(cx))
            };

            let flush = match this.invocation.take() {
                Some(mut invocation) => {
                    invocation.record_result(&result);
                    invocation.close()
                }
                None => ProviderFlush::default(),
            };

            if !flush.is_active() {
                return Poll::Ready(result);
            }
            *this.flushing = Some((Box::pin(flush.flush()), result));
        }

        let Some((mut flush, result)) = this.flushing.take() else {
            return Poll::Pending;
        };
        match flush.as_mut().poll(cx) {
            Poll::Ready(()) => Poll::Ready(result),
            Poll::Pending => {
                *this.flushing = Some((flush, result));
                Poll::Pending
            }
        }
    }
}
