//! Parent context resolution for invocation spans.

use crate::extractor::TraceContextExtractor;
use crate::xray::{cloud_trace_header, trace_header_context};
use lambda_runtime::Context as LambdaContext;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry_aws_messaging::PropagationContext;
use std::fmt;

/// The candidate that produced an invocation's parent context.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentSource {
    /// Supplied by the caller.
    Explicit,
    /// Extracted from the invocation payload.
    Event,
    /// Parsed from the cloud trace header.
    CloudTraceHeader,
    /// No parent; the span starts a new trace.
    None,
}

impl ParentSource {
    /// Returns the source as a lowercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParentSource::Explicit => "explicit",
            ParentSource::Event => "event",
            ParentSource::CloudTraceHeader => "cloud_trace_header",
            ParentSource::None => "none",
        }
    }
}

impl fmt::Display for ParentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the parent context for an invocation.
///
/// Candidates are tried in order and the first non-empty one wins:
/// 1. a context supplied by the caller
/// 2. the context extracted from the payload
/// 3. the cloud trace header, unless disabled
/// 4. nothing
///
/// Later candidates are never evaluated once an earlier one succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParentContextResolver {
    disable_cloud_trace_header: bool,
}

impl ParentContextResolver {
    /// Creates a resolver; `disable_cloud_trace_header` removes candidate 3.
    pub fn new(disable_cloud_trace_header: bool) -> Self {
        Self {
            disable_cloud_trace_header,
        }
    }

    /// Resolves the parent for one invocation.
    pub fn resolve<T, E>(
        &self,
        explicit: Option<PropagationContext>,
        extractor: &E,
        payload: &T,
        lambda_ctx: &LambdaContext,
        propagator: &dyn TextMapPropagator,
    ) -> (PropagationContext, ParentSource)
    where
        E: TraceContextExtractor<T>,
    {
        let resolved = explicit
            .and_then(PropagationContext::non_empty)
            .map(|cx| (cx, ParentSource::Explicit))
            .or_else(|| {
                extractor
                    .extract_context(payload, propagator)
                    .non_empty()
                    .map(|cx| (cx, ParentSource::Event))
            })
            .or_else(|| {
                if self.disable_cloud_trace_header {
                    return None;
                }
                cloud_trace_header(lambda_ctx)
                    .and_then(|header| trace_header_context(&header))
                    .map(|cx| (cx, ParentSource::CloudTraceHeader))
            })
            .unwrap_or_else(|| (PropagationContext::default(), ParentSource::None));

        tracing::debug!(
            target: "otel_lifecycle",
            source = %resolved.1,
            trace_id = %resolved.0.span_context().trace_id(),
            "Resolved invocation parent context"
        );

        resolved
    }
}
