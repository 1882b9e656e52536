//! OpenTelemetry invocation tracing for AWS Lambda handlers.
//!
//! Every invocation runs inside one server span. The span's parent is
//! resolved from, in order:
//!
//! 1. a context supplied by the caller
//! 2. the context carried by the event (HTTP headers, SQS or SNS message
//!    attributes, including SNS notifications delivered raw through SQS)
//! 3. the cloud trace header (`_X_AMZN_TRACE_ID` or the runtime context)
//!
//! The span records Lambda context, trigger and output attributes, ends
//! with an OK or error status, and the configured providers are flushed
//! before the handler's result is returned. Handler failures are recorded as
//! `exception` events and returned unchanged. Invocations that panic or are
//! cancelled still end their span.
//!
//! # Architecture
//!
//! The `tracing` crate is the primary API, with `tracing-opentelemetry`
//! bridging to OpenTelemetry for export. Handler code keeps using `info!`,
//! `debug!` and friends, and any span it opens is a child of the invocation.
//!
//! # Usage
//!
//! As tower middleware:
//!
//! ```no_run
//! use aws_lambda_events::sqs::SqsEvent;
//! use lambda_runtime::{Error, LambdaEvent, run, service_fn};
//! use opentelemetry_lambda_tower::{OtelTracingLayer, SqsEventExtractor};
//! use tower::ServiceBuilder;
//!
//! async fn handler(event: LambdaEvent<SqsEvent>) -> Result<(), Error> {
//!     tracing::info!(records = event.payload.records.len(), "Processing batch");
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     // Initialise your tracer provider and tracing-opentelemetry subscriber
//!     // ...
//!
//!     let service = ServiceBuilder::new()
//!         .layer(OtelTracingLayer::new(SqsEventExtractor::new()))
//!         .service(service_fn(handler));
//!
//!     run(service).await
//! }
//! ```
//!
//! Or around a single handler call with [`InvocationTracer`]:
//!
//! ```ignore
//! let tracer = OtelTracingLayer::builder(SqsEventExtractor::new())
//!     .config(TracingConfig::load()?)
//!     .build_tracer();
//!
//! let result = tracer.trace(event, |event| process(event));
//! ```
//!
//! # Configuration
//!
//! [`TracingConfig::load`] layers defaults, `/var/task/otel-lambda.toml` and
//! `OTEL_LAMBDA_*` environment variables.
//!
//! # Features
//!
//! - `http` - API Gateway v1/v2 extractor (enabled by default)
//! - `sqs` - SQS event extractor (enabled by default)
//! - `sns` - SNS event extractor
//! - `full` - All extractors

mod attributes;
mod cold_start;
mod config;
mod error;
mod extractor;
mod flush;
mod future;
mod invocation;
mod layer;
mod resolver;
mod service;
mod tracer;

pub mod extractors;
pub mod xray;

#[cfg(test)]
mod test_support;

pub use attributes::{
    FALLBACK_SPAN_NAME, InvocationOutput, lambda_context_attributes, span_name,
};
pub use cold_start::check_cold_start;
pub use config::{TracingConfig, TracingConfigBuilder};
pub use error::ConfigError;
pub use extractor::TraceContextExtractor;
pub use future::OtelTracingFuture;
pub use invocation::{INCOMPLETE_INVOCATION, InvocationSpan, InvocationState};
pub use layer::{OtelTracingLayer, OtelTracingLayerBuilder};
pub use opentelemetry_aws_messaging::PropagationContext;
pub use resolver::{ParentContextResolver, ParentSource};
pub use service::OtelTracingService;
pub use tracer::InvocationTracer;

pub use extractors::generic::GenericEventExtractor;

#[cfg(feature = "http")]
pub use extractors::http::{ApiGatewayV1Extractor, ApiGatewayV2Extractor, HttpEventExtractor};

#[cfg(feature = "sqs")]
pub use extractors::sqs::SqsEventExtractor;

#[cfg(feature = "sns")]
pub use extractors::sns::SnsEventExtractor;
