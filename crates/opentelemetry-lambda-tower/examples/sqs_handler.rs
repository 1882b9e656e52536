//! SQS Lambda example with OpenTelemetry tracing.
//!
//! Each invocation runs in a span whose parent is the producer's trace,
//! taken from the last record's message attributes. SNS notifications
//! delivered through SQS without raw message delivery are unwrapped
//! automatically. Failed records are reported back as batch item failures.
//!
//! # Running
//!
//! ```bash
//! cargo build --example sqs_handler --release
//! ```

use aws_lambda_events::sqs::{BatchItemFailure, SqsBatchResponse, SqsEvent};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_lambda_tower::{OtelTracingLayer, SqsEventExtractor, TracingConfig};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

async fn function_handler(event: LambdaEvent<SqsEvent>) -> Result<SqsBatchResponse, Error> {
    let mut response = SqsBatchResponse::default();

    for record in &event.payload.records {
        let Some(body) = record.body.as_deref() else {
            let mut failure = BatchItemFailure::default();
            failure.item_identifier = record.message_id.clone().unwrap_or_default();
            response.batch_item_failures.push(failure);
            continue;
        };

        tracing::info!(
            message_id = ?record.message_id,
            bytes = body.len(),
            "Processing SQS message"
        );
    }

    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    // Attach an exporter with `with_batch_exporter` to ship spans somewhere.
    let provider = Arc::new(SdkTracerProvider::builder().build());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).without_time())
        .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("sqs-handler")))
        .init();

    let tracing_layer = OtelTracingLayer::builder(SqsEventExtractor::new())
        .config(TracingConfig::load()?)
        .tracer_provider(provider)
        .build();

    let service = ServiceBuilder::new()
        .layer(tracing_layer)
        .service(service_fn(function_handler));

    run(service).await
}
