//! End-to-end propagation: a producer injects its trace context into an
//! outbound SNS or SQS request, the message reaches a Lambda function, and
//! the invocation span continues the producer's trace.

use aws_lambda_events::sns::{MessageAttribute, SnsEvent, SnsMessage, SnsRecord};
use aws_lambda_events::sqs::{SqsEvent, SqsMessage, SqsMessageAttribute};
use aws_sdk_sns::operation::publish::PublishInput;
use aws_sdk_sqs::operation::send_message::SendMessageInput;
use lambda_runtime::{Config, Context as LambdaContext, LambdaEvent};
use opentelemetry::trace::{SpanContext, TraceContextExt, Tracer, TracerProvider as _};
use opentelemetry::Context;
use opentelemetry_aws_messaging::{
    AttributeProtocol, ParameterCollection, SnsPublishTarget, SqsSendMessageTarget,
    inject_context,
};
use opentelemetry_lambda_tower::{
    InvocationTracer, OtelTracingLayer, SnsEventExtractor, SqsEventExtractor, TracingConfig,
};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider, SpanData};
use serde_json::json;
use std::sync::Arc;
use tower::{Layer, Service, ServiceExt};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;

const TOPIC_ARN: &str = "arn:aws:sns:us-east-1:123456789012:orders";
const QUEUE_ARN: &str = "arn:aws:sqs:us-east-1:123456789012:order-events";

struct Harness {
    exporter: InMemorySpanExporter,
    provider: Arc<SdkTracerProvider>,
    _guard: DefaultGuard,
}

impl Harness {
    fn new() -> Self {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let subscriber = tracing_subscriber::registry()
            .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("consumer")));

        Self {
            exporter,
            provider: Arc::new(provider),
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    /// Starts a producer span and returns its context.
    fn producer_context(&self) -> Context {
        let span = self.provider.tracer("producer").start("orders publish");
        Context::current_with_span(span)
    }

    fn span(&self, name: &str) -> SpanData {
        self.exporter
            .get_finished_spans()
            .unwrap()
            .into_iter()
            .find(|span| span.name == name)
            .unwrap_or_else(|| panic!("no span named {name}"))
    }
}

fn lambda_context() -> LambdaContext {
    let mut config = Config::default();
    config.function_name = "order-consumer".to_string();

    let mut lambda_ctx = LambdaContext::default();
    lambda_ctx.env_config = Arc::new(config);
    lambda_ctx.request_id = "invocation-1".to_string();
    lambda_ctx
}

fn assert_continues(invocation: &SpanData, producer: &SpanContext) {
    assert_eq!(invocation.span_context.trace_id(), producer.trace_id());
    assert_eq!(invocation.parent_span_id, producer.span_id());
}

/// SNS publish, delivered to an SQS subscription without raw message
/// delivery, consumed by a tower-instrumented handler.
#[tokio::test]
async fn test_sns_to_sqs_envelope_to_lambda() {
    let harness = Harness::new();
    let producer = harness.producer_context();

    let mut input = PublishInput::builder()
        .topic_arn(TOPIC_ARN)
        .message("order-created")
        .build()
        .unwrap();
    let mut parameters = ParameterCollection::new();
    let outcome = inject_context(
        &mut SnsPublishTarget::for_publish_input(&mut parameters, &mut input),
        &producer,
        &TraceContextPropagator::new(),
    );
    assert!(outcome.is_injected());

    let injected = parameters.message_attributes(AttributeProtocol::Sns);
    assert!(injected.iter().any(|(_, name, _)| name == "traceparent"));

    let envelope_attributes: serde_json::Map<String, serde_json::Value> = input
        .message_attributes()
        .unwrap()
        .iter()
        .map(|(name, value)| {
            (
                name.clone(),
                json!({ "Type": value.data_type(), "Value": value.string_value() }),
            )
        })
        .collect();
    let body = json!({
        "Type": "Notification",
        "MessageId": "sns-1",
        "TopicArn": TOPIC_ARN,
        "Message": input.message(),
        "MessageAttributes": envelope_attributes,
    });

    let mut record = SqsMessage::default();
    record.message_id = Some("sqs-1".to_string());
    record.body = Some(body.to_string());
    record.event_source_arn = Some(QUEUE_ARN.to_string());
    let mut event = SqsEvent::default();
    event.records = vec![record];

    let layer = OtelTracingLayer::builder(SqsEventExtractor::new())
        .propagator(TraceContextPropagator::new())
        .tracer_provider(Arc::clone(&harness.provider))
        .build();
    let mut service = layer.layer(tower::service_fn(|_: LambdaEvent<SqsEvent>| async {
        tracing::info_span!("process order").in_scope(|| Ok::<(), lambda_runtime::Error>(()))
    }));

    service
        .ready()
        .await
        .unwrap()
        .call(LambdaEvent::new(event, lambda_context()))
        .await
        .unwrap();

    let invocation = harness.span("order-consumer");
    assert_continues(&invocation, producer.span().span_context());

    let child = harness.span("process order");
    assert_eq!(child.parent_span_id, invocation.span_context.span_id());
}

/// SQS send with an existing custom attribute, consumed directly.
#[tokio::test]
async fn test_sqs_send_to_lambda() {
    let harness = Harness::new();
    let producer = harness.producer_context();

    let mut input = SendMessageInput::builder()
        .queue_url("https://sqs.us-east-1.amazonaws.com/123456789012/order-events")
        .message_body("order-created")
        .message_attributes(
            "tenant",
            aws_sdk_sqs::types::MessageAttributeValue::builder()
                .data_type("String")
                .string_value("acme")
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let mut parameters = ParameterCollection::new();
    let outcome = inject_context(
        &mut SqsSendMessageTarget::for_send_message_input(&mut parameters, &mut input),
        &producer,
        &TraceContextPropagator::new(),
    );
    assert!(outcome.is_injected());

    let mut record = SqsMessage::default();
    record.message_id = Some("sqs-2".to_string());
    record.body = input.message_body().map(str::to_string);
    record.event_source_arn = Some(QUEUE_ARN.to_string());
    record.message_attributes = input
        .message_attributes()
        .unwrap()
        .iter()
        .map(|(name, value)| {
            let mut attribute = SqsMessageAttribute::default();
            attribute.data_type = Some(value.data_type().to_string());
            attribute.string_value = value.string_value().map(str::to_string);
            (name.clone(), attribute)
        })
        .collect();
    assert_eq!(record.message_attributes.len(), 2);

    let mut event = SqsEvent::default();
    event.records = vec![record];

    let tracer = InvocationTracer::new(SqsEventExtractor::new(), TracingConfig::default())
        .with_propagator(TraceContextPropagator::new());
    tracer
        .trace_async(LambdaEvent::new(event, lambda_context()), |_| async {
            Ok::<(), lambda_runtime::Error>(())
        })
        .await
        .unwrap();

    assert_continues(
        &harness.span("order-consumer"),
        producer.span().span_context(),
    );
}

/// SNS publish consumed by a Lambda subscribed to the topic.
#[test]
fn test_sns_to_lambda() {
    let harness = Harness::new();
    let producer = harness.producer_context();

    let mut input = PublishInput::builder()
        .topic_arn(TOPIC_ARN)
        .message("order-created")
        .build()
        .unwrap();
    let mut parameters = ParameterCollection::new();
    inject_context(
        &mut SnsPublishTarget::for_publish_input(&mut parameters, &mut input),
        &producer,
        &TraceContextPropagator::new(),
    );

    let mut message = SnsMessage::default();
    message.sns_message_type = "Notification".to_string();
    message.message_id = "sns-2".to_string();
    message.topic_arn = TOPIC_ARN.to_string();
    message.message = "order-created".to_string();
    message.message_attributes = input
        .message_attributes()
        .unwrap()
        .iter()
        .map(|(name, value)| {
            let mut attribute = MessageAttribute::default();
            attribute.data_type = value.data_type().to_string();
            attribute.value = value.string_value().unwrap_or_default().to_string();
            (name.clone(), attribute)
        })
        .collect();
    let mut record = SnsRecord::default();
    record.event_source = "aws:sns".to_string();
    record.sns = message;
    let mut event = SnsEvent::default();
    event.records = vec![record];

    let tracer = InvocationTracer::new(SnsEventExtractor::new(), TracingConfig::default())
        .with_propagator(TraceContextPropagator::new());
    let result = tracer.trace(LambdaEvent::new(event, lambda_context()), |_| {
        Err::<(), _>("downstream unavailable")
    });
    assert_eq!(result.unwrap_err(), "downstream unavailable");

    let invocation = harness.span("order-consumer");
    assert_continues(&invocation, producer.span().span_context());
    assert!(invocation.events.iter().any(|event| event.name == "exception"));
}

/// With no context on the message, the cloud trace header is the parent.
#[test]
fn test_cloud_trace_header_fallback() {
    let harness = Harness::new();

    let mut record = SqsMessage::default();
    record.body = Some("plain body".to_string());
    let mut event = SqsEvent::default();
    event.records = vec![record];

    let mut lambda_ctx = lambda_context();
    lambda_ctx.xray_trace_id = Some(
        "Root=1-5759e988-bd862e3fe1be46a994272793;Parent=53995c3f42cd8ad8;Sampled=1".to_string(),
    );

    let tracer = InvocationTracer::new(SqsEventExtractor::new(), TracingConfig::default())
        .with_propagator(TraceContextPropagator::new());
    tracer
        .trace(LambdaEvent::new(event, lambda_ctx), |_| {
            Ok::<(), lambda_runtime::Error>(())
        })
        .unwrap();

    let invocation = harness.span("order-consumer");
    assert_eq!(
        invocation.span_context.trace_id().to_string(),
        "5759e988bd862e3fe1be46a994272793"
    );
    assert_eq!(invocation.parent_span_id.to_string(), "53995c3f42cd8ad8");
}
