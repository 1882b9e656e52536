//! Span attributes derived from the invocation context and handler output.

use lambda_runtime::Context as LambdaContext;
use opentelemetry::KeyValue;
use opentelemetry_semantic_conventions::attribute::{
    CLOUD_ACCOUNT_ID, CLOUD_PROVIDER, CLOUD_REGION, FAAS_MAX_MEMORY, FAAS_NAME, FAAS_VERSION,
    HTTP_RESPONSE_STATUS_CODE,
};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Span name used when the function name is unknown.
pub const FALLBACK_SPAN_NAME: &str = "AWS Lambda Invoke";

/// Attribute key for the invoked function ARN.
pub const AWS_LAMBDA_INVOKED_ARN: &str = "aws.lambda.invoked_arn";

/// Invocation span name: the function name, or [`FALLBACK_SPAN_NAME`].
pub fn span_name(lambda_ctx: &LambdaContext) -> &str {
    match lambda_ctx.env_config.function_name.as_str() {
        "" => FALLBACK_SPAN_NAME,
        name => name,
    }
}

/// Cloud and FaaS attributes describing the invoked function.
///
/// Values that are empty or unknown are omitted.
pub fn lambda_context_attributes(lambda_ctx: &LambdaContext) -> Vec<KeyValue> {
    let mut attributes = vec![KeyValue::new(CLOUD_PROVIDER, "aws")];
    let config = &lambda_ctx.env_config;

    if let Ok(region) = std::env::var("AWS_REGION")
        && !region.is_empty()
    {
        attributes.push(KeyValue::new(CLOUD_REGION, region));
    }
    if !config.function_name.is_empty() {
        attributes.push(KeyValue::new(FAAS_NAME, config.function_name.clone()));
    }
    if !config.version.is_empty() {
        attributes.push(KeyValue::new(FAAS_VERSION, config.version.clone()));
    }
    if config.memory > 0 {
        attributes.push(KeyValue::new(
            FAAS_MAX_MEMORY,
            i64::from(config.memory) * 1024 * 1024,
        ));
    }

    let arn = lambda_ctx.invoked_function_arn.as_str();
    if !arn.is_empty() {
        attributes.push(KeyValue::new(AWS_LAMBDA_INVOKED_ARN, arn.to_string()));
        if let Some(account_id) = arn.split(':').nth(4).filter(|id| !id.is_empty()) {
            attributes.push(KeyValue::new(CLOUD_ACCOUNT_ID, account_id.to_string()));
        }
    }

    attributes
}

/// Last `:`-separated segment of an ARN, e.g. the queue or topic name.
pub(crate) fn resource_name_from_arn(arn: &str) -> Option<&str> {
    arn.rsplit(':').next().filter(|name| !name.is_empty())
}

/// Sets each attribute on the span's OpenTelemetry data.
pub(crate) fn record_key_values(span: &Span, attributes: impl IntoIterator<Item = KeyValue>) {
    for KeyValue { key, value, .. } in attributes {
        span.set_attribute(key, value);
    }
}

/// Handler results that can describe themselves on the invocation span.
///
/// Implemented for the API Gateway responses, JSON values and the unit
/// type. Implement it with an empty body for custom response types that
/// carry nothing worth recording.
pub trait InvocationOutput {
    /// HTTP status code carried by the result, if it is HTTP-shaped.
    fn status_code(&self) -> Option<i64> {
        None
    }

    /// Attributes recorded on the span after a successful invocation.
    fn output_attributes(&self) -> Vec<KeyValue> {
        self.status_code()
            .map(|code| vec![KeyValue::new(HTTP_RESPONSE_STATUS_CODE, code)])
            .unwrap_or_default()
    }
}

impl InvocationOutput for () {}

impl InvocationOutput for String {}

/// Recognises `{"statusCode": <number>}` objects, the shape API Gateway
/// expects from handlers returning raw JSON.
impl InvocationOutput for serde_json::Value {
    fn status_code(&self) -> Option<i64> {
        self.get("statusCode")?.as_i64()
    }
}

#[cfg(feature = "http")]
impl InvocationOutput for aws_lambda_events::apigw::ApiGatewayProxyResponse {
    fn status_code(&self) -> Option<i64> {
        Some(self.status_code)
    }
}

#[cfg(feature = "http")]
impl InvocationOutput for aws_lambda_events::apigw::ApiGatewayV2httpResponse {
    fn status_code(&self) -> Option<i64> {
        Some(self.status_code)
    }
}

#[cfg(feature = "sqs")]
impl InvocationOutput for aws_lambda_events::sqs::SqsBatchResponse {}

impl<T: InvocationOutput + ?Sized> InvocationOutput for Box<T> {
    fn status_code(&self) -> Option<i64> {
        (**self).status_code()
    }
}
