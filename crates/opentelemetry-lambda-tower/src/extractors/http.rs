//! HTTP event extractors for API Gateway.
//!
//! Provides trace context extraction from API Gateway events:
//! - [`ApiGatewayV2Extractor`] - HTTP API (v2) events
//! - [`ApiGatewayV1Extractor`] - REST API (v1) events
//! - [`HttpEventExtractor`] - Type alias for the most common v2 extractor
//!
//! The parent context is read from the request headers with the supplied
//! propagator. Both extractors also tag the span with the request's scheme,
//! target, method, host and port.

use crate::attributes::record_key_values;
use crate::extractor::TraceContextExtractor;
use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayV2httpRequest};
use http::HeaderMap;
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::{Context, KeyValue};
use opentelemetry_aws_messaging::PropagationContext;
use opentelemetry_semantic_conventions::attribute::{
    CLIENT_ADDRESS, HTTP_REQUEST_METHOD, HTTP_ROUTE, NETWORK_PROTOCOL_VERSION, SERVER_ADDRESS,
    SERVER_PORT, URL_PATH, URL_QUERY, URL_SCHEME, USER_AGENT_ORIGINAL,
};
use tracing::Span;

const HEADER_FORWARDED_PROTO: &str = "x-forwarded-proto";
const HEADER_HOST: &str = "host";
const HEADER_USER_AGENT: &str = "user-agent";

/// Type alias for the most common HTTP extractor (API Gateway HTTP API v2).
pub type HttpEventExtractor = ApiGatewayV2Extractor;

/// Extractor for API Gateway HTTP API (v2) events.
///
/// # Example
///
/// ```ignore
/// use opentelemetry_lambda_tower::{OtelTracingLayer, ApiGatewayV2Extractor};
///
/// let layer = OtelTracingLayer::new(ApiGatewayV2Extractor::new());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ApiGatewayV2Extractor;

impl ApiGatewayV2Extractor {
    /// Creates a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// HTTP request attributes for the event.
    pub fn request_attributes(&self, event: &ApiGatewayV2httpRequest) -> Vec<KeyValue> {
        let http = &event.request_context.http;
        let target = http.path.as_deref().or(event.raw_path.as_deref());
        let mut attributes = request_attributes(
            header_value(&event.headers, HEADER_FORWARDED_PROTO).as_deref(),
            target,
            http.method.as_str(),
            header_value(&event.headers, HEADER_HOST).as_deref(),
        );

        if let Some(route) = event
            .route_key
            .as_deref()
            .map(|key| key.split_once(' ').map_or(key, |(_, route)| route))
        {
            attributes.push(KeyValue::new(HTTP_ROUTE, route.to_string()));
        }
        if let Some(query) = event.raw_query_string.as_deref().filter(|q| !q.is_empty()) {
            attributes.push(KeyValue::new(URL_QUERY, query.to_string()));
        }
        if let Some(ip) = &http.source_ip {
            attributes.push(KeyValue::new(CLIENT_ADDRESS, ip.clone()));
        }
        if let Some(agent) = header_value(&event.headers, HEADER_USER_AGENT) {
            attributes.push(KeyValue::new(USER_AGENT_ORIGINAL, agent));
        }
        if let Some(protocol) = &http.protocol {
            attributes.push(KeyValue::new(
                NETWORK_PROTOCOL_VERSION,
                http_version(protocol).to_string(),
            ));
        }

        attributes
    }
}

impl TraceContextExtractor<ApiGatewayV2httpRequest> for ApiGatewayV2Extractor {
    fn extract_context(
        &self,
        event: &ApiGatewayV2httpRequest,
        propagator: &dyn TextMapPropagator,
    ) -> PropagationContext {
        extract_from_headers(&event.headers, propagator)
    }

    fn trigger_type(&self) -> &'static str {
        "http"
    }

    fn record_attributes(&self, event: &ApiGatewayV2httpRequest, span: &Span) {
        record_key_values(span, self.request_attributes(event));
    }
}

/// Extractor for API Gateway REST API (v1) events.
#[derive(Clone, Debug, Default)]
pub struct ApiGatewayV1Extractor;

impl ApiGatewayV1Extractor {
    /// Creates a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// HTTP request attributes for the event.
    ///
    /// Multi-value headers take precedence over single-value headers and
    /// are joined with commas.
    pub fn request_attributes(&self, event: &ApiGatewayProxyRequest) -> Vec<KeyValue> {
        let header = |name: &str| {
            joined_header_values(&event.multi_value_headers, name)
                .or_else(|| header_value(&event.headers, name))
        };

        let mut attributes = request_attributes(
            header(HEADER_FORWARDED_PROTO).as_deref(),
            event.path.as_deref(),
            event.http_method.as_str(),
            header(HEADER_HOST).as_deref(),
        );

        if let Some(resource) = &event.resource {
            attributes.push(KeyValue::new(HTTP_ROUTE, resource.clone()));
        }
        if let Some(ip) = &event.request_context.identity.source_ip {
            attributes.push(KeyValue::new(CLIENT_ADDRESS, ip.clone()));
        }
        if let Some(agent) = header(HEADER_USER_AGENT) {
            attributes.push(KeyValue::new(USER_AGENT_ORIGINAL, agent));
        }
        if let Some(protocol) = &event.request_context.protocol {
            attributes.push(KeyValue::new(
                NETWORK_PROTOCOL_VERSION,
                http_version(protocol).to_string(),
            ));
        }

        attributes
    }
}

impl TraceContextExtractor<ApiGatewayProxyRequest> for ApiGatewayV1Extractor {
    fn extract_context(
        &self,
        event: &ApiGatewayProxyRequest,
        propagator: &dyn TextMapPropagator,
    ) -> PropagationContext {
        extract_from_headers(&event.headers, propagator)
    }

    fn trigger_type(&self) -> &'static str {
        "http"
    }

    fn record_attributes(&self, event: &ApiGatewayProxyRequest, span: &Span) {
        record_key_values(span, self.request_attributes(event));
    }
}

/// Scheme, target, method, host and port attributes.
///
/// Absent inputs are omitted. The port is taken from the `Host` header when
/// present, otherwise defaulted from the scheme.
fn request_attributes(
    scheme: Option<&str>,
    target: Option<&str>,
    method: &str,
    host_header: Option<&str>,
) -> Vec<KeyValue> {
    let mut attributes = vec![KeyValue::new(HTTP_REQUEST_METHOD, method.to_string())];

    if let Some(scheme) = scheme {
        attributes.push(KeyValue::new(URL_SCHEME, scheme.to_string()));
    }
    if let Some(target) = target {
        attributes.push(KeyValue::new(URL_PATH, target.to_string()));
    }
    if let Some((host, port)) = host_header.map(|header| host_and_port(scheme, header)) {
        attributes.push(KeyValue::new(SERVER_ADDRESS, host.to_string()));
        if let Some(port) = port {
            attributes.push(KeyValue::new(SERVER_PORT, i64::from(port)));
        }
    }

    attributes
}

/// Splits a `Host` header into host and port.
///
/// Only the first of several comma-separated hosts is considered.
pub fn host_and_port<'a>(scheme: Option<&str>, host_header: &'a str) -> (&'a str, Option<u16>) {
    let first = host_header.split(',').next().unwrap_or(host_header).trim();

    match first.split_once(':') {
        Some((host, port)) => (host, port.parse().ok()),
        None => {
            let default_port = match scheme {
                Some("http") => Some(80),
                Some("https") => Some(443),
                _ => None,
            };
            (first, default_port)
        }
    }
}

fn extract_from_headers(headers: &HeaderMap, propagator: &dyn TextMapPropagator) -> PropagationContext {
    let cx = propagator.extract_with_context(&Context::new(), &HeaderMapExtractor(headers));
    PropagationContext::new(cx)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn joined_header_values(headers: &HeaderMap, name: &str) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    (!values.is_empty()).then(|| values.join(","))
}

/// "HTTP/1.1" to "1.1", "HTTP/2.0" to "2".
fn http_version(protocol: &str) -> &str {
    protocol
        .strip_prefix("HTTP/")
        .map(|v| v.trim_end_matches(".0"))
        .unwrap_or(protocol)
}

/// Adapter to extract from http::HeaderMap using OTel's Extractor trait.
struct HeaderMapExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderMapExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}
