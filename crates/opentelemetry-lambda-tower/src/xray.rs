//! Parsing of the Lambda cloud trace header.
//!
//! The runtime exposes the active trace as
//! `Root=1-{epoch:8 hex}-{random:24 hex};Parent={span:16 hex};Sampled={0|1}`,
//! both in the invocation context and in the `_X_AMZN_TRACE_ID` environment
//! variable. Extra `key=value` segments such as `Lineage` are ignored.

use lambda_runtime::Context as LambdaContext;
use opentelemetry::trace::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};
use opentelemetry_aws_messaging::PropagationContext;

/// Environment variable holding the cloud trace header.
pub const TRACE_HEADER_ENV_VAR: &str = "_X_AMZN_TRACE_ID";

/// Returns the cloud trace header for this invocation.
///
/// The value carried by the invocation context wins; the environment
/// variable is only consulted when the context has none.
pub fn cloud_trace_header(lambda_ctx: &LambdaContext) -> Option<String> {
    lambda_ctx
        .xray_trace_id
        .clone()
        .filter(|header| !header.is_empty())
        .or_else(|| {
            std::env::var(TRACE_HEADER_ENV_VAR)
                .ok()
                .filter(|header| !header.is_empty())
        })
}

/// Parses a cloud trace header into a remote span context.
///
/// Returns `None` when `Root` or `Parent` is missing or malformed.
///
/// ```
/// use opentelemetry_lambda_tower::xray::parse_trace_header;
///
/// let header = "Root=1-5759e988-bd862e3fe1be46a994272793;Parent=53995c3f42cd8ad8;Sampled=1";
/// let span_context = parse_trace_header(header).unwrap();
/// assert!(span_context.is_sampled());
/// ```
pub fn parse_trace_header(header: &str) -> Option<SpanContext> {
    let mut trace_id = None;
    let mut span_id = None;
    let mut sampled = false;

    for (key, value) in header
        .split(';')
        .filter_map(|segment| segment.trim().split_once('='))
    {
        match key {
            "Root" => trace_id = Some(parse_root(value)?),
            "Parent" => span_id = Some(SpanId::from_bytes(decode_hex::<8>(value)?)),
            "Sampled" => sampled = value == "1",
            _ => {}
        }
    }

    let span_context = SpanContext::new(
        trace_id?,
        span_id?,
        if sampled {
            TraceFlags::SAMPLED
        } else {
            TraceFlags::default()
        },
        true,
        TraceState::default(),
    );

    span_context.is_valid().then_some(span_context)
}

/// Parses the cloud trace header into a propagation context.
pub fn trace_header_context(header: &str) -> Option<PropagationContext> {
    parse_trace_header(header).map(PropagationContext::from_span_context)
}

/// `1-{8 hex}-{24 hex}` to a 128-bit trace id.
fn parse_root(root: &str) -> Option<TraceId> {
    let mut parts = root.splitn(3, '-');
    let (version, epoch, random) = (parts.next()?, parts.next()?, parts.next()?);
    if version != "1" || epoch.len() != 8 || random.len() != 24 {
        return None;
    }

    let mut bytes = [0u8; 16];
    bytes[..4].copy_from_slice(&decode_hex::<4>(epoch)?);
    bytes[4..].copy_from_slice(&decode_hex::<12>(random)?);
    Some(TraceId::from_bytes(bytes))
}

fn decode_hex<const N: usize>(hex: &str) -> Option<[u8; N]> {
    if hex.len() != N * 2 {
        return None;
    }

    let mut bytes = [0u8; N];
    for (byte, pair) in bytes.iter_mut().zip(hex.as_bytes().chunks_exact(2)) {
        *byte = (nibble(pair[0])? << 4) | nibble(pair[1])?;
    }
    Some(bytes)
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
