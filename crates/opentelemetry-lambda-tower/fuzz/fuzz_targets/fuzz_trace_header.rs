//! Fuzz target for cloud trace header parsing.
//!
//! Run with: `cargo +nightly fuzz run fuzz_trace_header`

#![no_main]

use libfuzzer_sys::fuzz_target;
use opentelemetry_lambda_tower::xray::parse_trace_header;

fuzz_target!(|data: &str| {
    if let Some(span_context) = parse_trace_header(data) {
        assert!(span_context.is_valid());
        assert!(span_context.is_remote());
    }
});
