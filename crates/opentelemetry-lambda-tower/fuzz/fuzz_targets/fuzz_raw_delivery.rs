//! Fuzz target for SNS notifications embedded in SQS bodies.
//!
//! Run with: `cargo +nightly fuzz run fuzz_raw_delivery`

#![no_main]

use libfuzzer_sys::fuzz_target;
use opentelemetry_aws_messaging::{AttributeGetter, try_unwrap};

fuzz_target!(|data: &str| {
    if let Some(notification) = try_unwrap(data) {
        for name in notification.names() {
            let _ = notification.lookup(name);
        }
    }
});
