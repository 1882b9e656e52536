//! Inbound trace context extraction from SQS/SNS events.
//!
//! The propagator's generic extraction runs over any container implementing
//! [`AttributeGetter`], so SQS attributes, SNS attributes and SNS
//! notifications embedded in SQS bodies share one algorithm.
//!
//! Only the last record of a batch is used as the carrier: the model assumes
//! one trace parent per invocation. Batches mixing parents from different
//! traces are not fanned out.

pub mod raw_delivery;

#[cfg(feature = "sns")]
pub mod sns;

#[cfg(feature = "sqs")]
pub mod sqs;

use crate::context::PropagationContext;
use opentelemetry::Context;
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use std::collections::HashMap;

/// Case-insensitive lookup of attribute values in an inbound container.
pub trait AttributeGetter {
    /// Returns the decoded values of attribute `name`, or `None` when the
    /// attribute is missing or cannot be decoded as strings.
    fn lookup(&self, name: &str) -> Option<Vec<&str>>;

    /// Returns all attribute names in the container.
    fn names(&self) -> Vec<&str>;
}

/// Finds `name` in `map`, preferring an exact match over an ASCII
/// case-insensitive one.
pub fn get_ignore_case<'a, V>(map: &'a HashMap<String, V>, name: &str) -> Option<&'a V> {
    map.get(name).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

/// Adapts an [`AttributeGetter`] to the propagator's [`Extractor`] trait.
///
/// `get` returns every value of a multi-valued attribute joined with `,`,
/// the list form W3C headers such as `tracestate` use. `get_all` returns
/// the values separately.
pub struct AttributeExtractor<'a, G: ?Sized> {
    getter: &'a G,
    joined: HashMap<String, String>,
}

impl<'a, G: AttributeGetter + ?Sized> AttributeExtractor<'a, G> {
    /// Wraps `getter`, joining its multi-valued attributes up front.
    pub fn new(getter: &'a G) -> Self {
        let joined = getter
            .names()
            .into_iter()
            .filter_map(|name| {
                let values = getter.lookup(name)?;
                (!values.is_empty()).then(|| (name.to_string(), values.join(",")))
            })
            .collect();
        Self { getter, joined }
    }
}

impl<G: AttributeGetter + ?Sized> Extractor for AttributeExtractor<'_, G> {
    fn get(&self, key: &str) -> Option<&str> {
        get_ignore_case(&self.joined, key).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        self.getter.names()
    }

    fn get_all(&self, key: &str) -> Option<Vec<&str>> {
        self.getter.lookup(key)
    }
}

/// Runs `propagator` over `attributes`, starting from an empty context.
pub fn extract_with<G>(attributes: &G, propagator: &dyn TextMapPropagator) -> PropagationContext
where
    G: AttributeGetter + ?Sized,
{
    let cx = propagator.extract_with_context(&Context::new(), &AttributeExtractor::new(attributes));
    PropagationContext::new(cx)
}
