//! Ordered trace carrier filled by a propagator.

use crate::codec::CarrierAttribute;
use opentelemetry::Context;
use opentelemetry::propagation::{Injector, TextMapPropagator};

/// Ordered set of carrier key/value pairs.
///
/// Keys keep the order in which the propagator wrote them, so a W3C
/// propagator always yields `traceparent` before `tracestate`. Setting an
/// existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageCarrier {
    entries: Vec<(String, String)>,
}

impl MessageCarrier {
    /// Creates an empty carrier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `propagator` over `cx` and collects what it injects.
    pub fn from_context(cx: &Context, propagator: &dyn TextMapPropagator) -> Self {
        let mut carrier = Self::new();
        propagator.inject_context(cx, &mut carrier);
        carrier
    }

    /// Number of pairs in the carrier.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was injected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a value by exact key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the carrier keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over the pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Converts the pairs into string attributes, preserving order.
    pub fn to_attributes(&self) -> Vec<CarrierAttribute> {
        self.iter()
            .map(|(name, value)| CarrierAttribute::string(name, value))
            .collect()
    }
}

impl Injector for MessageCarrier {
    /// Empty values are dropped: SNS and SQS reject empty string attributes.
    fn set(&mut self, key: &str, value: String) {
        if value.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for MessageCarrier
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut carrier = Self::new();
        for (key, value) in iter {
            carrier.set(&key.into(), value.into());
        }
        carrier
    }
}
