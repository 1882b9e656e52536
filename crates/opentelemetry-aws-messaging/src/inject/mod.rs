//! Outbound trace context injection into SNS/SQS requests.
//!
//! A request is seen through two views that the transport checksums
//! together: the query-protocol [`ParameterCollection`] and the typed
//! message attribute map of the original request. [`inject_attributes`]
//! writes to both or to neither.
//!
//! Injection is skipped entirely when:
//! - any carrier key is already present (the message was instrumented
//!   upstream, or by a second interceptor), or
//! - the message would exceed [`MAX_MESSAGE_ATTRIBUTES`].
//!
//! Skips are reported through [`InjectionOutcome`] and debug logs, never as
//! errors: tracing must not fail the business request.

#[cfg(feature = "sns")]
pub mod sns;

#[cfg(feature = "sqs")]
pub mod sqs;

use crate::carrier::MessageCarrier;
use crate::codec::{AttributeProtocol, CarrierAttribute};
use opentelemetry::Context;
use opentelemetry::propagation::TextMapPropagator;

/// Maximum number of message attributes on a single SQS message or SNS
/// notification.
///
/// See <https://docs.aws.amazon.com/AWSSimpleQueueService/latest/SQSDeveloperGuide/sqs-message-metadata.html>.
pub const MAX_MESSAGE_ATTRIBUTES: usize = 10;

/// Ordered query-protocol parameters of one outbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterCollection {
    params: Vec<(String, String)>,
}

impl ParameterCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.push((key.into(), value.into()));
    }

    /// Returns the first value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if a parameter named `key` exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k == key)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates over parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Collects the `(name, string value)` pairs of the indexed message
    /// attributes for `protocol`, ordered by index.
    pub fn message_attributes(&self, protocol: AttributeProtocol) -> Vec<(usize, String, String)> {
        let mut attributes: Vec<(usize, String, String)> = self
            .iter()
            .filter_map(|(key, name)| {
                let index = protocol.attribute_index(key)?;
                let value = self
                    .get(&protocol.string_value_key(index))
                    .unwrap_or_default();
                Some((index, name.to_string(), value.to_string()))
            })
            .collect();
        attributes.sort_by_key(|(index, _, _)| *index);
        attributes
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterCollection
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// An outbound request that can carry message attributes.
///
/// Implemented per protocol; see [`sns::SnsPublishTarget`] and
/// [`sqs::SqsSendMessageTarget`].
pub trait MessageAttributeTarget {
    /// Typed attribute value stored on the original request.
    type Value;
    /// Error raised while building a typed value.
    type Error: std::error::Error;

    /// Returns `true` if the request already has an attribute named `name`.
    fn contains_attribute(&self, name: &str) -> bool;

    /// Number of attributes currently on the request.
    fn attribute_count(&self) -> usize;

    /// Builds the typed value for `attribute` without modifying the request.
    fn encode(&self, attribute: &CarrierAttribute) -> Result<Self::Value, Self::Error>;

    /// Writes an already-encoded attribute at the 1-based `index` into both
    /// the parameter collection and the attribute map.
    fn append(&mut self, index: usize, attribute: CarrierAttribute, value: Self::Value);
}

/// Result of an injection attempt.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionOutcome {
    /// Attributes were written at indices `first_index..first_index + count`.
    Injected {
        /// Index of the first injected attribute.
        first_index: usize,
        /// Number of injected attributes.
        count: usize,
    },
    /// The carrier was empty; nothing to inject.
    Empty,
    /// At least one carrier key was already present on the request.
    AlreadyInstrumented,
    /// Injecting would exceed [`MAX_MESSAGE_ATTRIBUTES`].
    BudgetExceeded {
        /// Attributes already on the request.
        existing: usize,
        /// Attributes the carrier would add.
        requested: usize,
    },
    /// A typed attribute value could not be built.
    EncodingFailed,
}

impl InjectionOutcome {
    /// Returns `true` if the request was modified.
    pub fn is_injected(&self) -> bool {
        matches!(self, InjectionOutcome::Injected { .. })
    }
}

/// Injects carrier attributes into `target`, all or nothing.
pub fn inject_attributes<T>(target: &mut T, carrier: &MessageCarrier) -> InjectionOutcome
where
    T: MessageAttributeTarget + ?Sized,
{
    if carrier.is_empty() {
        return InjectionOutcome::Empty;
    }

    if let Some(existing) = carrier.keys().find(|key| target.contains_attribute(key)) {
        tracing::debug!(
            target: "otel_messaging",
            attribute = existing,
            "Trace context already present on message; skipping injection"
        );
        return InjectionOutcome::AlreadyInstrumented;
    }

    let existing = target.attribute_count();
    let requested = carrier.len();
    if existing + requested > MAX_MESSAGE_ATTRIBUTES {
        tracing::debug!(
            target: "otel_messaging",
            existing,
            requested,
            limit = MAX_MESSAGE_ATTRIBUTES,
            "Message attribute limit reached; skipping trace context injection"
        );
        return InjectionOutcome::BudgetExceeded {
            existing,
            requested,
        };
    }

    let mut encoded = Vec::with_capacity(requested);
    for attribute in carrier.to_attributes() {
        match target.encode(&attribute) {
            Ok(value) => encoded.push((attribute, value)),
            Err(e) => {
                tracing::warn!(
                    target: "otel_messaging",
                    attribute = %attribute.name,
                    error = %e,
                    "Failed to encode trace context attribute; skipping injection"
                );
                return InjectionOutcome::EncodingFailed;
            }
        }
    }

    let first_index = existing + 1;
    for (offset, (attribute, value)) in encoded.into_iter().enumerate() {
        target.append(first_index + offset, attribute, value);
    }

    InjectionOutcome::Injected {
        first_index,
        count: requested,
    }
}

/// Injects `cx` into `target` using `propagator` to produce the carrier.
pub fn inject_context<T>(
    target: &mut T,
    cx: &Context,
    propagator: &dyn TextMapPropagator,
) -> InjectionOutcome
where
    T: MessageAttributeTarget + ?Sized,
{
    let carrier = MessageCarrier::from_context(cx, propagator);
    inject_attributes(target, &carrier)
}

/// Injects `cx` into `target` using the globally configured propagator.
pub fn inject_context_global<T>(target: &mut T, cx: &Context) -> InjectionOutcome
where
    T: MessageAttributeTarget + ?Sized,
{
    let carrier = opentelemetry::global::get_text_map_propagator(|propagator| {
        MessageCarrier::from_context(cx, propagator)
    });
    inject_attributes(target, &carrier)
}
