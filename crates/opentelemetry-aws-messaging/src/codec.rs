//! Wire representation of message attributes.
//!
//! Outbound, carrier pairs become indexed query-protocol parameters. SNS
//! `Publish` uses `MessageAttributes.entry.<n>.*` and SQS `SendMessage` uses
//! `MessageAttribute.<n>.*`, both 1-based.
//!
//! Inbound, SQS attributes carry `StringValue`/`StringListValues` while SNS
//! attributes carry a declared `Type` and a `Value`, where `String.Array`
//! values are comma-separated.
//!
//! See <https://docs.aws.amazon.com/sns/latest/dg/sns-message-attributes.html>.

use std::fmt;

/// SNS/SQS data type for string attributes.
pub const DATA_TYPE_STRING: &str = "String";

/// SNS data type for comma-separated string arrays.
pub const DATA_TYPE_STRING_ARRAY: &str = "String.Array";

/// Wire data type of an injected attribute.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeKind {
    /// `"String"`.
    #[default]
    String,
}

impl AttributeKind {
    /// Returns the data type as written on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::String => DATA_TYPE_STRING,
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One carrier key/value pair to inject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierAttribute {
    /// Attribute name, e.g. `traceparent`.
    pub name: String,
    /// Attribute value.
    pub value: String,
    /// Wire data type; always [`AttributeKind::String`] today.
    pub kind: AttributeKind,
}

impl CarrierAttribute {
    /// Creates a string attribute.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind: AttributeKind::String,
        }
    }
}

/// Messaging protocol whose indexed parameter keys are being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeProtocol {
    /// SNS `Publish`.
    Sns,
    /// SQS `SendMessage`.
    Sqs,
}

impl AttributeProtocol {
    fn prefix(&self, index: usize) -> String {
        match self {
            AttributeProtocol::Sns => format!("MessageAttributes.entry.{index}"),
            AttributeProtocol::Sqs => format!("MessageAttribute.{index}"),
        }
    }

    /// Key holding the attribute name at `index`.
    pub fn name_key(&self, index: usize) -> String {
        format!("{}.Name", self.prefix(index))
    }

    /// Key holding the attribute data type at `index`.
    pub fn data_type_key(&self, index: usize) -> String {
        format!("{}.Value.DataType", self.prefix(index))
    }

    /// Key holding the attribute string value at `index`.
    pub fn string_value_key(&self, index: usize) -> String {
        format!("{}.Value.StringValue", self.prefix(index))
    }

    /// Encodes an attribute as the three indexed parameters written for it.
    pub fn encode(&self, index: usize, attribute: &CarrierAttribute) -> [(String, String); 3] {
        [
            (self.name_key(index), attribute.name.clone()),
            (self.data_type_key(index), attribute.kind.as_str().to_string()),
            (self.string_value_key(index), attribute.value.clone()),
        ]
    }

    /// Parses the attribute index out of a `...<n>.Name` parameter key.
    ///
    /// Returns `None` for keys belonging to other parameters.
    pub fn attribute_index(&self, key: &str) -> Option<usize> {
        let rest = match self {
            AttributeProtocol::Sns => key.strip_prefix("MessageAttributes.entry.")?,
            AttributeProtocol::Sqs => key.strip_prefix("MessageAttribute.")?,
        };
        let index = rest.strip_suffix(".Name")?;
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        index.parse().ok()
    }
}

/// Decodes an SQS message attribute.
///
/// A present `StringValue` wins; otherwise the `StringListValues` are
/// returned in order, which may be empty.
pub fn decode_sqs<'a>(string_value: Option<&'a str>, string_list_values: &'a [String]) -> Vec<&'a str> {
    match string_value {
        Some(value) => vec![value],
        None => string_list_values.iter().map(String::as_str).collect(),
    }
}

/// Decodes an SNS message attribute by its declared type.
///
/// `String.Array` values are split literally on `,`, without trimming or
/// unescaping. Unknown types and null values yield `None`.
pub fn decode_sns<'a>(data_type: &str, value: Option<&'a str>) -> Option<Vec<&'a str>> {
    let value = value?;
    match data_type {
        DATA_TYPE_STRING => Some(vec![value]),
        DATA_TYPE_STRING_ARRAY => Some(value.split(',').collect()),
        _ => None,
    }
}
