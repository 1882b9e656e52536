//! SNS `Publish` injection target.

use super::{MessageAttributeTarget, ParameterCollection};
use crate::codec::{AttributeProtocol, CarrierAttribute};
use aws_sdk_sns::error::BuildError;
use aws_sdk_sns::operation::publish::PublishInput;
use aws_sdk_sns::types::MessageAttributeValue;
use std::collections::HashMap;

/// Both views of an SNS `Publish` request: the indexed query parameters and
/// the typed message attribute map.
///
/// # Example
///
/// ```ignore
/// use opentelemetry_aws_messaging::inject::{inject_context_global, sns::SnsPublishTarget};
///
/// let mut target = SnsPublishTarget::for_publish_input(&mut parameters, &mut input);
/// inject_context_global(&mut target, &cx);
/// ```
pub struct SnsPublishTarget<'a> {
    parameters: &'a mut ParameterCollection,
    message_attributes: &'a mut HashMap<String, MessageAttributeValue>,
}

impl<'a> SnsPublishTarget<'a> {
    /// Creates a target over a parameter collection and attribute map that
    /// belong to the same request.
    pub fn new(
        parameters: &'a mut ParameterCollection,
        message_attributes: &'a mut HashMap<String, MessageAttributeValue>,
    ) -> Self {
        Self {
            parameters,
            message_attributes,
        }
    }

    /// Creates a target over a `PublishInput`, creating its attribute map if
    /// it has none.
    pub fn for_publish_input(
        parameters: &'a mut ParameterCollection,
        input: &'a mut PublishInput,
    ) -> Self {
        let message_attributes = input.message_attributes.get_or_insert_with(HashMap::new);
        Self::new(parameters, message_attributes)
    }
}

impl MessageAttributeTarget for SnsPublishTarget<'_> {
    type Value = MessageAttributeValue;
    type Error = BuildError;

    fn contains_attribute(&self, name: &str) -> bool {
        self.message_attributes.contains_key(name)
    }

    fn attribute_count(&self) -> usize {
        self.message_attributes.len()
    }

    fn encode(&self, attribute: &CarrierAttribute) -> Result<MessageAttributeValue, BuildError> {
        MessageAttributeValue::builder()
            .data_type(attribute.kind.as_str())
            .string_value(attribute.value.as_str())
            .build()
    }

    fn append(&mut self, index: usize, attribute: CarrierAttribute, value: MessageAttributeValue) {
        for (key, param) in AttributeProtocol::Sns.encode(index, &attribute) {
            self.parameters.add(key, param);
        }
        self.message_attributes.insert(attribute.name, value);
    }
}
