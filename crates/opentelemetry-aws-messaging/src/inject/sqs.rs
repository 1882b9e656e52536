//! SQS `SendMessage` injection target.

use super::{MessageAttributeTarget, ParameterCollection};
use crate::codec::{AttributeProtocol, CarrierAttribute};
use aws_sdk_sqs::error::BuildError;
use aws_sdk_sqs::operation::send_message::SendMessageInput;
use aws_sdk_sqs::types::MessageAttributeValue;
use std::collections::HashMap;

/// Both views of an SQS `SendMessage` request.
pub struct SqsSendMessageTarget<'a> {
    parameters: &'a mut ParameterCollection,
    message_attributes: &'a mut HashMap<String, MessageAttributeValue>,
}

impl<'a> SqsSendMessageTarget<'a> {
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

    /// Creates a target over a `SendMessageInput`, creating its attribute
    /// map if it has none.
    pub fn for_send_message_input(
        parameters: &'a mut ParameterCollection,
        input: &'a mut SendMessageInput,
    ) -> Self {
        let message_attributes = input.message_attributes.get_or_insert_with(HashMap::new);
        Self::new(parameters, message_attributes)
    }
}

impl MessageAttributeTarget for SqsSendMessageTarget<'_> {
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
        for (key, param) in AttributeProtocol::Sqs.encode(index, &attribute) {
            self.parameters.add(key, param);
        }
        self.message_attributes.insert(attribute.name, value);
    }
}
