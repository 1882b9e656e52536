//! OpenTelemetry trace context propagation through AWS SNS and SQS message
//! attributes.
//!
//! # Outbound
//!
//! Before an SNS `Publish` or SQS `SendMessage` request is signed, the
//! current trace context is injected as string message attributes into both
//! the request's query parameters and its typed attribute map:
//!
//! ```ignore
//! use opentelemetry_aws_messaging::inject::{ParameterCollection, inject_context_global};
//! use opentelemetry_aws_messaging::inject::sqs::SqsSendMessageTarget;
//!
//! let mut target = SqsSendMessageTarget::for_send_message_input(&mut params, &mut input);
//! let outcome = inject_context_global(&mut target, &opentelemetry::Context::current());
//! ```
//!
//! A message never grows past [`inject::MAX_MESSAGE_ATTRIBUTES`] and an
//! already-instrumented message is left untouched.
//!
//! # Inbound
//!
//! The last record of an SQS or SNS Lambda event is used as the carrier.
//! SQS bodies holding an SNS notification (raw message delivery disabled)
//! are unwrapped when the SQS message itself carries no context.
//!
//! ```ignore
//! use opentelemetry_aws_messaging::extract::sqs::extract_sqs_event_global;
//!
//! let parent = extract_sqs_event_global(&event);
//! ```
//!
//! # Features
//!
//! - `sns` (default): SNS publish injection and SNS event extraction.
//! - `sqs` (default): SQS send injection and SQS event extraction.

pub mod carrier;
pub mod codec;
pub mod context;
pub mod error;
pub mod extract;
pub mod inject;

pub use carrier::MessageCarrier;
pub use codec::{AttributeKind, AttributeProtocol, CarrierAttribute};
pub use context::PropagationContext;
pub use error::UnwrapError;
pub use extract::raw_delivery::{EmbeddedNotification, try_unwrap};
pub use extract::{AttributeExtractor, AttributeGetter};
pub use inject::{
    InjectionOutcome, MAX_MESSAGE_ATTRIBUTES, MessageAttributeTarget, ParameterCollection,
    inject_attributes, inject_context, inject_context_global,
};

#[cfg(feature = "sns")]
pub use extract::sns::{SnsAttributes, extract_sns_event, extract_sns_event_global};
#[cfg(feature = "sns")]
pub use inject::sns::SnsPublishTarget;

#[cfg(feature = "sqs")]
pub use extract::sqs::{SqsAttributes, extract_sqs_event, extract_sqs_event_global};
#[cfg(feature = "sqs")]
pub use inject::sqs::SqsSendMessageTarget;
