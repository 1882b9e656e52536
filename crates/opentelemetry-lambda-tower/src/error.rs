//! Error types for the Lambda tracing middleware.

use thiserror::Error;

/// Errors raised while loading [`TracingConfig`](crate::TracingConfig).
///
/// Configuration is the only fallible setup step; once an invocation is
/// running, instrumentation problems are logged and never surface as errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration source could not be read or did not match the schema.
    #[error("invalid tracing configuration")]
    Figment(#[source] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Figment(Box::new(err))
    }
}
