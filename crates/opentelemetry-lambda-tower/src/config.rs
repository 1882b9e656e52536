//! Layered configuration for invocation tracing.
//!
//! Configuration is loaded from (later sources override earlier ones):
//! 1. Default values (compiled in)
//! 2. Config file: `/var/task/otel-lambda.toml` (optional)
//! 3. Environment variables with the `OTEL_LAMBDA_` prefix
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `OTEL_LAMBDA_DISABLE_XRAY_CONTEXT_EXTRACTION` | `disable_xray_context_extraction` | `false` |
//! | `OTEL_LAMBDA_FLUSH_ON_END` | `flush_on_end` | `true` |
//! | `OTEL_LAMBDA_FLUSH_TIMEOUT` | `flush_timeout` (ms) | `5000` |
//! | `OTEL_LAMBDA_ATTRIBUTES` | `attributes` | `{}` |
//!
//! `OTEL_LAMBDA_ATTRIBUTES` uses figment's dictionary syntax, e.g.
//! `{team=payments,tier=gold}`.
//!
//! The configuration is resolved once, before the first invocation, and is
//! read-only afterwards.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "/var/task/otel-lambda.toml";
const ENV_PREFIX: &str = "OTEL_LAMBDA_";

/// Settings shared by every traced invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Skips the cloud trace header (`_X_AMZN_TRACE_ID`) as a parent source.
    pub disable_xray_context_extraction: bool,
    /// Force-flushes the configured providers when an invocation ends.
    pub flush_on_end: bool,
    /// Upper bound for an asynchronous flush, in milliseconds.
    #[serde(with = "duration_ms")]
    pub flush_timeout: Duration,
    /// Custom string attributes added to every invocation span.
    pub attributes: HashMap<String, String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            disable_xray_context_extraction: false,
            flush_on_end: true,
            flush_timeout: Duration::from_secs(5),
            attributes: HashMap::new(),
        }
    }
}

impl TracingConfig {
    /// Loads configuration from defaults, the default config file and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Loads configuration using a custom config file path.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a source exists but cannot be parsed.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(TracingConfig::default()));

        if config_path.as_ref().exists() {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        Ok(figment.extract()?)
    }

    /// Creates a builder starting from the defaults.
    pub fn builder() -> TracingConfigBuilder {
        TracingConfigBuilder::new()
    }
}

/// Builder for constructing a [`TracingConfig`] programmatically.
#[must_use = "builders do nothing unless .build() is called"]
#[derive(Debug, Default)]
pub struct TracingConfigBuilder {
    config: TracingConfig,
}

impl TracingConfigBuilder {
    /// Creates a builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables (or re-enables) the cloud trace header as a parent source.
    pub fn disable_xray_context_extraction(mut self, disable: bool) -> Self {
        self.config.disable_xray_context_extraction = disable;
        self
    }

    /// Sets whether providers are flushed at the end of each invocation.
    ///
    /// Disable only when flushing is handled elsewhere, such as by an
    /// extension.
    pub fn flush_on_end(mut self, flush: bool) -> Self {
        self.config.flush_on_end = flush;
        self
    }

    /// Sets the timeout for asynchronous flushes.
    pub fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.config.flush_timeout = timeout;
        self
    }

    /// Adds a custom attribute recorded on every invocation span.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.attributes.insert(key.into(), value.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> TracingConfig {
        self.config
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
