//! Configuration loading.
//!
//! [`AuthConfig`] gathers everything needed to run the consent flow
//! against an HTTP identity broker. It can be built in code, deserialized
//! from JSON, or read from prefixed environment variables.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use agentauth_broker::{HttpBroker, HttpBrokerConfig, TokenRequest};
use agentauth_core::Scopes;
use agentauth_flow::{AuthFlowController, PollConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A broker URL is required to build the HTTP broker.
    #[error("Missing broker URL")]
    MissingBrokerUrl,

    /// A field holds an unusable value.
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// An environment variable could not be parsed.
    #[error("Invalid environment variable {var}={value:?}: {reason}")]
    InvalidEnv {
        /// Variable name.
        var: String,
        /// Raw value.
        value: String,
        /// Parse failure.
        reason: String,
    },

    /// Reading a config file failed.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// A config file is not valid JSON.
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Settings for the agent's token acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Provider registered with the broker.
    pub provider_id: String,
    /// Scopes requested for every token.
    pub scopes: Scopes,
    /// Broker base URL.
    pub broker_url: Option<Url>,
    /// OAuth callback URL.
    pub callback_url: Option<Url>,
    /// Bearer token identifying this agent to the broker.
    pub workload_token: Option<String>,
    /// Delay between polls.
    #[serde(rename = "poll_interval_secs", with = "secs")]
    pub poll_interval: Duration,
    /// Total polls per consent session.
    pub max_attempts: u32,
    /// Polls per call before returning pending.
    pub attempts_per_call: Option<u32>,
    /// Transport retries per broker call.
    pub transport_retries: u32,
    /// Per-request HTTP timeout.
    #[serde(rename = "request_timeout_secs", with = "secs")]
    pub request_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let poll = PollConfig::default();
        Self {
            provider_id: "github-provider".to_string(),
            scopes: Scopes::parse("repo read:user"),
            broker_url: None,
            callback_url: None,
            workload_token: None,
            poll_interval: poll.interval,
            max_attempts: poll.max_attempts,
            attempts_per_call: poll.attempts_per_call,
            transport_retries: poll.transport_retries,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl AuthConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider id.
    #[must_use]
    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = provider_id.into();
        self
    }

    /// Set the scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Scopes) -> Self {
        self.scopes = scopes;
        self
    }

    /// Set the broker URL.
    #[must_use]
    pub fn with_broker_url(mut self, url: Url) -> Self {
        self.broker_url = Some(url);
        self
    }

    /// Set the callback URL.
    #[must_use]
    pub fn with_callback_url(mut self, url: Url) -> Self {
        self.callback_url = Some(url);
        self
    }

    /// Set the workload token.
    #[must_use]
    pub fn with_workload_token(mut self, token: impl Into<String>) -> Self {
        self.workload_token = Some(token.into());
        self
    }

    /// Set the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the total poll budget per session.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the poll budget per call.
    #[must_use]
    pub fn with_attempts_per_call(mut self, attempts: u32) -> Self {
        self.attempts_per_call = Some(attempts);
        self
    }

    /// Set the transport retries per broker call.
    #[must_use]
    pub fn with_transport_retries(mut self, retries: u32) -> Self {
        self.transport_retries = retries;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read settings from `{prefix}_*` environment variables.
    ///
    /// Unset variables keep their defaults. Recognised suffixes:
    /// `PROVIDER_ID`, `SCOPES`, `BROKER_URL`, `CALLBACK_URL`,
    /// `WORKLOAD_TOKEN`, `POLL_INTERVAL_SECS`, `MAX_ATTEMPTS`,
    /// `ATTEMPTS_PER_CALL`, `TRANSPORT_RETRIES`, `REQUEST_TIMEOUT_SECS`.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let var = |suffix: &str| {
            let name = format!("{prefix}_{suffix}");
            std::env::var(&name).ok().map(|value| (name, value))
        };

        let mut config = Self::default();
        if let Some((_, value)) = var("PROVIDER_ID") {
            config.provider_id = value;
        }
        if let Some((_, value)) = var("SCOPES") {
            config.scopes = Scopes::parse(&value);
        }
        if let Some((_, value)) = var("WORKLOAD_TOKEN") {
            config.workload_token = Some(value);
        }
        if let Some(entry) = var("BROKER_URL") {
            config.broker_url = Some(parse_env(entry)?);
        }
        if let Some(entry) = var("CALLBACK_URL") {
            config.callback_url = Some(parse_env(entry)?);
        }
        if let Some(entry) = var("POLL_INTERVAL_SECS") {
            config.poll_interval = Duration::from_secs(parse_env(entry)?);
        }
        if let Some(entry) = var("MAX_ATTEMPTS") {
            config.max_attempts = parse_env(entry)?;
        }
        if let Some(entry) = var("ATTEMPTS_PER_CALL") {
            config.attempts_per_call = Some(parse_env(entry)?);
        }
        if let Some(entry) = var("TRANSPORT_RETRIES") {
            config.transport_retries = parse_env(entry)?;
        }
        if let Some(entry) = var("REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_env(entry)?);
        }
        Ok(config)
    }

    /// Parse a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider_id.trim().is_empty() {
            return Err(invalid("provider_id", "must not be empty"));
        }
        if self.scopes.is_empty() {
            return Err(invalid("scopes", "at least one scope is required"));
        }
        if self.poll_interval.is_zero() {
            return Err(invalid("poll_interval_secs", "must be greater than zero"));
        }
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts", "must be greater than zero"));
        }
        if self.attempts_per_call == Some(0) {
            return Err(invalid("attempts_per_call", "must be greater than zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(invalid("request_timeout_secs", "must be greater than zero"));
        }
        Ok(())
    }

    /// Polling parameters.
    pub fn poll_config(&self) -> Result<PollConfig, ConfigError> {
        self.validate()?;
        Ok(PollConfig {
            interval: self.poll_interval,
            max_attempts: self.max_attempts,
            attempts_per_call: self.attempts_per_call,
            transport_retries: self.transport_retries,
        })
    }

    /// HTTP broker settings.
    pub fn broker_config(&self) -> Result<HttpBrokerConfig, ConfigError> {
        let base_url = self.broker_url.clone().ok_or(ConfigError::MissingBrokerUrl)?;
        let mut config = HttpBrokerConfig::new(base_url).with_timeout(self.request_timeout);
        if let Some(token) = &self.workload_token {
            config = config.with_workload_token(token.clone());
        }
        if let Some(url) = &self.callback_url {
            config = config.with_callback_url(url.clone());
        }
        Ok(config)
    }

    /// A token request for a caller under these settings.
    pub fn token_request(&self, caller_id: impl Into<String>) -> TokenRequest {
        let request = TokenRequest::new(self.provider_id.clone(), self.scopes.clone(), caller_id);
        match &self.callback_url {
            Some(url) => request.with_callback_url(url.clone()),
            None => request,
        }
    }

    /// Build a flow controller talking to the configured HTTP broker.
    pub fn build_controller(&self) -> Result<AuthFlowController, ConfigError> {
        let poll = self.poll_config()?;
        let broker = HttpBroker::new(self.broker_config()?)?;
        Ok(AuthFlowController::new(Arc::new(broker), poll))
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn parse_env<T>((var, value): (String, String)) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err: T::Err| ConfigError::InvalidEnv {
            reason: err.to_string(),
            var,
            value,
        })
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
