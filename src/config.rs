//! Configuration loading via `ortho-config`.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Service endpoint configuration derived from environment variables,
/// configuration files, and CLI flags.
///
/// The credential token is deliberately not part of this struct; it is an
/// explicit [`crate::auth::Credential`] value handed to the HTTP client.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "SKIFF")]
pub struct ServiceConfig {
    /// Base URL of the workbench service API.
    #[ortho_config(default = "https://api.skiff.cloud".to_owned())]
    pub base_url: String,
    /// Total per-request deadline in seconds. Generous by default so slow
    /// uploads complete, but never unbounded: a hung connection must fail
    /// eventually.
    #[ortho_config(default = 300)]
    pub request_timeout_secs: u64,
    /// Connection establishment deadline in seconds. Also applied to the
    /// log-streaming client, which carries no total deadline.
    #[ortho_config(default = 10)]
    pub connect_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(
        description: &'static str,
        env_var: &'static str,
        toml_key: &'static str,
    ) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl ServiceConfig {
    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags
    /// in that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("skiff")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Error messages include guidance on how
    /// to provide missing values via environment variables or configuration
    /// files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::InvalidTimeout`] when a deadline is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.base_url,
            &FieldMetadata::new("workbench service base URL", "SKIFF_BASE_URL", "base_url"),
        )?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("request_timeout_secs"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("connect_timeout_secs"));
        }
        Ok(())
    }

    /// Returns the base URL with any trailing slash removed, so endpoint
    /// paths can be appended uniformly.
    #[must_use]
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to skiff.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a deadline was configured as zero seconds.
    #[error("{0} must be greater than zero")]
    InvalidTimeout(&'static str),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ServiceConfig};

    fn config() -> ServiceConfig {
        ServiceConfig {
            base_url: String::from("https://api.example.test/"),
            request_timeout_secs: 300,
            connect_timeout_secs: 10,
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_base_url() {
        let mut cfg = config();
        cfg.base_url = String::from("  ");
        let err = cfg.validate().expect_err("blank base URL should fail");
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = config();
        cfg.request_timeout_secs = 0;
        let err = cfg.validate().expect_err("zero deadline should fail");
        assert_eq!(err, ConfigError::InvalidTimeout("request_timeout_secs"));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(config().trimmed_base_url(), "https://api.example.test");
    }
}
