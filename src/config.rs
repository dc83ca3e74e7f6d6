//! Client configuration.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::assignments::submitter::HttpBatchSubmitter;
use crate::error::{ConfigError, GatewayError};
use crate::operators::encoder::{Platform, SubmissionEncoder};
use crate::operators::gateway::HttpOperatorGateway;
use crate::operators::validators::{DEFAULT_PHONE_PATTERN, ValidationRules};

/// Settings shared by the wizard and roster sessions.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Back-office API root, e.g. `https://api.example.com/v1`.
    pub api_base_url: String,
    /// Bearer token sent with every request.
    pub api_token: Option<SecretString>,
    pub platform: Platform,
    /// Regional phone format used by step 1.
    pub phone_pattern: String,
    /// Step 3 requires an employee code.
    pub require_code: bool,
    /// Step 3 requires a profile photo.
    pub require_photo: bool,
    /// Transport timeout for every request.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            api_token: None,
            platform: Platform::default(),
            phone_pattern: DEFAULT_PHONE_PATTERN.to_string(),
            require_code: true,
            require_photo: false,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Build config from `CREW_DESK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup. Unset keys take their defaults;
    /// `CREW_DESK_API_URL` is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_base_url = get("CREW_DESK_API_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("CREW_DESK_API_URL".to_string()))?;
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(invalid("CREW_DESK_API_URL", "must start with http:// or https://"));
        }

        let platform = match get("CREW_DESK_PLATFORM") {
            Some(v) => v
                .parse::<Platform>()
                .map_err(|e: String| invalid("CREW_DESK_PLATFORM", &e))?,
            None => defaults.platform,
        };

        let phone_pattern = match get("CREW_DESK_PHONE_PATTERN") {
            Some(p) => {
                regex::Regex::new(&p)
                    .map_err(|e| invalid("CREW_DESK_PHONE_PATTERN", &e.to_string()))?;
                p
            }
            None => defaults.phone_pattern,
        };

        let timeout = match get("CREW_DESK_TIMEOUT_SECS") {
            Some(v) => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(invalid("CREW_DESK_TIMEOUT_SECS", "expected a positive integer")),
            },
            None => defaults.timeout,
        };

        Ok(Self {
            api_base_url,
            api_token: get("CREW_DESK_API_TOKEN").map(SecretString::from),
            platform,
            phone_pattern,
            require_code: parse_flag("CREW_DESK_REQUIRE_CODE", get("CREW_DESK_REQUIRE_CODE"))?
                .unwrap_or(defaults.require_code),
            require_photo: parse_flag("CREW_DESK_REQUIRE_PHOTO", get("CREW_DESK_REQUIRE_PHOTO"))?
                .unwrap_or(defaults.require_photo),
            timeout,
        })
    }

    /// Validation rules for the operator wizard.
    pub fn validation_rules(&self) -> Result<ValidationRules, ConfigError> {
        let mut rules = ValidationRules::with_phone_pattern(&self.phone_pattern)
            .map_err(|e| invalid("CREW_DESK_PHONE_PATTERN", &e.to_string()))?;
        rules.require_code = self.require_code;
        rules.require_photo = self.require_photo;
        Ok(rules)
    }

    pub fn encoder(&self) -> SubmissionEncoder {
        SubmissionEncoder::new(self.platform)
    }

    pub fn operator_gateway(&self) -> Result<Arc<HttpOperatorGateway>, GatewayError> {
        HttpOperatorGateway::new(
            self.api_base_url.clone(),
            self.api_token.clone(),
            self.timeout,
        )
        .map(Arc::new)
    }

    pub fn batch_submitter(&self) -> Result<Arc<HttpBatchSubmitter>, GatewayError> {
        HttpBatchSubmitter::new(&self.api_base_url, self.api_token.clone(), self.timeout)
            .map(Arc::new)
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn parse_flag(key: &str, value: Option<String>) -> Result<Option<bool>, ConfigError> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(None),
        Some("1" | "true" | "yes" | "on") => Ok(Some(true)),
        Some("0" | "false" | "no" | "off") => Ok(Some(false)),
        Some(_) => Err(invalid(key, "expected true or false")),
    }
}
