// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use validator::Validate;
use zeroize::Zeroizing;

use crate::constants::{
    DEFAULT_DURATION_SECONDS, DEFAULT_SECRETS_PREFIX, DEFAULT_SESSION_NAME, MAX_ARN_LENGTH,
    MAX_DURATION_SECONDS, MAX_REGION_LENGTH, MAX_SESSION_NAME_LENGTH, MIN_DURATION_SECONDS,
    MIN_SESSION_NAME_LENGTH, rolesanywhere_host,
};
use crate::errors::ConfigError;
use crate::exchange::ExchangeRequest;
use crate::secrets::{DirSecretProvider, EnvSecretProvider, SecretProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SecretsSource {
    Env,
    Dir,
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct BrokerOptions {
    #[arg(long, value_enum, default_value = "env", env("BROKER_SECRETS_SOURCE"))]
    pub secrets_source: SecretsSource,
    #[arg(long, default_value = DEFAULT_SECRETS_PREFIX, env("BROKER_SECRETS_PREFIX"))]
    pub secrets_prefix: String,
    #[arg(long, env("BROKER_SECRETS_DIR"))]
    pub secrets_dir: Option<PathBuf>,
    #[arg(long, env("BROKER_ENDPOINT_URL"))]
    pub endpoint_url: Option<String>,
    #[arg(long, env("BROKER_STS_ENDPOINT_URL"))]
    pub sts_endpoint_url: Option<String>,
    #[arg(long, default_value = "false", env("BROKER_VERIFY"), action = ArgAction::SetTrue)]
    pub verify: bool,
}

impl Default for BrokerOptions {
    fn default() -> Self {
        BrokerOptions {
            secrets_source: SecretsSource::Env,
            secrets_prefix: DEFAULT_SECRETS_PREFIX.to_string(),
            secrets_dir: None,
            endpoint_url: None,
            sts_endpoint_url: None,
            verify: false,
        }
    }
}

impl BrokerOptions {
    pub fn secret_provider(&self) -> Result<Box<dyn SecretProvider>, ConfigError> {
        match self.secrets_source {
            SecretsSource::Env => Ok(Box::new(EnvSecretProvider::new(&self.secrets_prefix))),
            SecretsSource::Dir => {
                let dir = self.secrets_dir.clone().ok_or_else(|| ConfigError::InvalidValue {
                    name: "secrets_dir".to_string(),
                    reason: "required when --secrets-source=dir".to_string(),
                })?;
                Ok(Box::new(DirSecretProvider::new(dir)))
            }
        }
    }
}

/// Everything one broker invocation needs.
#[derive(Clone, Validate)]
pub struct BrokerConfig {
    pub certificate: Zeroizing<String>,
    pub private_key: Zeroizing<String>,

    #[validate(length(min = 1, max = MAX_ARN_LENGTH))]
    #[validate(custom(function = "validate_arn"))]
    pub trust_anchor_arn: String,

    #[validate(length(min = 1, max = MAX_ARN_LENGTH))]
    #[validate(custom(function = "validate_arn"))]
    pub profile_arn: String,

    #[validate(length(min = 1, max = MAX_ARN_LENGTH))]
    #[validate(custom(function = "validate_arn"))]
    pub role_arn: String,

    #[validate(length(min = 1, max = MAX_ARN_LENGTH))]
    #[validate(custom(function = "validate_arn"))]
    pub escalation_role_arn: String,

    #[validate(length(min = 1, max = MAX_REGION_LENGTH))]
    #[validate(custom(function = "validate_aws_region"))]
    pub region: String,

    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = MIN_DURATION_SECONDS, max = MAX_DURATION_SECONDS))]
    pub duration_seconds: u32,

    #[validate(length(min = MIN_SESSION_NAME_LENGTH, max = MAX_SESSION_NAME_LENGTH))]
    pub session_name: String,
}

// Custom Debug implementation to prevent accidental logging of key material
impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("certificate", &"[REDACTED]")
            .field("private_key", &"[REDACTED]")
            .field("trust_anchor_arn", &self.trust_anchor_arn)
            .field("profile_arn", &self.profile_arn)
            .field("role_arn", &self.role_arn)
            .field("escalation_role_arn", &self.escalation_role_arn)
            .field("region", &self.region)
            .field("host", &self.host)
            .field("duration_seconds", &self.duration_seconds)
            .field("session_name", &self.session_name)
            .finish()
    }
}

impl BrokerConfig {
    /// Reads and validates the configuration from `provider`.
    pub fn from_provider(provider: &dyn SecretProvider) -> Result<Self, ConfigError> {
        let plain = |name: &str| -> Result<String, ConfigError> {
            Ok(provider.require(name)?.trim().to_string())
        };

        let region = plain("region")?;
        let host = match provider.secret("host")? {
            Some(host) => host.trim().to_string(),
            None => rolesanywhere_host(&region),
        };
        let duration_seconds = match provider.secret("duration_seconds")? {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "duration_seconds".to_string(),
                reason: format!("not a number of seconds: {}", value.as_str()),
            })?,
            None => DEFAULT_DURATION_SECONDS,
        };
        let session_name = match provider.secret("session_name")? {
            Some(name) => name.trim().to_string(),
            None => DEFAULT_SESSION_NAME.to_string(),
        };

        let config = Self {
            certificate: provider.require("certificate")?,
            private_key: provider.require("private_key")?,
            trust_anchor_arn: plain("trust_anchor_arn")?,
            profile_arn: plain("profile_arn")?,
            role_arn: plain("role_arn")?,
            escalation_role_arn: plain("escalation_role_arn")?,
            region,
            host,
            duration_seconds,
            session_name,
        };

        config.validate().map_err(|e| {
            tracing::error!("[broker] configuration validation failed: {}", e);
            ConfigError::ValidationError(e.to_string())
        })?;

        Ok(config)
    }

    pub fn exchange_request(&self) -> ExchangeRequest {
        ExchangeRequest {
            host: self.host.clone(),
            region: self.region.clone(),
            role_arn: self.role_arn.clone(),
            trust_anchor_arn: self.trust_anchor_arn.clone(),
            profile_arn: self.profile_arn.clone(),
            duration_seconds: self.duration_seconds,
        }
    }
}

/// Validates AWS region format (e.g., "us-east-1", "eu-west-2")
/// Pattern: two lowercase letters, hyphen, lowercase letters, hyphen, digits
fn validate_aws_region(region: &str) -> Result<(), validator::ValidationError> {
    let parts: Vec<&str> = region.split('-').collect();
    if parts.len() < 3 {
        return Err(validator::ValidationError::new("invalid_aws_region"));
    }

    // First part: exactly 2 lowercase letters (e.g., "us", "eu", "ap")
    let first = parts[0];
    if first.len() != 2 || !first.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(validator::ValidationError::new("invalid_aws_region"));
    }

    // Middle parts: lowercase letters (e.g., "east", "west", "southeast", "gov")
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(validator::ValidationError::new("invalid_aws_region"));
        }
    }

    // Last part: digits (e.g., "1", "2")
    let last = parts[parts.len() - 1];
    if last.is_empty() || !last.chars().all(|c| c.is_ascii_digit()) {
        return Err(validator::ValidationError::new("invalid_aws_region"));
    }

    Ok(())
}

/// `arn:partition:service:region:account:resource`; region and account may be empty
/// (IAM role ARNs have no region).
fn validate_arn(arn: &str) -> Result<(), validator::ValidationError> {
    let parts: Vec<&str> = arn.splitn(6, ':').collect();
    if parts.len() != 6 || parts[0] != "arn" {
        return Err(validator::ValidationError::new("invalid_arn"));
    }
    if parts[1].is_empty() || parts[2].is_empty() || parts[5].is_empty() {
        return Err(validator::ValidationError::new("invalid_arn"));
    }
    Ok(())
}
