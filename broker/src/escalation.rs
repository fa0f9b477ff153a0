// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Role chaining: trades the Roles Anywhere credentials for a narrower role via STS.
//!
//! A failed `AssumeRole` is reported as [`Escalation::Absent`] rather than an error. The
//! caller must stop there; falling back to the first credential set would run with the
//! broader role.

use std::fmt;
use std::time::SystemTime;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_sdk_sts::config::retry::RetryConfig;
use aws_sdk_sts::error::DisplayErrorContext;

use crate::models::CredentialSet;

const ROLES_ANYWHERE_PROVIDER: &str = "RolesAnywhere";
const ASSUME_ROLE_PROVIDER: &str = "AssumeRole";

/// Why no escalated session was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationAbsence {
    pub role_arn: String,
    pub reason: String,
}

impl fmt::Display for EscalationAbsence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unable to assume {}: {}", self.role_arn, self.reason)
    }
}

/// Outcome of [`RoleEscalator::escalate`].
#[must_use]
#[derive(Debug)]
pub enum Escalation {
    Escalated(AssumedSession),
    Absent(EscalationAbsence),
}

impl Escalation {
    pub fn is_escalated(&self) -> bool {
        matches!(self, Self::Escalated(_))
    }

    pub fn into_result(self) -> Result<AssumedSession, EscalationAbsence> {
        match self {
            Self::Escalated(session) => Ok(session),
            Self::Absent(absence) => Err(absence),
        }
    }
}

/// SDK configuration bound to the escalated credentials. This is the only thing handed
/// to code that talks to other services.
#[derive(Clone)]
pub struct AssumedSession {
    config: SdkConfig,
    assumed_role_arn: Option<String>,
    expiration: Option<SystemTime>,
}

impl AssumedSession {
    pub fn new(credentials: Credentials, region: &str, assumed_role_arn: Option<String>) -> Self {
        let expiration = credentials.expiry();
        let config = SdkConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(SharedCredentialsProvider::new(credentials))
            .build();

        Self {
            config,
            assumed_role_arn,
            expiration,
        }
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    /// Builds a client for any service, e.g. `session.client(aws_sdk_s3::Client::new)`.
    pub fn client<C>(&self, build: impl FnOnce(&SdkConfig) -> C) -> C {
        build(&self.config)
    }

    pub fn region(&self) -> Option<&Region> {
        self.config.region()
    }

    pub fn assumed_role_arn(&self) -> Option<&str> {
        self.assumed_role_arn.as_deref()
    }

    pub fn expiration(&self) -> Option<SystemTime> {
        self.expiration
    }
}

impl fmt::Debug for AssumedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssumedSession")
            .field("region", &self.config.region())
            .field("assumed_role_arn", &self.assumed_role_arn)
            .field("expiration", &self.expiration)
            .field("credentials", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RoleEscalator {
    region: String,
    endpoint_url: Option<String>,
}

impl RoleEscalator {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint_url: None,
        }
    }

    /// Sends STS calls to `endpoint_url` instead of the regional endpoint.
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn sts_client(&self, credentials: &CredentialSet) -> aws_sdk_sts::Client {
        let mut builder = aws_sdk_sts::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(credentials.to_provider_credentials(ROLES_ANYWHERE_PROVIDER))
            .retry_config(RetryConfig::disabled());
        if let Some(endpoint_url) = &self.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }
        aws_sdk_sts::Client::from_conf(builder.build())
    }

    /// Assumes `role_arn` with `credentials`. Any STS or transport failure yields
    /// [`Escalation::Absent`].
    #[tracing::instrument(skip(self, credentials))]
    pub async fn escalate(
        &self,
        credentials: &CredentialSet,
        role_arn: &str,
        session_name: &str,
    ) -> Escalation {
        let absent = |reason: String| {
            tracing::warn!("[broker] unable to assume {}: {}", role_arn, reason);
            Escalation::Absent(EscalationAbsence {
                role_arn: role_arn.to_string(),
                reason,
            })
        };

        let output = match self
            .sts_client(credentials)
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(session_name)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => return absent(DisplayErrorContext(&err).to_string()),
        };

        let Some(assumed) = output.credentials() else {
            return absent("AssumeRole response contained no credentials".to_string());
        };

        let expiration = SystemTime::try_from(*assumed.expiration()).ok();
        let escalated = Credentials::new(
            assumed.access_key_id(),
            assumed.secret_access_key(),
            Some(assumed.session_token().to_string()),
            expiration,
            ASSUME_ROLE_PROVIDER,
        );
        let assumed_role_arn = output.assumed_role_user().map(|user| user.arn().to_string());

        tracing::info!(
            "[broker] assumed {} as {}",
            role_arn,
            assumed_role_arn.as_deref().unwrap_or("<unknown>")
        );

        Escalation::Escalated(AssumedSession::new(
            escalated,
            &self.region,
            assumed_role_arn,
        ))
    }
}
