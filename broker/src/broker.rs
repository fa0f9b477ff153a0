// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! The end-to-end pipeline.
//!
//! ```text
//! Unauthenticated --(load identity, sign, CreateSession)--> FirstCredentialObtained
//! FirstCredentialObtained --(AssumeRole)--> Escalated
//! any failure --> Failed
//! ```
//!
//! There are no retries and no backward transitions. Each call to [`CredentialBroker::run`]
//! loads the identity afresh and nothing is cached between calls.

use crate::configuration::BrokerConfig;
use crate::errors::{BrokerError, ExchangeError};
use crate::escalation::{AssumedSession, Escalation, RoleEscalator};
use crate::exchange::ExchangeClient;
use crate::identity::Identity;
use crate::models::CredentialSet;

#[derive(Debug, Clone, Default)]
pub struct CredentialBroker {
    exchange: ExchangeClient,
    sts_endpoint_url: Option<String>,
}

impl CredentialBroker {
    pub fn new(exchange: ExchangeClient) -> Self {
        Self {
            exchange,
            sts_endpoint_url: None,
        }
    }

    pub fn with_sts_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.sts_endpoint_url = Some(endpoint_url.into());
        self
    }

    fn escalator(&self, config: &BrokerConfig) -> RoleEscalator {
        let escalator = RoleEscalator::new(config.region.as_str());
        match &self.sts_endpoint_url {
            Some(endpoint_url) => escalator.with_endpoint_url(endpoint_url.as_str()),
            None => escalator,
        }
    }

    /// Unauthenticated -> FirstCredentialObtained. Returns the first entry of the
    /// credential set.
    #[tracing::instrument(skip_all, fields(role_arn = %config.role_arn))]
    pub async fn first_credentials(
        &self,
        config: &BrokerConfig,
    ) -> Result<CredentialSet, BrokerError> {
        let identity = Identity::load(&config.certificate, &config.private_key)?;
        let credential_sets = self
            .exchange
            .create_session(&identity, &config.exchange_request())
            .await?;

        credential_sets
            .into_iter()
            .next()
            .ok_or(BrokerError::Exchange(ExchangeError::EmptyCredentialSet))
    }

    /// FirstCredentialObtained -> Escalated, or absence.
    pub async fn escalate(&self, config: &BrokerConfig, credentials: &CredentialSet) -> Escalation {
        self.escalator(config)
            .escalate(
                credentials,
                &config.escalation_role_arn,
                &config.session_name,
            )
            .await
    }

    /// Runs the whole pipeline. Escalation absence is returned as
    /// [`BrokerError::EscalationAbsent`]; the first credential set is never handed out.
    #[tracing::instrument(skip_all, fields(escalation_role_arn = %config.escalation_role_arn))]
    pub async fn run(&self, config: &BrokerConfig) -> Result<AssumedSession, BrokerError> {
        let first = self.first_credentials(config).await.map_err(|err| {
            tracing::error!("[broker] {} stage failed: {}", err.stage(), err);
            err
        })?;
        tracing::debug!("[broker] first credential set obtained");

        let escalation = self.escalate(config, &first).await;
        drop(first);

        escalation.into_result().map_err(BrokerError::from)
    }
}
