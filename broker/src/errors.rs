// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use crate::escalation::EscalationAbsence;

/// Malformed certificate or private key material.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum IdentityLoadError {
    #[error("certificate is not PEM encoded: missing `-----BEGIN CERTIFICATE-----` header")]
    MissingCertificateHeader,
    #[error("unable to parse certificate: {0}")]
    Certificate(String),
    #[error("private key is encrypted; passphrases are not supported")]
    EncryptedKey,
    #[error("unsupported private key PEM label: {0}")]
    UnsupportedKeyLabel(String),
    #[error("unable to parse private key: {0}")]
    PrivateKey(String),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SigningError {
    #[error("key algorithm {0} cannot sign with RSASSA-PKCS1-v1_5")]
    UnsupportedKey(String),
    #[error("signing failed: {0}")]
    Sign(String),
}

/// Failure at the Roles Anywhere `/sessions` endpoint.
#[derive(thiserror::Error, Debug)]
pub enum ExchangeError {
    #[error("session request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("session response is not valid JSON: {source}; body: {body}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
        body: String,
    },
    #[error("session response contained no credential set")]
    EmptyCredentialSet,
    #[error("invalid request header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("unable to encode session request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing secret: {0}")]
    MissingSecret(String),
    #[error("unable to read secret {name}: {reason}")]
    Unreadable { name: String, reason: String },
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Terminal failure of one broker invocation.
#[derive(thiserror::Error, Debug)]
pub enum BrokerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Identity(#[from] IdentityLoadError),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error("role escalation failed: {0}")]
    EscalationAbsent(EscalationAbsence),
}

impl BrokerError {
    /// Pipeline stage the invocation failed in.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "configuration",
            Self::Identity(_) => "identity",
            Self::Exchange(ExchangeError::Signing(_)) => "signing",
            Self::Exchange(_) => "exchange",
            Self::EscalationAbsent(_) => "escalation",
        }
    }
}

impl From<EscalationAbsence> for BrokerError {
    fn from(absence: EscalationAbsence) -> Self {
        tracing::error!("[broker] {}", absence);
        BrokerError::EscalationAbsent(absence)
    }
}
