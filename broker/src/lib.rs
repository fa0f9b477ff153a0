// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Anywhere Broker
//!
//! Issues short-lived AWS credentials to a workload that holds an X.509 certificate and
//! private key but no long-lived access keys.
//!
//! ## Architecture
//!
//! ```text
//! PEM strings -> Identity -> CanonicalRequest -> signature -> POST /sessions
//!                                                                 |
//!                                       AssumedSession <- STS AssumeRole
//! ```
//!
//! The broker signs a description of its own `CreateSession` request with the workload
//! key, presents the certificate in `X-Amz-X509`, and receives a temporary credential set
//! from IAM Roles Anywhere. Those credentials are then traded for a second, narrower role
//! through STS `AssumeRole`; only the resulting [`escalation::AssumedSession`] is handed
//! to downstream code.
//!
//! ## Modules
//!
//! - [`broker`]: The end-to-end pipeline and its state transitions
//! - [`canonical`]: Canonical request, credential scope and string-to-sign
//! - [`configuration`]: CLI options with clap and the validated broker configuration
//! - [`constants`]: Wire constants and validation limits
//! - [`errors`]: Error types for each stage
//! - [`escalation`]: STS role chaining and the assumed session
//! - [`exchange`]: Signed `CreateSession` client
//! - [`identity`]: PEM normalization and certificate/key loading
//! - [`models`]: Request/response types and the credential set
//! - [`secrets`]: Secret providers (environment, directory, in-memory)
//! - [`signer`]: RSASSA-PKCS1-v1_5 signing
//!
//! ## Usage
//!
//! ```bash
//! BROKER_CERTIFICATE="$(cat workload.crt)" BROKER_PRIVATE_KEY="$(cat workload.key)" \
//! BROKER_TRUST_ANCHOR_ARN=... BROKER_PROFILE_ARN=... BROKER_ROLE_ARN=... \
//! BROKER_ESCALATION_ROLE_ARN=... BROKER_REGION=us-east-1 \
//!   anywhere-broker --verify
//! ```
//!
//! ## Security Considerations
//!
//! - Certificate and key material stay in memory and are zeroized on drop
//! - `Debug` output of credentials, keys and configuration is redacted
//! - Credentials are never cached or refreshed; every run performs a fresh exchange
//! - A failed escalation stops the run instead of falling back to the first role

pub mod broker;
pub mod canonical;
pub mod configuration;
pub mod constants;
pub mod errors;
pub mod escalation;
pub mod exchange;
pub mod identity;
pub mod models;
pub mod secrets;
pub mod signer;
