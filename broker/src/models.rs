// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;
use std::time::SystemTime;

use aws_credential_types::Credentials;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::ZeroizeOnDrop;

/// Body of the `POST /sessions` request. Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub duration_seconds: u32,
    pub role_arn: String,
    pub trust_anchor_arn: String,
    pub profile_arn: String,
}

impl SessionRequest {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(default)]
    pub credential_set: Vec<CredentialSetEntry>,
    #[serde(default)]
    pub subject_arn: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSetEntry {
    pub credentials: CredentialSet,
    #[serde(default)]
    pub role_arn: Option<String>,
}

/// Temporary credentials returned by either exchange.
#[derive(Clone, Serialize, Deserialize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSet {
    pub access_key_id: String,

    pub secret_access_key: String,

    pub session_token: String,

    #[serde(default)]
    #[zeroize(skip)]
    pub expiration: Option<DateTime<Utc>>,
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl CredentialSet {
    /// Static SDK credentials for building a client bound to this set.
    pub fn to_provider_credentials(&self, provider_name: &'static str) -> Credentials {
        Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            Some(self.session_token.clone()),
            self.expiration.map(SystemTime::from),
            provider_name,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_session_request_field_order() {
        let request = SessionRequest {
            duration_seconds: 3600,
            role_arn: "arn:aws:iam::111122223333:role/workload".to_string(),
            trust_anchor_arn: "arn:aws:rolesanywhere:us-east-1:111122223333:trust-anchor/ta"
                .to_string(),
            profile_arn: "arn:aws:rolesanywhere:us-east-1:111122223333:profile/pr".to_string(),
        };

        let body = String::from_utf8(request.to_bytes().unwrap()).unwrap();
        assert_eq!(
            body,
            "{\"durationSeconds\":3600,\
             \"roleArn\":\"arn:aws:iam::111122223333:role/workload\",\
             \"trustAnchorArn\":\"arn:aws:rolesanywhere:us-east-1:111122223333:trust-anchor/ta\",\
             \"profileArn\":\"arn:aws:rolesanywhere:us-east-1:111122223333:profile/pr\"}"
        );
    }

    #[test]
    fn test_session_response_parses_credentials() {
        let body = serde_json::json!({
            "credentialSet": [{
                "assumedRoleUser": {"arn": "arn:aws:sts::111122223333:assumed-role/workload/5eed"},
                "credentials": {
                    "accessKeyId": "ASIAFIRST",
                    "secretAccessKey": "first-secret",
                    "sessionToken": "first-token",
                    "expiration": "2026-10-19T13:00:00Z"
                },
                "packedPolicySize": 12,
                "roleArn": "arn:aws:iam::111122223333:role/workload",
                "sourceIdentity": "CN=workload"
            }],
            "subjectArn": "arn:aws:rolesanywhere:us-east-1:111122223333:subject/s"
        });

        let response: SessionResponse = serde_json::from_value(body).unwrap();
        let entry = &response.credential_set[0];
        assert_eq!(entry.credentials.access_key_id, "ASIAFIRST");
        assert_eq!(entry.credentials.secret_access_key, "first-secret");
        assert_eq!(entry.credentials.session_token, "first-token");
        assert_eq!(
            entry.credentials.expiration.unwrap().to_rfc3339(),
            "2026-10-19T13:00:00+00:00"
        );
        assert_eq!(
            entry.role_arn.as_deref(),
            Some("arn:aws:iam::111122223333:role/workload")
        );
    }

    #[test]
    fn test_credential_set_debug_is_redacted() {
        let credentials = CredentialSet {
            access_key_id: "ASIAFIRST".to_string(),
            secret_access_key: "first-secret".to_string(),
            session_token: "first-token".to_string(),
            expiration: None,
        };

        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("ASIAFIRST"));
        assert!(!rendered.contains("first-secret"));
        assert!(!rendered.contains("first-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_provider_credentials() {
        let credentials = CredentialSet {
            access_key_id: "ASIAFIRST".to_string(),
            secret_access_key: "first-secret".to_string(),
            session_token: "first-token".to_string(),
            expiration: None,
        };

        let provider = credentials.to_provider_credentials("test");
        assert_eq!(provider.access_key_id(), "ASIAFIRST");
        assert_eq!(provider.secret_access_key(), "first-secret");
        assert_eq!(provider.session_token(), Some("first-token"));
        assert_eq!(provider.expiry(), None);
    }
}
