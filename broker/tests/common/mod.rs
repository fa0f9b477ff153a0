// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Fixtures and wiremock stand-ins for Roles Anywhere and STS.

#![allow(dead_code, clippy::unwrap_used)]

use anywhere_broker::configuration::BrokerConfig;
use anywhere_broker::secrets::MapSecretProvider;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CERT: &str = include_str!("../fixtures/workload.crt");
pub const KEY: &str = include_str!("../fixtures/workload.key");
pub const KEY_EC: &str = include_str!("../fixtures/workload-ec.key");
pub const CERT_SERIAL: &str = "6840136671885861701";

pub const ROLE_ARN: &str = "arn:aws:iam::111122223333:role/workload";
pub const ESCALATION_ROLE_ARN: &str = "arn:aws:iam::444455556666:role/reader";
pub const TRUST_ANCHOR_ARN: &str =
    "arn:aws:rolesanywhere:us-east-1:111122223333:trust-anchor/4579702c-e7d8-4ffb-8ad4-2a5fbd1e8a5b";
pub const PROFILE_ARN: &str =
    "arn:aws:rolesanywhere:us-east-1:111122223333:profile/6d7a1f07-1c5e-4d4b-a1a9-4f8f4e62e1aa";

pub fn provider() -> MapSecretProvider {
    MapSecretProvider::new()
        .with("certificate", CERT)
        .with("private_key", KEY)
        .with("trust_anchor_arn", TRUST_ANCHOR_ARN)
        .with("profile_arn", PROFILE_ARN)
        .with("role_arn", ROLE_ARN)
        .with("escalation_role_arn", ESCALATION_ROLE_ARN)
        .with("region", "us-east-1")
}

pub fn config() -> BrokerConfig {
    BrokerConfig::from_provider(&provider()).unwrap()
}

pub fn session_response() -> serde_json::Value {
    serde_json::json!({
        "credentialSet": [{
            "assumedRoleUser": {
                "arn": "arn:aws:sts::111122223333:assumed-role/workload/6840136671885861701",
                "assumedRoleId": "AROAEXAMPLEWORKLOAD:6840136671885861701"
            },
            "credentials": {
                "accessKeyId": "ASIAFIRSTEXAMPLE",
                "secretAccessKey": "first/secret/EXAMPLEKEY",
                "sessionToken": "first-session-token",
                "expiration": "2026-10-19T13:00:00Z"
            },
            "packedPolicySize": 12,
            "roleArn": ROLE_ARN,
            "sourceIdentity": "CN=workload.example.internal"
        }],
        "subjectArn": "arn:aws:rolesanywhere:us-east-1:111122223333:subject/41cl0bae-6783-40d4-ab20-65dc5d922e35"
    })
}

pub const ASSUME_ROLE_RESPONSE: &str = r#"<AssumeRoleResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <AssumeRoleResult>
    <AssumedRoleUser>
      <AssumedRoleId>AROAEXAMPLEREADER:AssumeRoleSession</AssumedRoleId>
      <Arn>arn:aws:sts::444455556666:assumed-role/reader/AssumeRoleSession</Arn>
    </AssumedRoleUser>
    <Credentials>
      <AccessKeyId>ASIASECONDEXAMPLE</AccessKeyId>
      <SecretAccessKey>second/secret/EXAMPLEKEY</SecretAccessKey>
      <SessionToken>second-session-token</SessionToken>
      <Expiration>2026-10-19T13:00:00Z</Expiration>
    </Credentials>
  </AssumeRoleResult>
  <ResponseMetadata>
    <RequestId>c6104cbe-af31-11e0-8154-cbc7ccf896c7</RequestId>
  </ResponseMetadata>
</AssumeRoleResponse>"#;

pub const GET_CALLER_IDENTITY_RESPONSE: &str = r#"<GetCallerIdentityResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <GetCallerIdentityResult>
    <Arn>arn:aws:sts::444455556666:assumed-role/reader/AssumeRoleSession</Arn>
    <UserId>AROAEXAMPLEREADER:AssumeRoleSession</UserId>
    <Account>444455556666</Account>
  </GetCallerIdentityResult>
  <ResponseMetadata>
    <RequestId>01234567-89ab-cdef-0123-456789abcdef</RequestId>
  </ResponseMetadata>
</GetCallerIdentityResponse>"#;

pub const ACCESS_DENIED_RESPONSE: &str = r#"<ErrorResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <Error>
    <Type>Sender</Type>
    <Code>AccessDenied</Code>
    <Message>User is not authorized to perform: sts:AssumeRole on resource: arn:aws:iam::444455556666:role/reader</Message>
  </Error>
  <RequestId>7a62c49f-347e-4fc4-9331-6e8eEXAMPLE</RequestId>
</ErrorResponse>"#;

pub async fn mount_sessions(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .respond_with(response)
        .mount(server)
        .await;
}

pub async fn mount_assume_role(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("Action=AssumeRole"))
        .respond_with(response)
        .mount(server)
        .await;
}

pub async fn mount_get_caller_identity(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("Action=GetCallerIdentity"))
        .respond_with(response)
        .mount(server)
        .await;
}

pub fn xml(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.as_bytes().to_vec(), "text/xml")
}
