// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Exchange tests against a simulated Roles Anywhere endpoint.
//!
//! The endpoint is a `wiremock` server; the client is pointed at it with
//! `ExchangeClient::with_endpoint` while the signed `Host` header keeps the real host.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use anywhere_broker::canonical::{CanonicalRequest, CredentialScope, RequestHeaders, StringToSign};
use anywhere_broker::errors::ExchangeError;
use anywhere_broker::exchange::ExchangeClient;
use anywhere_broker::identity::Identity;
use base64::{Engine as _, prelude::BASE64_STANDARD};
use chrono::NaiveDateTime;
use rsa::RsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use sha2::Sha256;
use wiremock::{MockServer, ResponseTemplate};

use common::*;

fn client_for(server: &MockServer) -> ExchangeClient {
    ExchangeClient::default().with_endpoint(server.uri())
}

#[tokio::test]
async fn test_successful_exchange_returns_credential_set() {
    let server = MockServer::start().await;
    mount_sessions(&server, ResponseTemplate::new(200).set_body_json(session_response())).await;

    let identity = Identity::load(CERT, KEY).unwrap();
    let credentials = client_for(&server)
        .create_session(&identity, &config().exchange_request())
        .await
        .unwrap();

    assert_eq!(credentials.len(), 1);
    assert_eq!(credentials[0].access_key_id, "ASIAFIRSTEXAMPLE");
    assert_eq!(credentials[0].secret_access_key, "first/secret/EXAMPLEKEY");
    assert_eq!(credentials[0].session_token, "first-session-token");
}

#[tokio::test]
async fn test_forbidden_exchange_keeps_status_and_body() {
    let server = MockServer::start().await;
    let error_body = serde_json::json!({"message": "Untrusted signing certificate."});
    mount_sessions(&server, ResponseTemplate::new(403).set_body_json(&error_body)).await;

    let identity = Identity::load(CERT, KEY).unwrap();
    let err = client_for(&server)
        .create_session(&identity, &config().exchange_request())
        .await
        .unwrap_err();

    match err {
        ExchangeError::Status { status, body } => {
            assert_eq!(status, 403);
            let body: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert_eq!(body, error_body);
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_success_body_is_malformed() {
    let server = MockServer::start().await;
    mount_sessions(
        &server,
        ResponseTemplate::new(200).set_body_string("<html>gateway</html>"),
    )
    .await;

    let identity = Identity::load(CERT, KEY).unwrap();
    let err = client_for(&server)
        .create_session(&identity, &config().exchange_request())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExchangeError::MalformedResponse { ref body, .. } if body == "<html>gateway</html>"
    ));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let identity = Identity::load(CERT, KEY).unwrap();
    let err = ExchangeClient::default()
        .with_endpoint("http://127.0.0.1:1")
        .create_session(&identity, &config().exchange_request())
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::Transport(_)));
}

/// Recomputes the signature from the request as received, the way the service does,
/// and checks it against the public key of the presented certificate.
#[tokio::test]
async fn test_request_signature_verifies_against_presented_certificate() {
    let server = MockServer::start().await;
    mount_sessions(&server, ResponseTemplate::new(201).set_body_json(session_response())).await;

    let identity = Identity::load(CERT, KEY).unwrap();
    client_for(&server)
        .create_session(&identity, &config().exchange_request())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    let header = |name: &str| {
        request
            .headers
            .get(name)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    };

    assert_eq!(header("content-type"), "application/json");
    assert_eq!(header("host"), "rolesanywhere.us-east-1.amazonaws.com");

    let authorization = header("authorization");
    let (algorithm, rest) = authorization.split_once(' ').unwrap();
    assert_eq!(algorithm, "AWS4-HMAC-SHA256");

    let parts: Vec<&str> = rest.split(", ").collect();
    let credential = parts[0].strip_prefix("Credential=").unwrap();
    let signed_headers = parts[1].strip_prefix("SignedHeaders=").unwrap();
    let signature = parts[2].strip_prefix("Signature=").unwrap();

    let amz_date = header("x-amz-date");
    let time = NaiveDateTime::parse_from_str(&amz_date, "%Y%m%dT%H%M%SZ")
        .unwrap()
        .and_utc();
    assert_eq!(
        credential,
        format!(
            "{CERT_SERIAL}/{}/us-east-1/rolesanywhere/aws4_request",
            &amz_date[..8]
        )
    );
    assert_eq!(signed_headers, "content-type;host;x-amz-date;x-amz-x509");

    let mut headers = RequestHeaders::new();
    for name in signed_headers.split(';') {
        headers.insert(name, header(name));
    }
    let canonical = CanonicalRequest::build("POST", "/sessions", "", &headers, &request.body);
    let string_to_sign = StringToSign::new(
        "AWS4-HMAC-SHA256",
        time,
        CredentialScope::new(time, "us-east-1"),
        &canonical,
    );

    let der = BASE64_STANDARD.decode(header("x-amz-x509")).unwrap();
    let (_, certificate) = x509_parser::parse_x509_certificate(&der).unwrap();
    assert_eq!(certificate.tbs_certificate.serial.to_string(), CERT_SERIAL);

    let public_key = RsaPublicKey::from_public_key_der(certificate.public_key().raw).unwrap();
    let verifying_key = VerifyingKey::<Sha256>::new(public_key);
    let signature = Signature::try_from(hex::decode(signature).unwrap().as_slice()).unwrap();
    verifying_key
        .verify(string_to_sign.to_string().as_bytes(), &signature)
        .unwrap();

    let payload: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(
        payload,
        serde_json::json!({
            "durationSeconds": 3600,
            "roleArn": ROLE_ARN,
            "trustAnchorArn": TRUST_ANCHOR_ARN,
            "profileArn": PROFILE_ARN,
        })
    );
}
