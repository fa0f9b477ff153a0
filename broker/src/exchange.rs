// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Client for the Roles Anywhere `CreateSession` call.
//!
//! # Request Flow
//!
//! 1. Assemble `Content-Type`, `Host`, `X-Amz-Date` and `X-Amz-X509` headers
//! 2. Build the canonical request over those headers and the JSON body
//! 3. Build the string-to-sign with scope `date/region/rolesanywhere/aws4_request`
//! 4. Sign it with the workload key and attach the `Authorization` header
//! 5. `POST https://{host}/sessions` once; no retries
//! 6. Return the `credentialSet` entries from the response

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::canonical::{
    CanonicalRequest, CredentialScope, RequestHeaders, StringToSign, authorization_token,
    format_amz_date,
};
use crate::constants::{
    CONTENT_TYPE_JSON, HEADER_AMZ_DATE, HEADER_AMZ_X509, HEADER_AUTHORIZATION,
    HEADER_CONTENT_TYPE, HEADER_HOST, SESSIONS_METHOD, SESSIONS_PATH, SIGNING_ALGORITHM,
};
use crate::errors::ExchangeError;
use crate::identity::Identity;
use crate::models::{CredentialSet, SessionRequest, SessionResponse};
use crate::signer;

/// Parameters of one session request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRequest {
    pub host: String,
    pub region: String,
    pub role_arn: String,
    pub trust_anchor_arn: String,
    pub profile_arn: String,
    pub duration_seconds: u32,
}

impl ExchangeRequest {
    fn payload(&self) -> SessionRequest {
        SessionRequest {
            duration_seconds: self.duration_seconds,
            role_arn: self.role_arn.clone(),
            trust_anchor_arn: self.trust_anchor_arn.clone(),
            profile_arn: self.profile_arn.clone(),
        }
    }
}

/// A fully signed request, ready to send.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub headers: RequestHeaders,
    pub body: Vec<u8>,
}

/// Builds and signs the session request for `time`. The headers include `Authorization`.
pub fn sign_request(
    identity: &Identity,
    request: &ExchangeRequest,
    time: DateTime<Utc>,
) -> Result<SignedRequest, ExchangeError> {
    let body = request.payload().to_bytes().map_err(ExchangeError::Encode)?;

    let mut headers = RequestHeaders::new();
    headers.insert(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON);
    headers.insert(HEADER_HOST, request.host.as_str());
    headers.insert(HEADER_AMZ_DATE, format_amz_date(time));
    headers.insert(HEADER_AMZ_X509, identity.certificate.to_base64());

    let canonical_request = CanonicalRequest::build(SESSIONS_METHOD, SESSIONS_PATH, "", &headers, &body);
    let scope = CredentialScope::new(time, &request.region);
    let string_to_sign = StringToSign::new(SIGNING_ALGORITHM, time, scope, &canonical_request);

    let signature = signer::sign(&identity.private_key, &string_to_sign)?;
    let authorization = authorization_token(
        &string_to_sign,
        identity.certificate.serial_number(),
        canonical_request.signed_headers(),
        &signature,
    );
    headers.insert(HEADER_AUTHORIZATION, authorization);

    Ok(SignedRequest { headers, body })
}

fn to_header_map(headers: &RequestHeaders) -> Result<HeaderMap, ExchangeError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|err| ExchangeError::InvalidHeader {
                name: name.to_string(),
                reason: err.to_string(),
            })?;
        let mut header_value =
            HeaderValue::from_str(value).map_err(|err| ExchangeError::InvalidHeader {
                name: name.to_string(),
                reason: err.to_string(),
            })?;
        if name.eq_ignore_ascii_case(HEADER_AUTHORIZATION) {
            header_value.set_sensitive(true);
        }
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Parses a `/sessions` response body.
pub fn parse_session_response(body: &str) -> Result<Vec<CredentialSet>, ExchangeError> {
    let response: SessionResponse =
        serde_json::from_str(body).map_err(|source| ExchangeError::MalformedResponse {
            source,
            body: body.to_string(),
        })?;

    if response.credential_set.is_empty() {
        return Err(ExchangeError::EmptyCredentialSet);
    }

    Ok(response
        .credential_set
        .into_iter()
        .map(|entry| entry.credentials)
        .collect())
}

#[derive(Debug, Clone, Default)]
pub struct ExchangeClient {
    http: reqwest::Client,
    endpoint: Option<String>,
}

impl ExchangeClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: None,
        }
    }

    /// Sends requests to `endpoint` (scheme and authority, e.g. `http://127.0.0.1:8080`)
    /// instead of `https://{host}`. The signed `Host` header still carries the configured
    /// host.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into().trim_end_matches('/').to_string());
        self
    }

    fn url(&self, host: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{endpoint}{SESSIONS_PATH}"),
            None => format!("https://{host}{SESSIONS_PATH}"),
        }
    }

    /// Exchanges the identity for the credential sets granted to `request.role_arn`.
    #[tracing::instrument(skip(self, identity), fields(serial = identity.certificate.serial_number()))]
    pub async fn create_session(
        &self,
        identity: &Identity,
        request: &ExchangeRequest,
    ) -> Result<Vec<CredentialSet>, ExchangeError> {
        let signed = sign_request(identity, request, Utc::now())?;
        let headers = to_header_map(&signed.headers)?;
        let url = self.url(&request.host);

        tracing::debug!("[broker] requesting session from {}", url);

        let response = self
            .http
            .post(&url)
            .headers(headers)
            .body(signed.body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("[broker] session request failed with status {}", status);
            return Err(ExchangeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let credentials = parse_session_response(&body)?;
        tracing::info!(
            "[broker] obtained {} credential set(s) for {}",
            credentials.len(),
            request.role_arn
        );

        Ok(credentials)
    }
}
