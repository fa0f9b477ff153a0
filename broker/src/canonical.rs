// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Canonical request and string-to-sign construction for the session request.
//!
//! The canonical request is:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! Headers are emitted in insertion order, lower-cased, and the same order is used for
//! the signed-header list. The server recomputes both from the headers it receives, so
//! the order here must match what [`crate::exchange`] sends.

use std::fmt;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::constants::{AMZ_DATE_FORMAT, REQUEST_TYPE_TOKEN, SERVICE_TOKEN};

/// Lower-case hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Header list that keeps insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: Vec<(String, String)>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header, or replaces the value in place if the name (case-insensitive)
    /// is already present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `name:value\n` for every header.
    pub fn canonical_block(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("{}:{}\n", name.to_ascii_lowercase(), value))
            .collect()
    }

    /// Lower-cased names joined with `;`.
    pub fn signed_header_list(&self) -> String {
        self.iter()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Immutable canonical form of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    canonical: String,
    signed_headers: String,
    payload_hash: String,
}

impl CanonicalRequest {
    pub fn build(
        method: &str,
        path: &str,
        query_string: &str,
        headers: &RequestHeaders,
        payload: &[u8],
    ) -> Self {
        let canonical_headers = headers.canonical_block();
        let signed_headers = headers.signed_header_list();
        let payload_hash = sha256_hex(payload);

        // canonical_headers already ends with '\n'; the extra one leaves a blank line
        let canonical = format!(
            "{method}\n{path}\n{query_string}\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
        );

        Self {
            canonical,
            signed_headers,
            payload_hash,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn signed_headers(&self) -> &str {
        &self.signed_headers
    }

    pub fn payload_hash(&self) -> &str {
        &self.payload_hash
    }

    pub fn hashed(&self) -> String {
        sha256_hex(self.canonical.as_bytes())
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// `date/region/service/request-type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    date: String,
    region: String,
}

impl CredentialScope {
    pub fn new(time: DateTime<Utc>, region: &str) -> Self {
        Self {
            date: time.format("%Y%m%d").to_string(),
            region: region.to_string(),
        }
    }
}

impl fmt::Display for CredentialScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.date, self.region, SERVICE_TOKEN, REQUEST_TYPE_TOKEN
        )
    }
}

/// Formats a timestamp as `YYYYMMDD'T'HHMMSS'Z'`.
pub fn format_amz_date(time: DateTime<Utc>) -> String {
    time.format(AMZ_DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringToSign {
    algorithm: &'static str,
    timestamp: String,
    scope: CredentialScope,
    hashed_canonical_request: String,
}

impl StringToSign {
    pub fn new(
        algorithm: &'static str,
        time: DateTime<Utc>,
        scope: CredentialScope,
        canonical_request: &CanonicalRequest,
    ) -> Self {
        Self {
            algorithm,
            timestamp: format_amz_date(time),
            scope,
            hashed_canonical_request: canonical_request.hashed(),
        }
    }

    pub fn scope(&self) -> &CredentialScope {
        &self.scope
    }

    pub fn algorithm(&self) -> &'static str {
        self.algorithm
    }
}

impl fmt::Display for StringToSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}\n{}\n{}",
            self.algorithm, self.timestamp, self.scope, self.hashed_canonical_request
        )
    }
}

/// Value of the `Authorization` header:
/// `<algorithm> Credential=<serial>/<scope>, SignedHeaders=<list>, Signature=<hex>`.
pub fn authorization_token(
    string_to_sign: &StringToSign,
    serial_number: &str,
    signed_headers: &str,
    signature: &str,
) -> String {
    format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        string_to_sign.algorithm(),
        serial_number,
        string_to_sign.scope(),
        signed_headers,
        signature
    )
}
