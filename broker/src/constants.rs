// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

/// Algorithm label carried in the `Authorization` header. Roles Anywhere signs with the
/// workload's private key; no shared secret is involved.
pub const SIGNING_ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const SERVICE_TOKEN: &str = "rolesanywhere";
pub const REQUEST_TYPE_TOKEN: &str = "aws4_request";

pub const SESSIONS_METHOD: &str = "POST";
pub const SESSIONS_PATH: &str = "/sessions";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_HOST: &str = "Host";
pub const HEADER_AMZ_DATE: &str = "X-Amz-Date";
pub const HEADER_AMZ_X509: &str = "X-Amz-X509";
pub const HEADER_AUTHORIZATION: &str = "Authorization";

/// `YYYYMMDD'T'HHMMSS'Z'`, always UTC
pub const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

pub const PEM_CERTIFICATE_HEADER: &str = "-----BEGIN CERTIFICATE-----";
pub const PEM_BASE64_WIDTH: usize = 64;

pub const DEFAULT_DURATION_SECONDS: u32 = 3600;
pub const MIN_DURATION_SECONDS: u32 = 900;
pub const MAX_DURATION_SECONDS: u32 = 43_200; // 12 hours
pub const DEFAULT_SESSION_NAME: &str = "AssumeRoleSession";
pub const DEFAULT_SECRETS_PREFIX: &str = "BROKER_";

// Validation constants for BrokerConfig
pub const MAX_ARN_LENGTH: u64 = 2048;
pub const MIN_SESSION_NAME_LENGTH: u64 = 2;
pub const MAX_SESSION_NAME_LENGTH: u64 = 64;
pub const MAX_REGION_LENGTH: u64 = 64;

/// Host of the regional Roles Anywhere endpoint.
pub fn rolesanywhere_host(region: &str) -> String {
    format!("rolesanywhere.{region}.amazonaws.com")
}
