// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Loads the workload's X.509 identity from in-memory PEM strings.
//!
//! Certificate and key material often reaches the process through environment variables
//! or secret stores that flatten line breaks. Two repairs are applied before parsing:
//!
//! - escaped `\n` sequences are turned back into real line breaks (certificate and key)
//! - a key squashed onto a single line gets its header, body and footer split back onto
//!   separate lines
//!
//! Nothing here touches the filesystem; the parsed [`Identity`] lives only as long as the
//! caller keeps it.

use std::borrow::Cow;
use std::fmt;

use base64::{Engine as _, prelude::BASE64_STANDARD};
use chrono::{DateTime, Utc};
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, ObjectIdentifier, PrivateKeyInfo};
use x509_parser::pem::{Pem, parse_x509_pem};
use zeroize::Zeroizing;

use crate::constants::{PEM_BASE64_WIDTH, PEM_CERTIFICATE_HEADER};
use crate::errors::IdentityLoadError;

const PEM_BEGIN: &str = "-----BEGIN";
const PEM_END: &str = "-----END";
const PEM_DASHES: &str = "-----";
const PEM_LABEL_CERTIFICATE: &str = "CERTIFICATE";
const PEM_LABEL_PKCS8: &str = "PRIVATE KEY";
const PEM_LABEL_PKCS1: &str = "RSA PRIVATE KEY";
const PEM_LABEL_ENCRYPTED_PKCS8: &str = "ENCRYPTED PRIVATE KEY";

const OID_RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const OID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

/// The parts of the workload certificate the exchange needs.
#[derive(Clone, PartialEq)]
pub struct Certificate {
    der: Vec<u8>,
    serial_number: String,
    subject: String,
    not_after: Option<DateTime<Utc>>,
}

impl Certificate {
    /// DER encoding, as presented in the `X-Amz-X509` header.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Base64 (standard alphabet, padded) of the DER bytes.
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.der)
    }

    /// Serial number rendered in decimal.
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn not_after(&self) -> Option<DateTime<Utc>> {
        self.not_after
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("serial_number", &self.serial_number)
            .field("subject", &self.subject)
            .field("not_after", &self.not_after)
            .finish()
    }
}

/// Asymmetric key handle. Only RSA keys can sign the session request; other algorithms
/// load fine and are rejected by the signer.
pub enum PrivateKey {
    Rsa(RsaPrivateKey),
    Unsupported { algorithm: String },
}

impl PrivateKey {
    pub fn algorithm(&self) -> &str {
        match self {
            Self::Rsa(_) => "RSA",
            Self::Unsupported { algorithm } => algorithm,
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({}, [REDACTED])", self.algorithm())
    }
}

#[derive(Debug)]
pub struct Identity {
    pub certificate: Certificate,
    pub private_key: PrivateKey,
}

impl Identity {
    /// Normalizes and parses a certificate and an unencrypted private key.
    #[tracing::instrument(skip_all)]
    pub fn load(certificate: &str, private_key: &str) -> Result<Self, IdentityLoadError> {
        let certificate = load_certificate(certificate)?;
        let private_key = load_private_key(private_key)?;

        tracing::debug!(
            "[broker] loaded identity serial={} algorithm={}",
            certificate.serial_number(),
            private_key.algorithm()
        );

        Ok(Self {
            certificate,
            private_key,
        })
    }
}

/// Replaces escaped `\n` sequences with real line breaks. Text with real line breaks
/// comes back untouched.
pub fn unescape_newlines(input: &str) -> Cow<'_, str> {
    if input.contains("\\n") {
        Cow::Owned(input.replace("\\n", "\n"))
    } else {
        Cow::Borrowed(input)
    }
}

/// Applies both repairs to private key text.
pub fn normalize_private_key(input: &str) -> Zeroizing<String> {
    let unescaped = unescape_newlines(input);
    if unescaped.contains(PEM_BEGIN) && !unescaped.trim_end().contains('\n') {
        Zeroizing::new(split_single_line_pem(&unescaped).unwrap_or_else(|| unescaped.into_owned()))
    } else {
        Zeroizing::new(unescaped.into_owned())
    }
}

/// Rebuilds `-----BEGIN X----- <base64> -----END X-----` as a multi-line PEM block.
fn split_single_line_pem(input: &str) -> Option<String> {
    let begin = input.find(PEM_BEGIN)?;
    let label_start = begin + PEM_BEGIN.len();
    let header_end = label_start + input[label_start..].find(PEM_DASHES)? + PEM_DASHES.len();
    let footer_start = header_end + input[header_end..].find(PEM_END)?;

    let header = &input[begin..header_end];
    let footer = input[footer_start..].trim();

    let mut block = String::with_capacity(input.len() + input.len() / PEM_BASE64_WIDTH + 2);
    block.push_str(header);
    block.push('\n');
    let body = input[header_end..footer_start]
        .chars()
        .filter(|c| !c.is_whitespace());
    for (i, c) in body.enumerate() {
        if i > 0 && i % PEM_BASE64_WIDTH == 0 {
            block.push('\n');
        }
        block.push(c);
    }
    block.push('\n');
    block.push_str(footer);
    block.push('\n');

    Some(block)
}

fn read_pem(input: &str) -> Option<Pem> {
    parse_x509_pem(input.trim_start().as_bytes())
        .ok()
        .map(|(_, pem)| pem)
}

pub fn load_certificate(input: &str) -> Result<Certificate, IdentityLoadError> {
    let normalized = unescape_newlines(input);

    if !normalized.starts_with(PEM_CERTIFICATE_HEADER) {
        return Err(IdentityLoadError::MissingCertificateHeader);
    }

    let pem = read_pem(&normalized)
        .ok_or_else(|| IdentityLoadError::Certificate("invalid PEM block".to_string()))?;
    if pem.label != PEM_LABEL_CERTIFICATE {
        return Err(IdentityLoadError::Certificate(format!(
            "unexpected PEM label {}",
            pem.label
        )));
    }

    let x509 = pem
        .parse_x509()
        .map_err(|err| IdentityLoadError::Certificate(err.to_string()))?;

    let serial_number = x509.tbs_certificate.serial.to_string();
    let subject = x509.subject().to_string();
    let not_after = DateTime::<Utc>::from_timestamp(x509.validity().not_after.timestamp(), 0);

    Ok(Certificate {
        der: pem.contents.clone(),
        serial_number,
        subject,
        not_after,
    })
}

pub fn load_private_key(input: &str) -> Result<PrivateKey, IdentityLoadError> {
    let normalized = normalize_private_key(input);

    let pem = read_pem(&normalized)
        .ok_or_else(|| IdentityLoadError::PrivateKey("invalid PEM block".to_string()))?;
    let der = Zeroizing::new(pem.contents);

    match pem.label.as_str() {
        PEM_LABEL_PKCS8 => {
            let info = PrivateKeyInfo::try_from(der.as_slice())
                .map_err(|err| IdentityLoadError::PrivateKey(err.to_string()))?;
            let oid = info.algorithm.oid;
            if oid == OID_RSA_ENCRYPTION {
                RsaPrivateKey::from_pkcs8_der(&der)
                    .map(PrivateKey::Rsa)
                    .map_err(|err| IdentityLoadError::PrivateKey(err.to_string()))
            } else {
                Ok(PrivateKey::Unsupported {
                    algorithm: algorithm_name(oid),
                })
            }
        }
        PEM_LABEL_PKCS1 => RsaPrivateKey::from_pkcs1_der(&der)
            .map(PrivateKey::Rsa)
            .map_err(|err| IdentityLoadError::PrivateKey(err.to_string())),
        PEM_LABEL_ENCRYPTED_PKCS8 => Err(IdentityLoadError::EncryptedKey),
        other => Err(IdentityLoadError::UnsupportedKeyLabel(other.to_string())),
    }
}

fn algorithm_name(oid: ObjectIdentifier) -> String {
    if oid == OID_EC_PUBLIC_KEY {
        "EC".to_string()
    } else if oid == OID_ED25519 {
        "Ed25519".to_string()
    } else {
        oid.to_string()
    }
}
