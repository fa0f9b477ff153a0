// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Signs the string-to-sign with the workload's private key.
//!
//! The signature is RSASSA-PKCS1-v1_5 over SHA-256 of the string-to-sign, hex encoded
//! in lower case. There is no shared secret: the service verifies the signature with the
//! public key of the certificate sent in `X-Amz-X509`.

use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::Sha256;

use crate::canonical::StringToSign;
use crate::errors::SigningError;
use crate::identity::PrivateKey;

/// Signs raw bytes and returns the lower-case hex signature.
pub fn sign_bytes(private_key: &PrivateKey, message: &[u8]) -> Result<String, SigningError> {
    let key = match private_key {
        PrivateKey::Rsa(key) => key,
        PrivateKey::Unsupported { algorithm } => {
            return Err(SigningError::UnsupportedKey(algorithm.clone()));
        }
    };

    let signing_key = SigningKey::<Sha256>::new(key.clone());
    let signature = signing_key
        .try_sign(message)
        .map_err(|err| SigningError::Sign(err.to_string()))?;

    Ok(hex::encode(signature.to_bytes()))
}

#[tracing::instrument(skip_all)]
pub fn sign(private_key: &PrivateKey, string_to_sign: &StringToSign) -> Result<String, SigningError> {
    sign_bytes(private_key, string_to_sign.to_string().as_bytes())
}
