// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Sources for the broker's configuration values.
//!
//! Certificate and key material is read into [`Zeroizing`] buffers and never written
//! back anywhere.

use std::collections::HashMap;
use std::path::PathBuf;

use zeroize::Zeroizing;

use crate::errors::ConfigError;

pub trait SecretProvider: Send + Sync {
    /// Returns `Ok(None)` when the secret is not set.
    fn secret(&self, name: &str) -> Result<Option<Zeroizing<String>>, ConfigError>;

    fn require(&self, name: &str) -> Result<Zeroizing<String>, ConfigError> {
        self.secret(name)?
            .ok_or_else(|| ConfigError::MissingSecret(name.to_string()))
    }
}

/// Reads `{prefix}{NAME}` environment variables, e.g. `BROKER_PRIVATE_KEY`.
#[derive(Debug, Clone)]
pub struct EnvSecretProvider {
    prefix: String,
}

impl EnvSecretProvider {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn variable(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name.to_ascii_uppercase())
    }
}

impl SecretProvider for EnvSecretProvider {
    fn secret(&self, name: &str) -> Result<Option<Zeroizing<String>>, ConfigError> {
        let variable = self.variable(name);
        match std::env::var(&variable) {
            Ok(value) if value.is_empty() => Ok(None),
            Ok(value) => Ok(Some(Zeroizing::new(value))),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(ConfigError::Unreadable {
                name: variable,
                reason: err.to_string(),
            }),
        }
    }
}

/// Reads one file per secret from a directory, as mounted by most secret stores
/// (`/run/secrets/private_key`). A single trailing newline is dropped.
#[derive(Debug, Clone)]
pub struct DirSecretProvider {
    dir: PathBuf,
}

impl DirSecretProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SecretProvider for DirSecretProvider {
    fn secret(&self, name: &str) -> Result<Option<Zeroizing<String>>, ConfigError> {
        let path = self.dir.join(name);
        match std::fs::read_to_string(&path) {
            Ok(mut value) => {
                if value.ends_with('\n') {
                    value.pop();
                    if value.ends_with('\r') {
                        value.pop();
                    }
                }
                Ok(Some(Zeroizing::new(value)))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ConfigError::Unreadable {
                name: path.display().to_string(),
                reason: err.to_string(),
            }),
        }
    }
}

/// In-memory secrets, for embedding the broker behind another secret store.
#[derive(Default)]
pub struct MapSecretProvider {
    values: HashMap<String, Zeroizing<String>>,
}

impl MapSecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(name.into(), Zeroizing::new(value.into()));
    }
}

impl SecretProvider for MapSecretProvider {
    fn secret(&self, name: &str) -> Result<Option<Zeroizing<String>>, ConfigError> {
        Ok(self.values.get(name).cloned())
    }
}
