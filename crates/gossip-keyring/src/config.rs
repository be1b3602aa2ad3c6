//! Startup configuration for a keyring.
//!
//! Keys are carried as standard base64 strings so the config can live in
//! whatever file format the embedding service already loads with `serde`.
//! This module only decodes; it never touches the filesystem.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{error::KeyringError, key::SecretKey, keyring::Keyring};

/// Keyring configuration
///
/// The default (no keys, no primary) builds an empty ring with encryption
/// disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyringConfig {
    /// Base64 key used to encrypt outgoing messages
    pub primary_key: Option<String>,
    /// Base64 keys accepted for decryption. May repeat the primary.
    pub keys: Vec<String>,
}

impl KeyringConfig {
    /// Config holding only a primary key.
    pub fn with_primary(primary_key: &SecretKey) -> Self {
        Self { primary_key: Some(encode_key(primary_key)), keys: Vec::new() }
    }

    /// True if this config builds an empty ring.
    pub fn is_disabled(&self) -> bool {
        self.primary_key.as_deref().is_none_or(str::is_empty) && self.keys.is_empty()
    }

    /// Decode every key and build the keyring.
    ///
    /// # Errors
    ///
    /// - `KeyringError::InvalidKeyEncoding` if a key is not valid base64
    /// - `KeyringError::InvalidConfig` if keys are listed without a primary
    /// - `KeyringError::InvalidKeySize` if a decoded key is the wrong length
    pub fn build(&self) -> Result<Keyring, KeyringError> {
        let primary_key = match self.primary_key.as_deref() {
            Some(encoded) => decode_key(encoded)?,
            None => Zeroizing::new(Vec::new()),
        };

        let keys: Vec<Zeroizing<Vec<u8>>> =
            self.keys.iter().map(|encoded| decode_key(encoded)).collect::<Result<_, _>>()?;
        let key_refs: Vec<&[u8]> = keys.iter().map(|key| key.as_slice()).collect();

        Keyring::new(&key_refs, &primary_key)
    }
}

/// Encode a key the way [`KeyringConfig`] expects it.
pub fn encode_key(key: &SecretKey) -> String {
    STANDARD.encode(key.as_bytes())
}

fn decode_key(encoded: &str) -> Result<Zeroizing<Vec<u8>>, KeyringError> {
    STANDARD
        .decode(encoded.trim())
        .map(Zeroizing::new)
        .map_err(|err| KeyringError::InvalidKeyEncoding { reason: err.to_string() })
}
