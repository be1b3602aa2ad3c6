//! Fixed-size symmetric key material
//!
//! # Security Properties
//!
//! - Size: a `SecretKey` is always exactly [`KEY_SIZE`] bytes
//! - Disposal: key bytes are zeroized when the key is dropped
//! - Comparison: equality checks run in constant time
//! - Redaction: `Debug` output never contains key bytes

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::KeyringError;

/// Size of every key on the ring (128-bit symmetric cipher key).
pub const KEY_SIZE: usize = 16;

/// A single symmetric key installed on a [`Keyring`](crate::Keyring).
///
/// The keyring hands out clones of its keys; each clone zeroizes its own
/// copy of the material when dropped.
#[derive(Clone)]
pub struct SecretKey {
    bytes: [u8; KEY_SIZE],
}

impl SecretKey {
    /// Wrap an array of key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Copy key bytes out of a slice.
    ///
    /// # Errors
    ///
    /// - `KeyringError::InvalidKeySize` if `bytes` is not exactly
    ///   [`KEY_SIZE`] long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyringError> {
        let bytes: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| KeyringError::InvalidKeySize { expected: KEY_SIZE, actual: bytes.len() })?;
        Ok(Self { bytes })
    }

    /// Raw key bytes for the cipher.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Constant-time comparison against caller-supplied bytes.
    ///
    /// Slices of the wrong length never match.
    pub fn matches(&self, other: &[u8]) -> bool {
        self.bytes[..].ct_eq(other).into()
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes[..].ct_eq(&other.bytes[..]).into()
    }
}

impl Eq for SecretKey {}

impl AsRef<[u8]> for SecretKey {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<[u8; KEY_SIZE]> for SecretKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl TryFrom<&[u8]> for SecretKey {
    type Error = KeyringError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

// Implement Drop to zeroize key material
impl Drop for SecretKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}
