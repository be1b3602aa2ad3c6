//! Ordered keyring with a single primary key.
//!
//! The ring is a deduplicated list of [`SecretKey`]s. Position 0 is the
//! primary: it encrypts every outgoing message and is the first key tried
//! when decrypting. The remaining keys are decryption-only and exist so
//! that messages sealed under a key that was primary moments ago still
//! open while a rotation propagates through the cluster.
//!
//! # Rotation
//!
//! ```text
//! add_key(new)      [old]        -> [old, new]   new accepted for decryption
//! use_key(new)      [old, new]   -> [new, old]   new encrypts, old still decrypts
//! remove_key(old)   [new, old]   -> [new]        old retired
//! ```
//!
//! Each step is atomic, but the steps are separate calls. Coordinating them
//! across nodes (and against other local callers) is up to the caller.

#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{error::KeyringError, key::SecretKey};

/// Thread-safe container for the keys used to encrypt gossip messages.
///
/// An empty ring means encryption is disabled. Share it between the send
/// path, the receive path and rotation control behind an `Arc`.
///
/// # Invariants
///
/// - Every key is exactly [`KEY_SIZE`](crate::KEY_SIZE) bytes
/// - No two keys are byte-equal
/// - If the ring is non-empty, index 0 is the primary key
#[derive(Debug, Default)]
pub struct Keyring {
    keys: Mutex<Vec<SecretKey>>,
}

impl Keyring {
    /// Build a keyring from an initial key set and a primary key.
    ///
    /// With no keys and an empty primary, the ring is empty and encryption is
    /// disabled. Otherwise `primary_key` is installed first and each of
    /// `keys` is added after it. `primary_key` may also appear in `keys`.
    ///
    /// # Errors
    ///
    /// - `KeyringError::InvalidConfig` if `keys` is non-empty but
    ///   `primary_key` is empty
    /// - `KeyringError::InvalidKeySize` if any key is not
    ///   [`KEY_SIZE`](crate::KEY_SIZE) bytes
    pub fn new<K: AsRef<[u8]>>(keys: &[K], primary_key: &[u8]) -> Result<Self, KeyringError> {
        let keyring = Self::disabled();

        if keys.is_empty() && primary_key.is_empty() {
            tracing::debug!("Keyring created without keys, encryption disabled");
            return Ok(keyring);
        }

        if primary_key.is_empty() {
            return Err(KeyringError::InvalidConfig {
                reason: "empty primary key not allowed".to_string(),
            });
        }

        keyring.add_key(primary_key)?;
        for key in keys {
            keyring.add_key(key.as_ref())?;
        }

        tracing::debug!(key_count = keyring.len(), "Keyring created");
        Ok(keyring)
    }

    /// Empty keyring. Encryption stays disabled until a key is added.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Keyring holding only `primary_key`.
    pub fn with_primary(primary_key: SecretKey) -> Self {
        Self { keys: Mutex::new(vec![primary_key]) }
    }

    /// Install a key on the ring, making it available for decryption.
    ///
    /// Adding a key that is already installed does nothing. The first key
    /// added to an empty ring becomes the primary; afterwards the primary is
    /// left alone and new keys go after it.
    ///
    /// # Errors
    ///
    /// - `KeyringError::InvalidKeySize` if `key` is not
    ///   [`KEY_SIZE`](crate::KEY_SIZE) bytes
    pub fn add_key(&self, key: &[u8]) -> Result<(), KeyringError> {
        let key = SecretKey::from_slice(key).inspect_err(|err| {
            tracing::debug!(error = %err, "Rejected key");
        })?;

        let mut keys = self.lock();

        if keys.iter().any(|installed| *installed == key) {
            tracing::debug!(key_count = keys.len(), "Key already installed");
            return Ok(());
        }

        let primary = keys.first().unwrap_or(&key).clone();
        let mut candidates = std::mem::take(&mut *keys);
        candidates.push(key);
        set_keys(&mut keys, candidates, primary);

        tracing::debug!(key_count = keys.len(), "Installed key");
        Ok(())
    }

    /// Make an installed key the primary.
    ///
    /// The primary is the only key used to encrypt, so every peer should have
    /// the key installed before this is called. The previous primary stays on
    /// the ring for decryption.
    ///
    /// # Errors
    ///
    /// - `KeyringError::KeyNotFound` if no installed key equals `key`
    pub fn use_key(&self, key: &[u8]) -> Result<(), KeyringError> {
        let mut keys = self.lock();

        let Some(position) = keys.iter().position(|installed| installed.matches(key)) else {
            tracing::debug!(key_count = keys.len(), "Requested primary is not installed");
            return Err(KeyringError::KeyNotFound);
        };

        let primary = keys[position].clone();
        let candidates = std::mem::take(&mut *keys);
        set_keys(&mut keys, candidates, primary);

        tracing::debug!(key_count = keys.len(), "Changed primary key");
        Ok(())
    }

    /// Drop a key from the ring.
    ///
    /// Removing a key that is not installed does nothing.
    ///
    /// # Errors
    ///
    /// - `KeyringError::CannotRemoveActiveKey` if `key` is the primary
    pub fn remove_key(&self, key: &[u8]) -> Result<(), KeyringError> {
        let mut keys = self.lock();

        let Some(primary) = keys.first().cloned() else {
            tracing::debug!("Keyring is empty, nothing to remove");
            return Ok(());
        };

        if primary.matches(key) {
            tracing::debug!(key_count = keys.len(), "Refused to remove primary key");
            return Err(KeyringError::CannotRemoveActiveKey);
        }

        let Some(position) = keys.iter().position(|installed| installed.matches(key)) else {
            tracing::debug!(key_count = keys.len(), "Key not installed, nothing to remove");
            return Ok(());
        };

        let mut candidates = std::mem::take(&mut *keys);
        candidates.remove(position);
        set_keys(&mut keys, candidates, primary);

        tracing::debug!(key_count = keys.len(), "Removed key");
        Ok(())
    }

    /// Snapshot of every key on the ring, primary first.
    ///
    /// Try them in this order when decrypting.
    pub fn keys(&self) -> Vec<SecretKey> {
        self.lock().clone()
    }

    /// Key at position 0, used for encrypting. `None` if the ring is empty.
    pub fn primary_key(&self) -> Option<SecretKey> {
        self.lock().first().cloned()
    }

    /// Whether messages should be encrypted at all.
    pub fn is_enabled(&self) -> bool {
        !self.is_empty()
    }

    /// Number of installed keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no keys are installed.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Check if `key` is installed.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.lock().iter().any(|installed| installed.matches(key))
    }

    /// The key list is only ever replaced wholesale, so a panic while the
    /// lock was held cannot leave it half-written.
    fn lock(&self) -> MutexGuard<'_, Vec<SecretKey>> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Replace `installed` with `primary` followed by every other candidate, in
/// order.
///
/// Every mutation goes through here so the primary-first, no-duplicates
/// invariant holds after each call.
fn set_keys(installed: &mut Vec<SecretKey>, candidates: Vec<SecretKey>, primary: SecretKey) {
    let others: Vec<SecretKey> = candidates.into_iter().filter(|key| *key != primary).collect();

    let mut keys = Vec::with_capacity(others.len() + 1);
    keys.push(primary);
    keys.extend(others);

    debug_assert!(
        keys.iter().enumerate().all(|(i, key)| keys[i + 1..].iter().all(|other| other != key)),
        "keyring must not contain duplicate keys"
    );

    *installed = keys;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEY_SIZE;

    const K1: [u8; KEY_SIZE] = [1; KEY_SIZE];
    const K2: [u8; KEY_SIZE] = [2; KEY_SIZE];
    const K3: [u8; KEY_SIZE] = [3; KEY_SIZE];

    fn ring_bytes(keyring: &Keyring) -> Vec<[u8; KEY_SIZE]> {
        keyring.keys().iter().map(|key| *key.as_bytes()).collect()
    }

    #[test]
    fn empty_config_disables_encryption() {
        let keyring = Keyring::new::<&[u8]>(&[], &[]).unwrap();

        assert!(keyring.keys().is_empty());
        assert!(keyring.primary_key().is_none());
        assert!(!keyring.is_enabled());
    }

    #[test]
    fn keys_without_primary_is_invalid() {
        let result = Keyring::new(&[K1, K2], &[]);

        assert!(matches!(result, Err(KeyringError::InvalidConfig { .. })));
    }

    #[test]
    fn primary_only_config() {
        let keyring = Keyring::new::<&[u8]>(&[], &K1).unwrap();

        assert_eq!(ring_bytes(&keyring), vec![K1]);
        assert_eq!(keyring.primary_key().unwrap().as_bytes(), &K1);
        assert!(keyring.is_enabled());
    }

    #[test]
    fn primary_is_installed_first() {
        let keyring = Keyring::new(&[K2, K3], &K1).unwrap();

        assert_eq!(ring_bytes(&keyring), vec![K1, K2, K3]);
    }

    #[test]
    fn primary_listed_among_keys_is_not_duplicated() {
        let keyring = Keyring::new(&[K2, K1, K3], &K1).unwrap();

        assert_eq!(keyring.primary_key().unwrap().as_bytes(), &K1);
        assert_eq!(keyring.len(), 3);
    }

    #[test]
    fn construction_propagates_key_size_errors() {
        let short = [9u8; 8];
        let result = Keyring::new(&[&K2[..], &short[..]], &K1);

        assert_eq!(result.unwrap_err(), KeyringError::InvalidKeySize { expected: 16, actual: 8 });

        let result = Keyring::new::<&[u8]>(&[], &[1, 2, 3]);
        assert_eq!(result.unwrap_err(), KeyringError::InvalidKeySize { expected: 16, actual: 3 });
    }

    #[test]
    fn add_key_to_empty_ring_becomes_primary() {
        let keyring = Keyring::disabled();
        keyring.add_key(&K2).unwrap();

        assert_eq!(keyring.primary_key().unwrap().as_bytes(), &K2);
    }

    #[test]
    fn add_key_is_idempotent() {
        let keyring = Keyring::new::<&[u8]>(&[], &K1).unwrap();
        keyring.add_key(&K2).unwrap();
        let once = ring_bytes(&keyring);

        keyring.add_key(&K2).unwrap();
        keyring.add_key(&K1).unwrap();

        assert_eq!(ring_bytes(&keyring), once);
    }

    #[test]
    fn add_key_rejects_wrong_size() {
        let keyring = Keyring::new::<&[u8]>(&[], &K1).unwrap();

        let result = keyring.add_key(&[0u8; 32]);

        assert_eq!(result.unwrap_err(), KeyringError::InvalidKeySize { expected: 16, actual: 32 });
        assert_eq!(ring_bytes(&keyring), vec![K1]);
    }

    #[test]
    fn use_key_promotes_and_keeps_old_primary() {
        let keyring = Keyring::new(&[K2, K3], &K1).unwrap();

        keyring.use_key(&K3).unwrap();

        let keys = ring_bytes(&keyring);
        assert_eq!(keys[0], K3);
        assert!(keys[1..].contains(&K1));
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn use_key_unknown_fails_without_change() {
        let keyring = Keyring::new(&[K2], &K1).unwrap();

        assert_eq!(keyring.use_key(&K3).unwrap_err(), KeyringError::KeyNotFound);
        assert_eq!(keyring.use_key(&[1, 2]).unwrap_err(), KeyringError::KeyNotFound);
        assert_eq!(ring_bytes(&keyring), vec![K1, K2]);
    }

    #[test]
    fn use_key_on_current_primary_is_noop() {
        let keyring = Keyring::new(&[K2], &K1).unwrap();

        keyring.use_key(&K1).unwrap();

        assert_eq!(ring_bytes(&keyring), vec![K1, K2]);
    }

    #[test]
    fn remove_primary_fails_without_change() {
        let keyring = Keyring::new(&[K2], &K1).unwrap();

        assert_eq!(keyring.remove_key(&K1).unwrap_err(), KeyringError::CannotRemoveActiveKey);
        assert_eq!(ring_bytes(&keyring), vec![K1, K2]);
    }

    #[test]
    fn remove_absent_key_is_noop() {
        let keyring = Keyring::new(&[K2], &K1).unwrap();

        keyring.remove_key(&K3).unwrap();
        keyring.remove_key(&[7u8; 5]).unwrap();

        assert_eq!(ring_bytes(&keyring), vec![K1, K2]);
    }

    #[test]
    fn remove_from_empty_ring_is_noop() {
        let keyring = Keyring::disabled();

        keyring.remove_key(&K1).unwrap();

        assert!(keyring.is_empty());
    }

    #[test]
    fn remove_secondary_keeps_primary() {
        let keyring = Keyring::new(&[K2, K3], &K1).unwrap();

        keyring.remove_key(&K2).unwrap();

        assert_eq!(ring_bytes(&keyring), vec![K1, K3]);
        assert!(!keyring.contains(&K2));
    }

    #[test]
    fn rotation_scenario() {
        let keyring = Keyring::new::<&[u8]>(&[], &K1).unwrap();
        assert_eq!(ring_bytes(&keyring), vec![K1]);

        keyring.add_key(&K2).unwrap();
        assert_eq!(ring_bytes(&keyring), vec![K1, K2]);

        keyring.use_key(&K2).unwrap();
        assert_eq!(keyring.primary_key().unwrap().as_bytes(), &K2);
        assert_eq!(ring_bytes(&keyring), vec![K2, K1]);

        keyring.remove_key(&K1).unwrap();
        assert_eq!(ring_bytes(&keyring), vec![K2]);

        assert_eq!(keyring.remove_key(&K2).unwrap_err(), KeyringError::CannotRemoveActiveKey);
        assert_eq!(ring_bytes(&keyring), vec![K2]);
    }

    #[test]
    fn snapshot_is_detached_from_ring() {
        let keyring = Keyring::new(&[K2], &K1).unwrap();

        let mut snapshot = keyring.keys();
        snapshot.clear();

        assert_eq!(ring_bytes(&keyring), vec![K1, K2]);
    }

    #[test]
    fn with_primary_holds_single_key() {
        let keyring = Keyring::with_primary(SecretKey::from_bytes(K3));

        assert_eq!(ring_bytes(&keyring), vec![K3]);
    }

    #[test]
    fn set_keys_puts_primary_first_and_dedupes() {
        let mut installed = Vec::new();
        let candidates = vec![SecretKey::from(K1), SecretKey::from(K2), SecretKey::from(K3)];

        set_keys(&mut installed, candidates, SecretKey::from(K2));

        let bytes: Vec<_> = installed.iter().map(|key| *key.as_bytes()).collect();
        assert_eq!(bytes, vec![K2, K1, K3]);
    }
}
