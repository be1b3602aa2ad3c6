//! Fuzz target for keyring rotation sequences
//!
//! Drives a keyring through arbitrary add/use/remove sequences, including
//! keys of the wrong size and keys that were never installed.
//!
//! # Strategy
//!
//! - Keys drawn from a small pool so operations collide with installed keys
//! - Arbitrary byte strings for size validation (empty, short, long)
//! - Construction from arbitrary initial key sets and primaries
//!
//! # Invariants
//!
//! - Ring is empty or `keys()[0] == primary_key()`
//! - No two installed keys are byte-equal
//! - Every installed key is exactly `KEY_SIZE` bytes
//! - Failed operations leave the ring unchanged
//! - Removing the primary always fails
//! - NEVER panic on any input

#![no_main]

use arbitrary::Arbitrary;
use gossip_keyring::{KEY_SIZE, Keyring, KeyringError};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct RotationScenario {
    /// Initial secondary keys
    initial_keys: Vec<KeyInput>,
    /// Initial primary (None means empty primary)
    primary: Option<KeyInput>,
    /// Operations to apply after construction
    operations: Vec<KeyringOperation>,
}

#[derive(Debug, Clone, Arbitrary)]
enum KeyInput {
    /// One of a few fixed keys
    Pooled(u8),
    /// Any byte string
    Raw(Vec<u8>),
}

impl KeyInput {
    fn to_bytes(&self) -> Vec<u8> {
        match self {
            KeyInput::Pooled(n) => vec![n % 4; KEY_SIZE],
            KeyInput::Raw(bytes) => bytes.clone(),
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum KeyringOperation {
    Add(KeyInput),
    Use(KeyInput),
    Remove(KeyInput),
    RemovePrimary,
}

fn snapshot(keyring: &Keyring) -> Vec<[u8; KEY_SIZE]> {
    keyring.keys().iter().map(|key| *key.as_bytes()).collect()
}

fn check_invariants(keyring: &Keyring) {
    let keys = snapshot(keyring);
    let primary = keyring.primary_key().map(|key| *key.as_bytes());

    assert_eq!(keys.first().copied(), primary, "primary must be at index 0");
    for (i, key) in keys.iter().enumerate() {
        assert!(!keys[i + 1..].contains(key), "duplicate key in ring");
    }
}

fuzz_target!(|scenario: RotationScenario| {
    let initial: Vec<Vec<u8>> = scenario.initial_keys.iter().map(KeyInput::to_bytes).collect();
    let primary = scenario.primary.as_ref().map(KeyInput::to_bytes).unwrap_or_default();

    let keyring = match Keyring::new(&initial, &primary) {
        Ok(keyring) => keyring,
        Err(KeyringError::InvalidConfig { .. }) => {
            assert!(primary.is_empty(), "only an empty primary is an invalid config");
            return;
        },
        Err(KeyringError::InvalidKeySize { actual, .. }) => {
            assert_ne!(actual, KEY_SIZE);
            return;
        },
        Err(err) => panic!("unexpected construction error: {err}"),
    };

    if primary.is_empty() {
        assert!(keyring.keys().is_empty(), "empty config must disable encryption");
    } else {
        assert_eq!(keyring.primary_key().map(|key| key.as_bytes().to_vec()), Some(primary));
    }
    check_invariants(&keyring);

    for op in scenario.operations {
        let before = snapshot(&keyring);

        let result = match &op {
            KeyringOperation::Add(key) => keyring.add_key(&key.to_bytes()),
            KeyringOperation::Use(key) => keyring.use_key(&key.to_bytes()),
            KeyringOperation::Remove(key) => keyring.remove_key(&key.to_bytes()),
            KeyringOperation::RemovePrimary => match keyring.primary_key() {
                Some(primary) => {
                    let result = keyring.remove_key(primary.as_bytes());
                    assert_eq!(result, Err(KeyringError::CannotRemoveActiveKey));
                    result
                },
                None => Ok(()),
            },
        };

        if result.is_err() {
            assert_eq!(snapshot(&keyring), before, "failed {op:?} mutated the ring");
        }
        if let (KeyringOperation::Use(key), Ok(())) = (&op, &result) {
            assert_eq!(snapshot(&keyring)[0].to_vec(), key.to_bytes());
        }
        check_invariants(&keyring);
    }
});
