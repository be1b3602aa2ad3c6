//! Fuzz target for keyring config decoding
//!
//! Feeds arbitrary JSON and arbitrary key strings through `KeyringConfig`.
//!
//! # Invariants
//!
//! - Malformed JSON, bad base64 and wrong key sizes return errors
//! - A config that builds always yields a ring that upholds its invariants
//! - NEVER panic on any input

#![no_main]

use arbitrary::Arbitrary;
use gossip_keyring::KeyringConfig;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum ConfigInput {
    /// Structured config with arbitrary strings
    Fields { primary_key: Option<String>, keys: Vec<String> },
    /// Arbitrary bytes parsed as JSON
    Json(Vec<u8>),
}

fuzz_target!(|input: ConfigInput| {
    let config = match input {
        ConfigInput::Fields { primary_key, keys } => KeyringConfig { primary_key, keys },
        ConfigInput::Json(bytes) => match serde_json::from_slice::<KeyringConfig>(&bytes) {
            Ok(config) => config,
            Err(_) => return,
        },
    };

    let Ok(keyring) = config.build() else {
        return;
    };

    if config.is_disabled() {
        assert!(!keyring.is_enabled());
    }

    let keys = keyring.keys();
    assert_eq!(keys.first().cloned(), keyring.primary_key());
    for (i, key) in keys.iter().enumerate() {
        assert!(!keys[i + 1..].contains(key));
    }
});
