//! Gossip Keyring
//!
//! The set of symmetric keys a gossip/membership node uses to encrypt and
//! decrypt peer-to-peer messages. The keyring holds key material only; the
//! cipher, the transport and the decision of when to rotate all live with
//! the caller.
//!
//! # Key Lifecycle
//!
//! One key is primary and encrypts every outgoing message. Every installed
//! key, primary first, is tried when decrypting. Rotating the cluster key
//! without dropping messages takes three steps, each applied on every node
//! before the next one starts:
//!
//! ```text
//! add_key(new)
//!        │        every node decrypts with old and new
//!        ▼
//! use_key(new)
//!        │        nodes encrypt with new, still decrypt old in-flight messages
//!        ▼
//! remove_key(old)
//!                 old key retired
//! ```
//!
//! An empty keyring means encryption is disabled.
//!
//! # Concurrency
//!
//! Every operation takes the keyring's lock for its whole duration, so the
//! send path, the receive path and rotation control can share one
//! [`Keyring`] without ever seeing a ring that is missing its primary or
//! holds a key twice. Separate calls are not composed into transactions.
//!
//! # Security
//!
//! - Keys are exactly [`KEY_SIZE`] bytes
//! - Key material is zeroized on drop
//! - Key comparisons are constant time
//! - Keys never appear in `Debug` output or logs

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod key;
pub mod keyring;

pub use config::{KeyringConfig, encode_key};
pub use error::KeyringError;
pub use key::{KEY_SIZE, SecretKey};
pub use keyring::Keyring;
