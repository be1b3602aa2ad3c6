//! Error types for keyring operations

use thiserror::Error;

/// Errors from keyring construction and rotation.
///
/// Every variant is a precondition violation. The keyring never retries and
/// never partially applies a failed operation, so the caller can pick a
/// different input and try again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyringError {
    /// Keyring was configured with keys but without a primary key
    #[error("invalid keyring config: {reason}")]
    InvalidConfig {
        /// What was wrong with the configuration
        reason: String,
    },

    /// Key material is not the required length
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Required key length
        expected: usize,
        /// Length of the rejected key
        actual: usize,
    },

    /// Requested key is not installed on the ring
    #[error("requested key is not in the keyring")]
    KeyNotFound,

    /// Attempted to remove the primary key
    #[error("removing the active key is not allowed")]
    CannotRemoveActiveKey,

    /// Configured key string could not be decoded
    #[error("invalid key encoding: {reason}")]
    InvalidKeyEncoding {
        /// Decoder failure
        reason: String,
    },
}
