//! Codec error types.

use thiserror::Error;

/// Result type for codec operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in the encryption codec.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption key must be 32 bytes, got {0}")]
    InvalidKey(usize),

    #[error("authentication failed (wrong key or tampered data)")]
    AuthenticationFailed,

    #[error("encrypted payload too short: {0} bytes")]
    TooShort(usize),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("invalid base64 key: {0}")]
    KeyDecode(String),
}
