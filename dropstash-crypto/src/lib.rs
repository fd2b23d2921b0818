//! At-rest encryption for dropstash.
//!
//! Provides the codec that protects stored objects:
//! - AES-256-GCM for authenticated encryption
//! - a heuristic classifier for objects written before encryption existed
//! - base64 key loading for startup configuration
//!
//! # Envelope format
//!
//! An encrypted object is stored as `nonce (12 bytes) ‖ ciphertext ‖ auth
//! tag (16 bytes)`. The nonce is freshly random per encryption call and
//! never reused under the same key.
//!
//! # Legacy objects
//!
//! A fleet may contain objects written before encryption was enabled, so
//! the read path cannot assume the envelope format. [`safe_decrypt`]
//! classifies payloads heuristically and degrades to returning the raw
//! bytes rather than corrupting output or surfacing an error.

mod cipher;
mod error;
mod key;

pub use cipher::{
    decrypt, decrypt_if_key_present, encrypt, encrypt_if_key_present, looks_encrypted,
    safe_decrypt, MIN_ENVELOPE_SIZE, NONCE_SIZE, TAG_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{EncryptionKey, KEY_SIZE};
