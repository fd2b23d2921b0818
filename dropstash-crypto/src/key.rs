//! Process-wide encryption key.
//!
//! The key is loaded once at startup from an externally supplied base64
//! string and stays immutable for the process lifetime. A process without
//! a key runs in plaintext mode; that decision belongs to the embedding
//! layer, which holds an `Option<EncryptionKey>`.

use crate::error::{CryptoError, CryptoResult};
use aes_gcm::aead::{KeyInit, OsRng};
use aes_gcm::Aes256Gcm;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// 256 bits for AES-256.
pub const KEY_SIZE: usize = 32;

/// A 256-bit at-rest encryption key, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Decodes a key from its base64 transport form.
    ///
    /// Fails with [`CryptoError::KeyDecode`] on malformed base64 and
    /// [`CryptoError::InvalidKey`] when the decoded material is not
    /// exactly 32 bytes.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        if encoded.is_empty() {
            return Err(CryptoError::KeyDecode("encryption key is empty".into()));
        }
        let raw = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::KeyDecode(e.to_string()))?;
        let len = raw.len();
        let bytes: [u8; KEY_SIZE] = raw.try_into().map_err(|_| CryptoError::InvalidKey(len))?;
        Ok(Self(bytes))
    }

    /// Generates a fresh random key from the OS entropy source.
    pub fn generate() -> Self {
        Self(Aes256Gcm::generate_key(OsRng).into())
    }

    /// Base64 form for operator handover (e.g. writing into an env file).
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}
