//! AES-256-GCM codec with legacy-plaintext detection.

use crate::error::{CryptoError, CryptoResult};
use crate::key::EncryptionKey;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};

/// 96 bits, the recommended GCM nonce size.
pub const NONCE_SIZE: usize = 12;
/// GCM authentication tag size.
pub const TAG_SIZE: usize = 16;
/// Smallest possible envelope: a nonce plus the tag of an empty ciphertext.
pub const MIN_ENVELOPE_SIZE: usize = NONCE_SIZE + TAG_SIZE;

/// Magic prefixes of known plaintext file formats (PDF, PNG, JPEG, GIF,
/// ZIP, ar archive). Anything starting with one of these predates
/// encryption and is served as-is.
const FILE_SIGNATURES: &[&[u8]] = &[
    b"%PDF",
    b"\x89PNG",
    b"\xff\xd8\xff",
    b"GIF87a",
    b"GIF89a",
    b"PK\x03\x04",
    b"!<arch>",
];

/// How much of a payload the UTF-8 plaintext check samples.
const TEXT_SAMPLE_SIZE: usize = 1024;
/// How many leading bytes must be printable for the plaintext verdict.
const PRINTABLE_PREFIX_LEN: usize = 100;

/// Encrypts a payload, producing `nonce ‖ ciphertext ‖ tag`.
///
/// The nonce is drawn fresh from the OS random source on every call.
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut envelope = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    envelope.extend_from_slice(nonce.as_slice());
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Decrypts an envelope produced by [`encrypt`], verifying the auth tag.
///
/// Fails with [`CryptoError::TooShort`] for undersized envelopes and
/// [`CryptoError::AuthenticationFailed`] when the tag does not verify
/// (wrong key or corrupted/tampered data).
pub fn decrypt(key: &EncryptionKey, envelope: &[u8]) -> CryptoResult<Vec<u8>> {
    if envelope.len() < MIN_ENVELOPE_SIZE {
        return Err(CryptoError::TooShort(envelope.len()));
    }

    let (nonce, ciphertext) = envelope.split_at(NONCE_SIZE);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

/// Heuristic classifier for the legacy read path.
///
/// Returns false ("treat as plaintext") when the payload is too short to
/// be an envelope, starts with a known plaintext file signature, or its
/// prefix reads as printable UTF-8 text. Otherwise true.
///
/// This is deliberately not a format parser. A small encrypted blob whose
/// leading bytes happen to decode as printable UTF-8 is misclassified as
/// plaintext without a decryption attempt, and [`safe_decrypt`] tolerates
/// the reverse case by falling back to the raw bytes.
pub fn looks_encrypted(data: &[u8]) -> bool {
    if data.len() < MIN_ENVELOPE_SIZE {
        return false;
    }

    if FILE_SIGNATURES.iter().any(|sig| data.starts_with(sig)) {
        return false;
    }

    // Sample at most 1 KiB. A multi-byte sequence cut at the sample
    // boundary fails the UTF-8 check and the payload stays classified as
    // encrypted.
    let sample = &data[..data.len().min(TEXT_SAMPLE_SIZE)];
    if std::str::from_utf8(sample).is_ok() {
        let prefix = &sample[..sample.len().min(PRINTABLE_PREFIX_LEN)];
        if prefix
            .iter()
            .all(|&b| b >= 0x20 || matches!(b, 0x09 | 0x0a | 0x0d))
        {
            return false;
        }
    }

    true
}

/// Decrypts when the payload classifies as encrypted, passing legacy
/// plaintext through untouched.
///
/// Returns the payload bytes and whether they were actually encrypted.
/// Never fails: an envelope that does not authenticate is treated as
/// legacy data that merely resembled ciphertext.
pub fn safe_decrypt(key: &EncryptionKey, data: &[u8]) -> (Vec<u8>, bool) {
    if !looks_encrypted(data) {
        return (data.to_vec(), false);
    }

    match decrypt(key, data) {
        Ok(plaintext) => (plaintext, true),
        Err(_) => (data.to_vec(), false),
    }
}

/// Encrypts only when a key is configured; plaintext mode otherwise.
pub fn encrypt_if_key_present(
    key: Option<&EncryptionKey>,
    data: &[u8],
) -> CryptoResult<Vec<u8>> {
    match key {
        Some(key) => encrypt(key, data),
        None => Ok(data.to_vec()),
    }
}

/// Mirror of [`encrypt_if_key_present`] for the read path.
pub fn decrypt_if_key_present(key: Option<&EncryptionKey>, data: &[u8]) -> Vec<u8> {
    match key {
        Some(key) => safe_decrypt(key, data).0,
        None => data.to_vec(),
    }
}
