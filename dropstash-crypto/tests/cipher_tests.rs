use dropstash_crypto::{
    decrypt, decrypt_if_key_present, encrypt, encrypt_if_key_present, looks_encrypted,
    safe_decrypt, CryptoError, EncryptionKey, MIN_ENVELOPE_SIZE, NONCE_SIZE, TAG_SIZE,
};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

// ── Round-trip ───────────────────────────────────────────────────

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = EncryptionKey::generate();
    let plaintext = b"the quick brown fox";

    let envelope = encrypt(&key, plaintext).unwrap();
    let recovered = decrypt(&key, &envelope).unwrap();

    assert_eq!(recovered, plaintext);
}

#[test]
fn empty_payload_roundtrips() {
    let key = EncryptionKey::generate();
    let envelope = encrypt(&key, b"").unwrap();
    assert_eq!(envelope.len(), MIN_ENVELOPE_SIZE);
    assert_eq!(decrypt(&key, &envelope).unwrap(), b"");
}

#[test]
fn envelope_layout_is_nonce_ciphertext_tag() {
    let key = EncryptionKey::generate();
    let plaintext = b"payload";
    let envelope = encrypt(&key, plaintext).unwrap();
    assert_eq!(envelope.len(), NONCE_SIZE + plaintext.len() + TAG_SIZE);
}

#[test]
fn each_encryption_uses_a_fresh_nonce() {
    let key = EncryptionKey::generate();
    let env1 = encrypt(&key, b"same payload").unwrap();
    let env2 = encrypt(&key, b"same payload").unwrap();

    assert_ne!(env1[..NONCE_SIZE], env2[..NONCE_SIZE]);
    assert_ne!(env1, env2);

    // Both still decrypt to the same plaintext
    assert_eq!(decrypt(&key, &env1).unwrap(), b"same payload");
    assert_eq!(decrypt(&key, &env2).unwrap(), b"same payload");
}

// ── Tamper detection ─────────────────────────────────────────────

#[test]
fn tampered_ciphertext_fails_authentication() {
    let key = EncryptionKey::generate();
    let mut envelope = encrypt(&key, b"sensitive bytes").unwrap();
    envelope[NONCE_SIZE] ^= 0x01;

    let result = decrypt(&key, &envelope);
    assert!(matches!(result, Err(CryptoError::AuthenticationFailed)));
}

#[test]
fn tampered_tag_fails_authentication() {
    let key = EncryptionKey::generate();
    let mut envelope = encrypt(&key, b"sensitive bytes").unwrap();
    let last = envelope.len() - 1;
    envelope[last] ^= 0x80;

    let result = decrypt(&key, &envelope);
    assert!(matches!(result, Err(CryptoError::AuthenticationFailed)));
}

#[test]
fn tampered_nonce_fails_authentication() {
    let key = EncryptionKey::generate();
    let mut envelope = encrypt(&key, b"sensitive bytes").unwrap();
    envelope[0] ^= 0xff;

    let result = decrypt(&key, &envelope);
    assert!(matches!(result, Err(CryptoError::AuthenticationFailed)));
}

#[test]
fn wrong_key_fails_authentication() {
    let envelope = encrypt(&EncryptionKey::generate(), b"for your eyes only").unwrap();
    let result = decrypt(&EncryptionKey::generate(), &envelope);
    assert!(matches!(result, Err(CryptoError::AuthenticationFailed)));
}

#[test]
fn undersized_envelope_is_rejected() {
    let key = EncryptionKey::generate();
    let result = decrypt(&key, &[0u8; MIN_ENVELOPE_SIZE - 1]);
    assert!(matches!(result, Err(CryptoError::TooShort(27))));
}

// ── Key loading ──────────────────────────────────────────────────

#[test]
fn key_base64_roundtrip() {
    let key = EncryptionKey::generate();
    let encoded = key.to_base64();
    let reloaded = EncryptionKey::from_base64(&encoded).unwrap();

    let envelope = encrypt(&key, b"cross-key check").unwrap();
    assert_eq!(decrypt(&reloaded, &envelope).unwrap(), b"cross-key check");
}

#[test]
fn wrong_length_key_material_is_rejected() {
    let short = STANDARD.encode([0u8; 16]);
    let result = EncryptionKey::from_base64(&short);
    assert!(matches!(result, Err(CryptoError::InvalidKey(16))));

    let long = STANDARD.encode([0u8; 48]);
    assert!(matches!(
        EncryptionKey::from_base64(&long),
        Err(CryptoError::InvalidKey(48))
    ));
}

#[test]
fn malformed_base64_key_is_rejected() {
    assert!(matches!(
        EncryptionKey::from_base64("not base64!!!"),
        Err(CryptoError::KeyDecode(_))
    ));
    assert!(matches!(
        EncryptionKey::from_base64(""),
        Err(CryptoError::KeyDecode(_))
    ));
}

// ── Legacy classification ────────────────────────────────────────

#[test]
fn short_data_never_classifies_as_encrypted() {
    assert!(!looks_encrypted(b""));
    assert!(!looks_encrypted(&[0xffu8; MIN_ENVELOPE_SIZE - 1]));
}

#[test]
fn magic_bytes_exempt_known_formats() {
    let mut pdf = b"%PDF".to_vec();
    pdf.extend_from_slice(&[0xa7u8; 200]);
    assert!(!looks_encrypted(&pdf));

    let mut png = b"\x89PNG".to_vec();
    png.extend_from_slice(&[0x01u8; 64]);
    assert!(!looks_encrypted(&png));

    let mut zip = b"PK\x03\x04".to_vec();
    zip.extend_from_slice(&[0xeeu8; 64]);
    assert!(!looks_encrypted(&zip));
}

#[test]
fn printable_utf8_classifies_as_plaintext() {
    let text = b"hello world, this is an ordinary text file payload";
    assert!(!looks_encrypted(text));

    let with_newlines = b"line one\nline two\r\n\tindented line three padding";
    assert!(!looks_encrypted(with_newlines));
}

#[test]
fn binary_non_magic_data_classifies_as_encrypted() {
    // NUL bytes are valid UTF-8 but not printable
    assert!(looks_encrypted(&[0u8; 64]));

    let envelope = encrypt(&EncryptionKey::generate(), &[0u8; 64]).unwrap();
    assert!(looks_encrypted(&envelope));
}

// ── safe_decrypt fallback ────────────────────────────────────────

#[test]
fn safe_decrypt_recovers_encrypted_payload() {
    let key = EncryptionKey::generate();
    let envelope = encrypt(&key, &[0u8; 64]).unwrap();

    let (recovered, was_encrypted) = safe_decrypt(&key, &envelope);
    assert!(was_encrypted);
    assert_eq!(recovered, [0u8; 64]);
}

#[test]
fn safe_decrypt_passes_legacy_text_through() {
    let key = EncryptionKey::generate();
    let legacy = b"plain legacy text object, well over 28 bytes long";

    let (recovered, was_encrypted) = safe_decrypt(&key, legacy);
    assert!(!was_encrypted);
    assert_eq!(recovered, legacy);
}

#[test]
fn safe_decrypt_falls_back_on_wrong_key() {
    // Binary payload encrypted under a different key: classifies as
    // encrypted, fails authentication, and is returned untouched.
    let envelope = encrypt(&EncryptionKey::generate(), &[0u8; 64]).unwrap();

    let (recovered, was_encrypted) = safe_decrypt(&EncryptionKey::generate(), &envelope);
    assert!(!was_encrypted);
    assert_eq!(recovered, envelope);
}

#[test]
fn safe_decrypt_passes_magic_byte_files_through() {
    let key = EncryptionKey::generate();
    let mut gif = b"GIF89a".to_vec();
    gif.extend_from_slice(&[0x9cu8; 128]);

    let (recovered, was_encrypted) = safe_decrypt(&key, &gif);
    assert!(!was_encrypted);
    assert_eq!(recovered, gif);
}

// ── Plaintext mode ───────────────────────────────────────────────

#[test]
fn no_key_means_passthrough_both_ways() {
    let data = b"stored without encryption";
    let stored = encrypt_if_key_present(None, data).unwrap();
    assert_eq!(stored, data);
    assert_eq!(decrypt_if_key_present(None, &stored), data);
}

#[test]
fn key_present_is_transparent_to_the_caller() {
    let key = EncryptionKey::generate();
    let data = vec![0x42u8; 512];

    let stored = encrypt_if_key_present(Some(&key), &data).unwrap();
    assert_ne!(stored, data);
    assert_eq!(decrypt_if_key_present(Some(&key), &stored), data);
}

#[test]
fn plaintext_written_before_key_stays_readable() {
    // Text object saved while no key was configured...
    let legacy = encrypt_if_key_present(None, b"notes from before encryption rollout").unwrap();

    // ...remains readable after a key is introduced, via the fallback.
    let key = EncryptionKey::generate();
    assert_eq!(
        decrypt_if_key_present(Some(&key), &legacy),
        b"notes from before encryption rollout"
    );
}

// Property-based tests
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn encrypt_decrypt_always_roundtrips(payload in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let key = EncryptionKey::generate();
            let envelope = encrypt(&key, &payload).unwrap();
            prop_assert_eq!(decrypt(&key, &envelope).unwrap(), payload);
        }

        #[test]
        fn safe_decrypt_of_envelope_recovers_payload(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let key = EncryptionKey::generate();
            let envelope = encrypt(&key, &payload).unwrap();
            let (recovered, _) = safe_decrypt(&key, &envelope);
            // Tiny envelopes can be misclassified as printable plaintext;
            // either verdict must hand back usable bytes.
            prop_assert!(recovered == payload || recovered == envelope);
        }
    }
}
