//! Integration tests for the CredVault crypto module.

use credvault::crypto::encryption::{
    decrypt_with_iterations, encrypt_with_iterations, NONCE_LEN, TAG_LEN,
};
use credvault::crypto::kdf::{KEY_LEN, MIN_ITERATIONS, MIN_SALT_LEN, SALT_LEN};
use credvault::crypto::{
    constant_time_equals, decrypt_with_key, derive_key, encrypt_with_key, generate_salt, MasterKey,
};
use credvault::errors::{CredVaultError, CryptoError};

// ---------------------------------------------------------------------------
// Key-based encryption
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = [0xABu8; 32];
    let plaintext = b"{\"items\":[]}";

    let ciphertext = encrypt_with_key(&key, plaintext).expect("encrypt should succeed");

    // 12-byte nonce + ciphertext + 16-byte tag.
    assert_eq!(ciphertext.len(), NONCE_LEN + plaintext.len() + TAG_LEN);

    let recovered = decrypt_with_key(&key, &ciphertext).expect("decrypt should succeed");
    assert_eq!(recovered.as_slice(), plaintext);
}

#[test]
fn encrypt_produces_different_ciphertext_each_time() {
    let key = [0xCDu8; 32];
    let ct1 = encrypt_with_key(&key, b"same").expect("encrypt 1");
    let ct2 = encrypt_with_key(&key, b"same").expect("encrypt 2");
    assert_ne!(ct1, ct2, "fresh nonces must make ciphertexts differ");
}

#[test]
fn decrypt_with_wrong_key_fails() {
    let ciphertext = encrypt_with_key(&[0x11u8; 32], b"top secret").expect("encrypt");
    let err = decrypt_with_key(&[0x22u8; 32], &ciphertext).unwrap_err();
    assert!(matches!(
        err,
        CredVaultError::Crypto(CryptoError::DecryptionFailed)
    ));
}

#[test]
fn decrypt_with_truncated_data_fails() {
    let result = decrypt_with_key(&[0xAAu8; 32], &[0u8; 5]);
    assert!(result.is_err(), "truncated ciphertext must fail");
}

#[test]
fn ciphertext_is_nonce_then_sealed_body() {
    let key = [0x5Au8; 32];
    let empty = encrypt_with_key(&key, b"").expect("encrypt");
    assert_eq!(empty.len(), NONCE_LEN + TAG_LEN);
    assert!(decrypt_with_key(&key, &empty).expect("decrypt").is_empty());

    let sealed = encrypt_with_key(&key, b"abc").expect("encrypt");
    assert_eq!(sealed.len(), NONCE_LEN + 3 + TAG_LEN);

    let err = decrypt_with_key(&key, &sealed[..NONCE_LEN + TAG_LEN - 1]).unwrap_err();
    assert!(matches!(
        err,
        CredVaultError::Crypto(CryptoError::MalformedInput(_))
    ));
}

#[test]
fn encrypt_rejects_keys_of_the_wrong_size() {
    let err = encrypt_with_key(&[0u8; 16], b"x").unwrap_err();
    assert!(matches!(
        err,
        CredVaultError::Crypto(CryptoError::EncryptionFailed(_))
    ));
}

#[test]
fn decrypt_with_corrupted_ciphertext_fails() {
    let key = [0xBBu8; 32];
    let mut ciphertext = encrypt_with_key(&key, b"VALUE=abc").expect("encrypt");
    ciphertext[NONCE_LEN + 1] ^= 0xFF;
    assert!(decrypt_with_key(&key, &ciphertext).is_err());
}

// ---------------------------------------------------------------------------
// Password envelope
// ---------------------------------------------------------------------------

#[test]
fn password_envelope_roundtrip() {
    let blob = encrypt_with_iterations(b"hello", b"pw", MIN_ITERATIONS).expect("encrypt");
    assert_eq!(blob.len(), SALT_LEN + NONCE_LEN + 5 + TAG_LEN);

    let plain = decrypt_with_iterations(&blob, b"pw", MIN_ITERATIONS).expect("decrypt");
    assert_eq!(plain.as_slice(), b"hello");
}

#[test]
fn password_envelope_rejects_wrong_password() {
    let blob = encrypt_with_iterations(b"hello", b"right", MIN_ITERATIONS).expect("encrypt");
    assert!(decrypt_with_iterations(&blob, b"wrong", MIN_ITERATIONS).is_err());
}

// ---------------------------------------------------------------------------
// Key derivation (PBKDF2)
// ---------------------------------------------------------------------------

#[test]
fn derive_key_is_deterministic() {
    let salt = [7u8; SALT_LEN];
    let k1 = derive_key(b"password", &salt, MIN_ITERATIONS, KEY_LEN).unwrap();
    let k2 = derive_key(b"password", &salt, MIN_ITERATIONS, KEY_LEN).unwrap();
    assert_eq!(*k1, *k2);
    assert_eq!(k1.len(), KEY_LEN);
}

#[test]
fn derive_key_differs_by_salt_and_password() {
    let a = derive_key(b"password", &[1u8; 16], MIN_ITERATIONS, KEY_LEN).unwrap();
    let b = derive_key(b"password", &[2u8; 16], MIN_ITERATIONS, KEY_LEN).unwrap();
    let c = derive_key(b"Password", &[1u8; 16], MIN_ITERATIONS, KEY_LEN).unwrap();
    assert_ne!(*a, *b);
    assert_ne!(*a, *c);
}

#[test]
fn derive_key_longer_than_one_block_extends_the_first() {
    let salt = [9u8; 16];
    let short = derive_key(b"pw", &salt, MIN_ITERATIONS, 32).unwrap();
    let long = derive_key(b"pw", &salt, MIN_ITERATIONS, 64).unwrap();
    assert_eq!(&long[..32], short.as_slice());
}

#[test]
fn derive_key_rejects_weak_parameters() {
    let short_salt = vec![0u8; MIN_SALT_LEN - 1];
    let weak = |r: credvault::errors::Result<_>| {
        matches!(r, Err(CredVaultError::Crypto(CryptoError::WeakParameters(_))))
    };

    assert!(weak(derive_key(b"pw", &short_salt, MIN_ITERATIONS, 32)));
    assert!(weak(derive_key(b"pw", &[0u8; 16], MIN_ITERATIONS - 1, 32)));
    assert!(weak(derive_key(b"pw", &[0u8; 16], MIN_ITERATIONS, 15)));
}

#[test]
fn generate_salt_has_requested_length_and_varies() {
    let a = generate_salt(SALT_LEN);
    let b = generate_salt(SALT_LEN);
    assert_eq!(a.len(), SALT_LEN);
    assert_ne!(a, b);
}

// ---------------------------------------------------------------------------
// Master key
// ---------------------------------------------------------------------------

#[test]
fn master_key_verifier_matches_only_same_password() {
    let salt = generate_salt(SALT_LEN);
    let key = MasterKey::derive(b"correct horse", &salt, MIN_ITERATIONS).unwrap();
    let verifier = key.verifier().unwrap();

    let again = MasterKey::derive(b"correct horse", &salt, MIN_ITERATIONS).unwrap();
    let other = MasterKey::derive(b"battery staple", &salt, MIN_ITERATIONS).unwrap();
    assert!(again.matches_verifier(&verifier).unwrap());
    assert!(!other.matches_verifier(&verifier).unwrap());
}

#[test]
fn entry_key_and_verifier_are_distinct_from_master() {
    let salt = generate_salt(SALT_LEN);
    let key = MasterKey::derive(b"pw", &salt, MIN_ITERATIONS).unwrap();
    let entry_key = key.entry_key().unwrap();
    let verifier = key.verifier().unwrap();

    assert!(!constant_time_equals(key.as_bytes(), entry_key.as_bytes()));
    assert!(!constant_time_equals(key.as_bytes(), &verifier));
    assert!(!constant_time_equals(entry_key.as_bytes(), &verifier));
}
