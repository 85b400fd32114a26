//! AES-256-GCM authenticated encryption.
//!
//! Two layers live here:
//!
//! - **Key-based**: `encrypt_with_key` / `decrypt_with_key` take a 32-byte
//!   key and produce `[ 12-byte nonce | ciphertext + 16-byte tag ]`.
//! - **Password-based envelope**: `encrypt` / `decrypt` derive a key from a
//!   password and a fresh salt and produce
//!   `[ 32-byte salt | 12-byte nonce | ciphertext + 16-byte tag ]`.
//!
//! A wrong key or password is reported as `CryptoError::DecryptionFailed`;
//! the GCM tag means tampering is never mistaken for valid plaintext.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use super::kdf::{derive_key, generate_salt, DEFAULT_ITERATIONS, KEY_LEN, SALT_LEN};
use crate::errors::{CryptoError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` with a 32-byte `key`.
///
/// Returns the nonce prepended to the ciphertext (nonce || ciphertext).
pub fn encrypt_with_key(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    // Anything but 32 bytes is rejected here.
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CryptoError::EncryptionFailed(format!("invalid key length: {e}")))?;

    // Fresh random nonce per message; never reused under one key.
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(format!("encryption error: {e}")))?;

    // nonce || ciphertext+tag
    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data that was produced by `encrypt_with_key`.
pub fn decrypt_with_key(key: &[u8], ciphertext_with_nonce: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    // Even an empty plaintext carries a nonce and a tag.
    if ciphertext_with_nonce.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::MalformedInput(format!(
            "need at least {} bytes, got {}",
            NONCE_LEN + TAG_LEN,
            ciphertext_with_nonce.len()
        ))
        .into());
    }

    let (nonce_bytes, ciphertext) = ciphertext_with_nonce.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::DecryptionFailed)?;

    // Tag check and decryption in one step; a bad key looks like tampering.
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)?;

    Ok(Zeroizing::new(plaintext))
}

/// Prefix `salt` to a key-based ciphertext: `salt || nonce || ciphertext`.
pub fn seal_envelope(key: &[u8], salt: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let body = encrypt_with_key(key, plaintext)?;
    let mut output = Vec::with_capacity(salt.len() + body.len());
    output.extend_from_slice(salt);
    output.extend_from_slice(&body);
    Ok(output)
}

/// Split an envelope into its salt and `nonce || ciphertext` parts.
///
/// Fails with `CryptoError::MalformedInput` when the blob cannot even
/// hold a salt and a nonce.
pub fn split_envelope(blob: &[u8]) -> Result<(&[u8], &[u8])> {
    if blob.len() < SALT_LEN + NONCE_LEN {
        return Err(CryptoError::MalformedInput(format!(
            "envelope is {} bytes, shorter than salt + nonce ({})",
            blob.len(),
            SALT_LEN + NONCE_LEN
        ))
        .into());
    }
    Ok(blob.split_at(SALT_LEN))
}

/// Encrypt `plaintext` under `password` with the default iteration count.
pub fn encrypt(plaintext: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    encrypt_with_iterations(plaintext, password, DEFAULT_ITERATIONS)
}

/// Decrypt an envelope produced by `encrypt`.
pub fn decrypt(blob: &[u8], password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    decrypt_with_iterations(blob, password, DEFAULT_ITERATIONS)
}

/// Encrypt with a fresh salt and nonce, deriving the key with `iterations`.
pub fn encrypt_with_iterations(
    plaintext: &[u8],
    password: &[u8],
    iterations: u32,
) -> Result<Vec<u8>> {
    let salt = generate_salt(SALT_LEN);
    let key = derive_key(password, &salt, iterations, KEY_LEN)?;
    // The salt travels in the clear so decrypt can re-derive the key.
    seal_envelope(&key, &salt, plaintext)
}

/// Decrypt an envelope whose key was derived with `iterations`.
pub fn decrypt_with_iterations(
    blob: &[u8],
    password: &[u8],
    iterations: u32,
) -> Result<Zeroizing<Vec<u8>>> {
    let (salt, body) = split_envelope(blob)?;
    let key = derive_key(password, salt, iterations, KEY_LEN)?;
    decrypt_with_key(&key, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::MIN_ITERATIONS;
    use crate::errors::CredVaultError;

    #[test]
    fn envelope_layout_is_salt_nonce_ciphertext() {
        let blob = encrypt_with_iterations(b"abc", b"pw", MIN_ITERATIONS).unwrap();
        assert_eq!(blob.len(), SALT_LEN + NONCE_LEN + 3 + TAG_LEN);
    }

    #[test]
    fn short_envelope_is_malformed() {
        let err = decrypt_with_iterations(&[0u8; SALT_LEN + NONCE_LEN - 1], b"pw", MIN_ITERATIONS)
            .unwrap_err();
        assert!(matches!(
            err,
            CredVaultError::Crypto(CryptoError::MalformedInput(_))
        ));
    }

    #[test]
    fn wrong_password_is_rejected_not_garbled() {
        let blob = encrypt_with_iterations(b"secret", b"right", MIN_ITERATIONS).unwrap();
        let err = decrypt_with_iterations(&blob, b"wrong", MIN_ITERATIONS).unwrap_err();
        assert!(matches!(
            err,
            CredVaultError::Crypto(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = [3u8; KEY_LEN];
        let ct = encrypt_with_key(&key, b"").unwrap();
        assert!(decrypt_with_key(&key, &ct).unwrap().is_empty());
    }
}
