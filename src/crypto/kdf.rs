//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! PBKDF2 iterates HMAC-SHA256 over the password and salt; keys longer
//! than one hash output are produced by the standard counter-block
//! construction (`T_1 || T_2 || ...`).  Parameters below the enforced
//! minimums are rejected rather than silently accepted.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::errors::{CryptoError, Result};

/// Default salt length in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Minimum accepted salt length in bytes.
pub const MIN_SALT_LEN: usize = 16;

/// Minimum accepted PBKDF2 iteration count.
pub const MIN_ITERATIONS: u32 = 10_000;

/// Iteration count used for new vaults unless configured otherwise.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Length of derived keys used by the vault (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Shortest key `derive_key` will produce.
const MIN_KEY_LEN: usize = 16;

/// Derive `key_length` bytes from a password and salt.
///
/// The same password + salt + iterations + length always produce the
/// same key.  Fails with `CryptoError::WeakParameters` when the salt is
/// shorter than 16 bytes, fewer than 10 000 iterations are requested, or
/// the key would be shorter than 16 bytes.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    key_length: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    check_params(salt, iterations)?;
    if key_length < MIN_KEY_LEN {
        return Err(CryptoError::WeakParameters(format!(
            "key length must be at least {MIN_KEY_LEN} bytes (got {key_length})"
        ))
        .into());
    }

    let mut key = Zeroizing::new(vec![0u8; key_length]);
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    Ok(key)
}

/// Derive a fixed 32-byte master key.
pub fn derive_master_key(password: &[u8], salt: &[u8], iterations: u32) -> Result<[u8; KEY_LEN]> {
    check_params(salt, iterations)?;

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    Ok(key)
}

fn check_params(salt: &[u8], iterations: u32) -> Result<()> {
    if salt.len() < MIN_SALT_LEN {
        return Err(CryptoError::WeakParameters(format!(
            "salt must be at least {MIN_SALT_LEN} bytes (got {})",
            salt.len()
        ))
        .into());
    }
    if iterations < MIN_ITERATIONS {
        return Err(CryptoError::WeakParameters(format!(
            "iterations must be at least {MIN_ITERATIONS} (got {iterations})"
        ))
        .into());
    }
    Ok(())
}

/// Generate a cryptographically random salt of `length` bytes.
pub fn generate_salt(length: usize) -> Vec<u8> {
    random_bytes(length)
}

/// Fill a fresh buffer of `n` bytes from the thread-local CSPRNG.
pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    rand::rng().fill_bytes(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CredVaultError;

    #[test]
    fn same_inputs_same_key() {
        let salt = [7u8; 32];
        let a = derive_key(b"pw", &salt, MIN_ITERATIONS, 32).unwrap();
        let b = derive_key(b"pw", &salt, MIN_ITERATIONS, 32).unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn long_keys_extend_the_short_key() {
        // Block 1 of a 64-byte key is the 32-byte key.
        let salt = [1u8; 16];
        let short = derive_key(b"pw", &salt, MIN_ITERATIONS, 32).unwrap();
        let long = derive_key(b"pw", &salt, MIN_ITERATIONS, 64).unwrap();
        assert_eq!(&long[..32], &short[..]);
        assert_ne!(&long[32..], &short[..]);
    }

    #[test]
    fn rejects_short_salt() {
        let err = derive_key(b"pw", &[0u8; 15], MIN_ITERATIONS, 32).unwrap_err();
        assert!(matches!(
            err,
            CredVaultError::Crypto(CryptoError::WeakParameters(_))
        ));
    }

    #[test]
    fn rejects_low_iterations() {
        let err = derive_master_key(b"pw", &[0u8; 32], MIN_ITERATIONS - 1).unwrap_err();
        assert!(matches!(
            err,
            CredVaultError::Crypto(CryptoError::WeakParameters(_))
        ));
    }

    #[test]
    fn master_key_matches_generic_derivation() {
        let salt = [9u8; 32];
        let generic = derive_key(b"pw", &salt, MIN_ITERATIONS, KEY_LEN).unwrap();
        let master = derive_master_key(b"pw", &salt, MIN_ITERATIONS).unwrap();
        assert_eq!(&generic[..], &master[..]);
    }

    #[test]
    fn salts_are_random() {
        assert_eq!(generate_salt(SALT_LEN).len(), SALT_LEN);
        assert_ne!(generate_salt(SALT_LEN), generate_salt(SALT_LEN));
    }
}
