//! Sub-key derivation helpers using HKDF-SHA256.
//!
//! From the PBKDF2 master key we derive two independent values:
//! - The **entry key** that encrypts the vault document.
//! - The **password verifier** stored in the `.hash` sidecar.
//!
//! Both come from the same salt and the same password but use different
//! HKDF `info` strings, so knowing the verifier reveals nothing about the
//! entry key.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::kdf::{derive_master_key, KEY_LEN};
use super::memory::constant_time_equals;
use crate::errors::{CryptoError, Result};

const ENTRY_KEY_INFO: &[u8] = b"credvault-entry-key";
const VERIFIER_INFO: &[u8] = b"credvault-password-verifier";

/// Internal helper: run HKDF-SHA256 expand with the given `info`.
///
/// The master key already has full entropy (it came from PBKDF2), so no
/// extraction salt is used.
fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}

/// A 32-byte key that zeroes its memory when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Create a new `MasterKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Run PBKDF2 over `password` and `salt`.
    pub fn derive(password: &[u8], salt: &[u8], iterations: u32) -> Result<Self> {
        let mut bytes = derive_master_key(password, salt, iterations)?;
        let key = Self::new(bytes);
        bytes.zeroize();
        Ok(key)
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Derive the key that encrypts the vault document.
    pub fn entry_key(&self) -> Result<MasterKey> {
        hkdf_derive(&self.bytes, ENTRY_KEY_INFO).map(MasterKey::new)
    }

    /// Derive the password verifier stored next to the vault.
    pub fn verifier(&self) -> Result<[u8; KEY_LEN]> {
        hkdf_derive(&self.bytes, VERIFIER_INFO)
    }

    /// Compare this key's verifier against a stored one in constant time.
    pub fn matches_verifier(&self, stored: &[u8]) -> Result<bool> {
        let mut computed = self.verifier()?;
        let matches = constant_time_equals(&computed, stored);
        computed.zeroize();
        Ok(matches)
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::MIN_ITERATIONS;

    #[test]
    fn verifier_and_entry_key_are_distinct() {
        let master = MasterKey::new([0x11; KEY_LEN]);
        let entry = master.entry_key().unwrap();
        let verifier = master.verifier().unwrap();
        assert_ne!(entry.as_bytes(), &verifier);
        assert_ne!(master.as_bytes(), &verifier);
    }

    #[test]
    fn verifier_matches_only_same_password() {
        let salt = [5u8; 32];
        let right = MasterKey::derive(b"right", &salt, MIN_ITERATIONS).unwrap();
        let wrong = MasterKey::derive(b"wrong", &salt, MIN_ITERATIONS).unwrap();
        let stored = right.verifier().unwrap();
        assert!(right.matches_verifier(&stored).unwrap());
        assert!(!wrong.matches_verifier(&stored).unwrap());
    }

    #[test]
    fn debug_does_not_leak_bytes() {
        let key = MasterKey::new([0xAB; KEY_LEN]);
        assert_eq!(format!("{key:?}"), "MasterKey(<redacted>)");
    }
}
