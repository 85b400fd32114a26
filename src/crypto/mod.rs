//! Cryptographic primitives for CredVault.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 password-based key derivation (`kdf`)
//! - AES-256-GCM encryption, key-based and password-envelope (`encryption`)
//! - HKDF sub-keys and the zeroizing `MasterKey` (`keys`)
//! - Secure wipe and constant-time comparison (`memory`)

pub mod encryption;
pub mod kdf;
pub mod keys;
pub mod memory;

pub use encryption::{decrypt, decrypt_with_key, encrypt, encrypt_with_key};
pub use kdf::{derive_key, generate_salt, random_bytes};
pub use keys::MasterKey;
pub use memory::{constant_time_equals, secure_zero};
