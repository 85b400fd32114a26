//! Interface to the TOTP code generator.
//!
//! The vault stores TOTP secrets but does not compute codes itself; a
//! host plugs in any implementation of `TotpProvider`.  A stored secret
//! is either a bare base32 string or a full `otpauth://` URL.

use std::fmt;

use crate::errors::Result;

/// Default parameters for a bare secret (RFC 6238 defaults).
pub const DEFAULT_ALGORITHM: TotpAlgorithm = TotpAlgorithm::Sha1;
pub const DEFAULT_DIGITS: u32 = 6;
pub const DEFAULT_PERIOD: u64 = 30;

/// URL scheme marking a stored secret as a full provisioning URL.
pub const OTPAUTH_SCHEME: &str = "otpauth://";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TotpAlgorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

impl fmt::Display for TotpAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TotpAlgorithm::Sha1 => "SHA1",
            TotpAlgorithm::Sha256 => "SHA256",
            TotpAlgorithm::Sha512 => "SHA512",
        })
    }
}

/// The parts of an `otpauth://totp/...` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpAuthFields {
    pub issuer: Option<String>,
    pub account: String,
    pub secret: String,
    pub algorithm: TotpAlgorithm,
    pub digits: u32,
    pub period: u64,
}

impl OtpAuthFields {
    /// Fields for a bare secret with the default parameters.
    pub fn from_secret(secret: impl Into<String>) -> Self {
        Self {
            issuer: None,
            account: String::new(),
            secret: secret.into(),
            algorithm: DEFAULT_ALGORITHM,
            digits: DEFAULT_DIGITS,
            period: DEFAULT_PERIOD,
        }
    }
}

/// A time-based one-time-password generator.
pub trait TotpProvider {
    /// Current code for `secret`.
    fn generate_code(
        &self,
        secret: &str,
        algorithm: TotpAlgorithm,
        digits: u32,
        period: u64,
    ) -> Result<String>;

    fn parse_otpauth_url(&self, url: &str) -> Result<OtpAuthFields>;

    fn build_otpauth_url(&self, fields: &OtpAuthFields) -> Result<String>;
}

/// Resolve a stored secret reference into generator parameters.
pub fn resolve_secret(provider: &dyn TotpProvider, stored: &str) -> Result<OtpAuthFields> {
    let stored = stored.trim();
    if stored.starts_with(OTPAUTH_SCHEME) {
        provider.parse_otpauth_url(stored)
    } else {
        Ok(OtpAuthFields::from_secret(stored))
    }
}

/// Generate the current code for a stored secret reference.
pub fn code_for(provider: &dyn TotpProvider, stored: &str) -> Result<String> {
    let fields = resolve_secret(provider, stored)?;
    provider.generate_code(&fields.secret, fields.algorithm, fields.digits, fields.period)
}
