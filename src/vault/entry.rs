//! Vault entries: the four secret kinds and their shared metadata.
//!
//! An entry is a `VaultEntry` (common metadata) wrapping an `EntryKind`
//! (the variant-specific payload).  In JSON the two are flattened into a
//! single camelCase object with a `type` discriminator:
//!
//! ```json
//! { "type": "login", "id": "…", "name": "GitHub", "username": "octo", … }
//! ```
//!
//! Records must go through `VaultEntry::from_value` when they come from
//! outside the process, so unknown types and broken invariants surface as
//! a `SchemaError` instead of being silently dropped or defaulted.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::errors::{SchemaError, VaultError};

/// Number of superseded passwords kept per login.
pub const PASSWORD_HISTORY_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// How sensitive an entry is.  Ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecurityLevel {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl SecurityLevel {
    fn rank(self) -> u8 {
        match self {
            SecurityLevel::Low => 0,
            SecurityLevel::Medium => 1,
            SecurityLevel::High => 2,
            SecurityLevel::Critical => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SecurityLevel::Critical => "critical",
            SecurityLevel::High => "high",
            SecurityLevel::Medium => "medium",
            SecurityLevel::Low => "low",
        }
    }
}

impl Ord for SecurityLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for SecurityLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for SecurityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Ok(SecurityLevel::Critical),
            "high" => Ok(SecurityLevel::High),
            "medium" => Ok(SecurityLevel::Medium),
            "low" => Ok(SecurityLevel::Low),
            other => Err(format!(
                "unknown security level '{other}' — use critical, high, medium or low"
            )),
        }
    }
}

/// Discriminant of `EntryKind`, used by filters and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryType {
    Login,
    SecureNote,
    Card,
    Identity,
}

impl EntryType {
    pub const ALL: [EntryType; 4] = [
        EntryType::Login,
        EntryType::SecureNote,
        EntryType::Card,
        EntryType::Identity,
    ];

    /// The `type` value used in serialized records.
    pub fn discriminator(self) -> &'static str {
        match self {
            EntryType::Login => "login",
            EntryType::SecureNote => "secureNote",
            EntryType::Card => "card",
            EntryType::Identity => "identity",
        }
    }

    pub fn from_discriminator(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.discriminator() == tag)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryType::Login => "login",
            EntryType::SecureNote => "note",
            EntryType::Card => "card",
            EntryType::Identity => "identity",
        };
        f.write_str(label)
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "login" => Ok(EntryType::Login),
            "note" | "securenote" | "secure-note" => Ok(EntryType::SecureNote),
            "card" => Ok(EntryType::Card),
            "identity" => Ok(EntryType::Identity),
            other => Err(format!(
                "unknown entry type '{other}' — use login, note, card or identity"
            )),
        }
    }
}

/// Payment card network, detected from the card number when unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    #[default]
    Other,
}

impl CardBrand {
    /// Guess the brand from the leading digits (IIN ranges).
    pub fn detect(number: &str) -> Self {
        let digits: String = number.chars().filter(char::is_ascii_digit).collect();
        let prefix = |n: usize| digits.get(..n).and_then(|p| p.parse::<u32>().ok());

        if digits.starts_with('4') {
            CardBrand::Visa
        } else if matches!(prefix(2), Some(34 | 37)) {
            CardBrand::Amex
        } else if matches!(prefix(2), Some(51..=55)) || matches!(prefix(4), Some(2221..=2720)) {
            CardBrand::Mastercard
        } else if digits.starts_with("6011") || digits.starts_with("65") {
            CardBrand::Discover
        } else {
            CardBrand::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CardBrand::Visa => "Visa",
            CardBrand::Mastercard => "Mastercard",
            CardBrand::Amex => "American Express",
            CardBrand::Discover => "Discover",
            CardBrand::Other => "Other",
        }
    }
}

// ---------------------------------------------------------------------------
// Variant payloads
// ---------------------------------------------------------------------------

/// A password that was replaced, with the moment it was replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordHistoryItem {
    pub password: String,
    pub replaced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginData {
    pub username: String,
    pub password: String,
    pub email: String,
    pub urls: Vec<String>,
    /// Base32 secret or `otpauth://` URL, handed to the TOTP provider.
    pub totp_secret: Option<String>,
    pub password_history: Vec<PasswordHistoryItem>,
}

impl LoginData {
    /// Add a URL unless it is already present.  Returns `true` if added.
    pub fn add_url(&mut self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() || self.urls.iter().any(|u| u == url) {
            return false;
        }
        self.urls.push(url.to_string());
        true
    }

    /// Remove a URL.  Returns `true` if it was present.
    pub fn remove_url(&mut self, url: &str) -> bool {
        let before = self.urls.len();
        self.urls.retain(|u| u != url);
        self.urls.len() != before
    }

    /// Push `old` onto the history, keeping only the newest entries.
    pub(crate) fn record_superseded(&mut self, old: String, at: DateTime<Utc>) {
        self.password_history.push(PasswordHistoryItem {
            password: old,
            replaced_at: at,
        });
        if self.password_history.len() > PASSWORD_HISTORY_LIMIT {
            let excess = self.password_history.len() - PASSWORD_HISTORY_LIMIT;
            for mut dropped in self.password_history.drain(..excess) {
                dropped.password.zeroize();
            }
        }
    }

    pub fn has_totp(&self) -> bool {
        self.totp_secret
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }

    fn wipe(&mut self) {
        self.password.zeroize();
        for item in &mut self.password_history {
            item.password.zeroize();
        }
        self.password_history.clear();
        if let Some(secret) = self.totp_secret.as_mut() {
            secret.zeroize();
        }
        self.totp_secret = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecureNoteData {
    pub content: String,
    pub is_markdown: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardData {
    pub cardholder_name: String,
    pub brand: CardBrand,
    pub number: String,
    pub expiry_month: Option<u8>,
    pub expiry_year: Option<u16>,
    pub security_code: String,
}

impl CardData {
    /// Whether the card is past its expiry month as of `now`.
    ///
    /// Cards are valid through the last day of the expiry month.  Two-digit
    /// years are read as 20xx.  Cards without an expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let (Some(month), Some(year)) = (self.expiry_month, self.expiry_year) else {
            return false;
        };
        let year = if year < 100 { 2000 + i32::from(year) } else { i32::from(year) };
        (year, u32::from(month)) < (now.year(), now.month())
    }

    /// The number with all but the last four digits hidden.
    pub fn masked_number(&self) -> String {
        let digits: Vec<char> = self.number.chars().filter(char::is_ascii_digit).collect();
        let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
        format!("•••• {tail}")
    }

    fn wipe(&mut self) {
        self.number.zeroize();
        self.security_code.zeroize();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentityData {
    pub title: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub ssn: String,
    pub passport_number: String,
    pub license_number: String,
}

fn join_non_empty<'a>(parts: impl IntoIterator<Item = &'a str>, sep: &str) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

impl IdentityData {
    /// Title and name parts joined by spaces, skipping blanks.
    pub fn full_name(&self) -> String {
        join_non_empty(
            [
                self.title.as_str(),
                self.first_name.as_str(),
                self.middle_name.as_str(),
                self.last_name.as_str(),
            ],
            " ",
        )
    }

    /// Single-line postal address, e.g. `1 Main St, Springfield, IL 62701, US`.
    pub fn full_address(&self) -> String {
        let region = join_non_empty([self.state.as_str(), self.postal_code.as_str()], " ");
        let locality = join_non_empty([self.city.as_str(), region.as_str()], ", ");
        join_non_empty(
            [
                self.address_line1.as_str(),
                self.address_line2.as_str(),
                locality.as_str(),
                self.country.as_str(),
            ],
            ", ",
        )
    }

    fn wipe(&mut self) {
        self.ssn.zeroize();
        self.passport_number.zeroize();
        self.license_number.zeroize();
    }
}

/// The variant-specific payload of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EntryKind {
    Login(LoginData),
    SecureNote(SecureNoteData),
    Card(CardData),
    Identity(IdentityData),
}

impl EntryKind {
    pub fn entry_type(&self) -> EntryType {
        match self {
            EntryKind::Login(_) => EntryType::Login,
            EntryKind::SecureNote(_) => EntryType::SecureNote,
            EntryKind::Card(_) => EntryType::Card,
            EntryKind::Identity(_) => EntryType::Identity,
        }
    }

    /// Zero every secret field of the payload in place.
    pub fn wipe_secrets(&mut self) {
        match self {
            EntryKind::Login(login) => login.wipe(),
            EntryKind::SecureNote(note) => note.content.zeroize(),
            EntryKind::Card(card) => card.wipe(),
            EntryKind::Identity(identity) => identity.wipe(),
        }
    }
}

// ---------------------------------------------------------------------------
// VaultEntry
// ---------------------------------------------------------------------------

fn new_id() -> Uuid {
    Uuid::new_v4()
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

/// A single secret stored in the vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultEntry {
    /// Assigned once at creation; never reused.
    #[serde(default = "new_id")]
    pub id: Uuid,

    pub name: String,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub folder_id: Option<Uuid>,

    #[serde(default)]
    pub favorite: bool,

    #[serde(default)]
    pub security_level: SecurityLevel,

    #[serde(default = "now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "now")]
    pub updated_at: DateTime<Utc>,

    #[serde(default = "now")]
    pub password_last_changed: DateTime<Utc>,

    #[serde(default)]
    pub deleted: bool,

    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub kind: EntryKind,
}

impl VaultEntry {
    /// Create an entry with a fresh id and all timestamps set to now.
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            notes: String::new(),
            tags: BTreeSet::new(),
            folder_id: None,
            favorite: false,
            security_level: SecurityLevel::default(),
            created_at: now,
            updated_at: now,
            password_last_changed: now,
            deleted: false,
            deleted_at: None,
            kind,
        }
    }

    pub fn login(
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            EntryKind::Login(LoginData {
                username: username.into(),
                password: password.into(),
                ..LoginData::default()
            }),
        )
    }

    pub fn secure_note(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(
            name,
            EntryKind::SecureNote(SecureNoteData {
                content: content.into(),
                is_markdown: false,
            }),
        )
    }

    /// A card whose brand is detected from `number`.
    pub fn card(
        name: impl Into<String>,
        cardholder_name: impl Into<String>,
        number: impl Into<String>,
    ) -> Self {
        let number = number.into();
        Self::new(
            name,
            EntryKind::Card(CardData {
                cardholder_name: cardholder_name.into(),
                brand: CardBrand::detect(&number),
                number,
                ..CardData::default()
            }),
        )
    }

    pub fn identity(name: impl Into<String>, identity: IdentityData) -> Self {
        Self::new(name, EntryKind::Identity(identity))
    }

    // --- builder-style setters -------------------------------------------

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_folder(mut self, folder_id: Uuid) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    pub fn with_security_level(mut self, level: SecurityLevel) -> Self {
        self.security_level = level;
        self
    }

    // --- accessors --------------------------------------------------------

    pub fn entry_type(&self) -> EntryType {
        self.kind.entry_type()
    }

    pub fn as_login(&self) -> Option<&LoginData> {
        match &self.kind {
            EntryKind::Login(login) => Some(login),
            _ => None,
        }
    }

    pub fn as_login_mut(&mut self) -> Option<&mut LoginData> {
        match &mut self.kind {
            EntryKind::Login(login) => Some(login),
            _ => None,
        }
    }

    /// The login password, if this is a login.
    pub fn password(&self) -> Option<&str> {
        self.as_login().map(|l| l.password.as_str())
    }

    // --- mutation helpers -------------------------------------------------

    /// Stamp `updated_at`, never moving it before `created_at`.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at.max(self.created_at);
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        let added = self.tags.insert(tag.into());
        if added {
            self.touch(Utc::now());
        }
        added
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let removed = self.tags.remove(tag);
        if removed {
            self.touch(Utc::now());
        }
        removed
    }

    /// Add a URL to a login entry.
    pub fn add_url(&mut self, url: &str) -> Result<bool, VaultError> {
        let id = self.id;
        let kind = self.entry_type();
        let login = self.as_login_mut().ok_or_else(|| {
            VaultError::TypeMismatch(id, kind_label(kind), "only logins carry URLs".into())
        })?;
        let added = login.add_url(url);
        if added {
            self.touch(Utc::now());
        }
        Ok(added)
    }

    /// Replace a login's password, moving the old one into history.
    pub fn change_password(&mut self, new_password: impl Into<String>) -> Result<(), VaultError> {
        self.change_password_at(new_password, Utc::now())
    }

    pub fn change_password_at(
        &mut self,
        new_password: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(), VaultError> {
        let id = self.id;
        let kind = self.entry_type();
        let login = self.as_login_mut().ok_or_else(|| {
            VaultError::TypeMismatch(id, kind_label(kind), "only logins have passwords".into())
        })?;
        let old = std::mem::replace(&mut login.password, new_password.into());
        login.record_superseded(old, at);
        self.password_last_changed = at;
        self.touch(at);
        Ok(())
    }

    /// Soft-delete: flag the entry and remember when.
    pub fn mark_deleted(&mut self, at: DateTime<Utc>) {
        if !self.deleted {
            self.deleted = true;
            self.deleted_at = Some(at);
            self.touch(at);
        }
    }

    /// Undo `mark_deleted`.
    pub fn restore(&mut self, at: DateTime<Utc>) {
        self.deleted = false;
        self.deleted_at = None;
        self.touch(at);
    }

    /// Zero the payload's secrets and the free-text notes.
    pub fn wipe_secrets(&mut self) {
        self.notes.zeroize();
        self.kind.wipe_secrets();
    }

    // --- derived queries --------------------------------------------------

    pub fn password_age_days(&self) -> i64 {
        self.password_age_days_at(Utc::now())
    }

    pub fn password_age_days_at(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.password_last_changed).num_days()
    }

    /// Card expiry; `false` for every other kind.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match &self.kind {
            EntryKind::Card(card) => card.is_expired_at(now),
            _ => false,
        }
    }

    /// Text searched by free-text queries.
    ///
    /// Covers the name, notes, tags and each kind's descriptive fields.
    /// Passwords, card numbers, note bodies and document numbers are
    /// deliberately left out.
    pub fn full_text(&self) -> String {
        let mut parts: Vec<String> = vec![self.name.clone(), self.notes.clone()];
        parts.extend(self.tags.iter().cloned());
        match &self.kind {
            EntryKind::Login(login) => {
                parts.push(login.username.clone());
                parts.push(login.email.clone());
                parts.extend(login.urls.iter().cloned());
            }
            EntryKind::SecureNote(_) => {}
            EntryKind::Card(card) => {
                parts.push(card.cardholder_name.clone());
                parts.push(card.brand.as_str().to_string());
            }
            EntryKind::Identity(identity) => {
                parts.push(identity.full_name());
                parts.push(identity.email.clone());
                parts.push(identity.company.clone());
            }
        }
        parts.retain(|p| !p.is_empty());
        parts.join("\n")
    }

    // --- schema -----------------------------------------------------------

    /// Check the invariants every stored entry must satisfy.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::InvalidRecord(format!(
                "entry {} has an empty name",
                self.id
            )));
        }
        if self.updated_at < self.created_at {
            return Err(SchemaError::InvalidRecord(format!(
                "entry {} was updated before it was created",
                self.id
            )));
        }
        if self.deleted && self.deleted_at.is_none() {
            return Err(SchemaError::InvalidRecord(format!(
                "entry {} is deleted but has no deletion time",
                self.id
            )));
        }
        if let EntryKind::Card(card) = &self.kind {
            if let Some(month) = card.expiry_month {
                if !(1..=12).contains(&month) {
                    return Err(SchemaError::InvalidRecord(format!(
                        "entry {} has expiry month {month}",
                        self.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Load one tagged record, rejecting unknown types.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SchemaError> {
        let tag = value
            .as_object()
            .ok_or_else(|| SchemaError::InvalidRecord("entry record is not an object".into()))?
            .get("type")
            .ok_or(SchemaError::MissingField("type"))?
            .as_str()
            .ok_or_else(|| SchemaError::InvalidRecord("'type' must be a string".into()))?;

        if EntryType::from_discriminator(tag).is_none() {
            return Err(SchemaError::UnknownEntryType(tag.to_string()));
        }

        let entry: VaultEntry =
            serde_json::from_value(value).map_err(|e| SchemaError::InvalidRecord(e.to_string()))?;
        entry.validate()?;
        Ok(entry)
    }

    pub fn to_value(&self) -> Result<serde_json::Value, SchemaError> {
        serde_json::to_value(self).map_err(|e| SchemaError::InvalidRecord(e.to_string()))
    }
}

pub(crate) fn kind_label(kind: EntryType) -> &'static str {
    match kind {
        EntryType::Login => "login",
        EntryType::SecureNote => "secure note",
        EntryType::Card => "card",
        EntryType::Identity => "identity",
    }
}
