use crate::{
    Result,
    constants::{
        DEFAULT_CHECKIN_RETURN_SECS, DEFAULT_CURRENCY_SYMBOL, DEFAULT_INACTIVITY_TIMEOUT_SECS,
        DEFAULT_INACTIVITY_WARNING_SECS, DEFAULT_MAX_GUESTS, DEFAULT_POOL_NAME, MAX_UID_LENGTH,
        MIN_UID_LENGTH,
    },
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag or card identifier produced by a scan (1-64 ASCII characters).
///
/// Every input path (wedge decoder, remote-scan link) normalizes its raw
/// buffer into a `ScanUid` before handing it to the session controller, so
/// downstream code never sees untrimmed or non-ASCII identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScanUid(String);

impl ScanUid {
    /// Create a new scan UID with validation.
    ///
    /// The value is trimmed before validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidScanUid` if the trimmed value is empty, longer
    /// than 64 characters, or contains non-ASCII characters.
    pub fn new(uid: &str) -> Result<Self> {
        let uid = uid.trim();

        let len = uid.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len) {
            return Err(Error::InvalidScanUid(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} chars, got {len}"
            )));
        }

        if !uid.is_ascii() {
            return Err(Error::InvalidScanUid("UID must be ASCII".to_string()));
        }

        Ok(ScanUid(uid.to_string()))
    }

    /// Get the UID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ScanUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ScanUid::new(s)
    }
}

impl TryFrom<String> for ScanUid {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        ScanUid::new(&s)
    }
}

impl From<ScanUid> for String {
    fn from(uid: ScanUid) -> Self {
        uid.0
    }
}

/// Member identifier assigned by the identity backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(i64);

impl MemberId {
    /// Create a new member id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidMemberId` if the id is not positive.
    pub fn new(id: i64) -> Result<Self> {
        if id <= 0 {
            return Err(Error::InvalidMemberId(format!(
                "Member id must be positive, got {id}"
            )));
        }
        Ok(MemberId(id))
    }

    /// Get the raw id.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier returned by a terminal-payment initiation call.
///
/// The remote payment side mints these; the kiosk only echoes them back when
/// polling or cancelling. No structure is assumed beyond non-emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationKey(String);

impl CorrelationKey {
    /// Wrap a key supplied by the payment backend.
    pub fn new(key: impl Into<String>) -> Self {
        CorrelationKey(key.into())
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity snapshot for the currently scanned or selected member.
///
/// Snapshots are replaced wholesale on every successful scan, search, or
/// signup and cleared on return-to-idle; they are never mutated in place.
/// Fields beyond the typed core are carried opaquely for the screen layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    /// Backend member identifier.
    pub member_id: MemberId,

    /// Display name shown on kiosk screens.
    pub name: String,

    /// Membership status label, if the backend supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_status: Option<String>,

    /// When this snapshot was received by the kiosk.
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,

    /// Remaining backend fields, passed through untyped to the screen layer.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MemberSnapshot {
    /// Create a snapshot with just the typed core fields.
    pub fn new(member_id: MemberId, name: impl Into<String>) -> Self {
        Self {
            member_id,
            name: name.into(),
            membership_status: None,
            received_at: Utc::now(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Kiosk configuration fetched from the settings source and consumed as-is.
///
/// Every field carries a serde default so a partial settings payload (or an
/// older backend) still yields a usable configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KioskSettings {
    /// Idle seconds before the inactivity warning appears.
    #[serde(default = "default_timeout_secs")]
    pub inactivity_timeout_seconds: u64,

    /// Warning countdown seconds before the forced return to idle.
    #[serde(default = "default_warning_secs")]
    pub inactivity_warning_seconds: u64,

    /// Seconds a completed check-in lingers before returning to idle.
    #[serde(default = "default_checkin_return_secs")]
    pub checkin_return_seconds: u64,

    /// Currency symbol for price display.
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Facility name shown on the idle screen.
    #[serde(default = "default_pool_name")]
    pub pool_name: String,

    /// Maximum guests allowed per family visit.
    #[serde(default = "default_max_guests")]
    pub family_max_guests: u32,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_INACTIVITY_TIMEOUT_SECS
}

fn default_warning_secs() -> u64 {
    DEFAULT_INACTIVITY_WARNING_SECS
}

fn default_checkin_return_secs() -> u64 {
    DEFAULT_CHECKIN_RETURN_SECS
}

fn default_currency() -> String {
    DEFAULT_CURRENCY_SYMBOL.to_string()
}

fn default_pool_name() -> String {
    DEFAULT_POOL_NAME.to_string()
}

fn default_max_guests() -> u32 {
    DEFAULT_MAX_GUESTS
}

impl Default for KioskSettings {
    fn default() -> Self {
        Self {
            inactivity_timeout_seconds: default_timeout_secs(),
            inactivity_warning_seconds: default_warning_secs(),
            checkin_return_seconds: default_checkin_return_secs(),
            currency_symbol: default_currency(),
            pool_name: default_pool_name(),
            family_max_guests: default_max_guests(),
        }
    }
}
