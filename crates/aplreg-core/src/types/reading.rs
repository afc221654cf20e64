//! Raw register readings and parsed fields.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{BitRange, Encoding};

/// The result of one read attempt against one register
///
/// A successful reading carries the raw 64-bit value. A failed reading carries
/// only the backend's error detail; it has no value and cannot be parsed.
///
/// ## Example
///
/// ```rust
/// use aplreg_core::types::{Encoding, RawReading};
///
/// let enc = Encoding::new_unchecked(3, 0, 15, 0, 0);
/// let ok = RawReading::succeeded("SYS_APL_HID0_EL1", enc, 0x10);
/// let failed = RawReading::failed("SYS_APL_HID0_EL1", enc, "register not available");
///
/// assert!(ok.success());
/// assert_eq!(ok.value(), Some(0x10));
/// assert!(!failed.success());
/// assert_eq!(failed.value(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReading
{
    register_name: String,
    encoding: Encoding,
    timestamp: DateTime<Utc>,
    value: Option<u64>,
    error_detail: Option<String>,
}

impl RawReading
{
    /// A successful reading taken now
    pub fn succeeded(register_name: impl Into<String>, encoding: Encoding, value: u64) -> Self
    {
        Self::succeeded_at(register_name, encoding, value, Utc::now())
    }

    /// A failed reading taken now
    pub fn failed(register_name: impl Into<String>, encoding: Encoding, detail: impl Into<String>) -> Self
    {
        Self::failed_at(register_name, encoding, detail, Utc::now())
    }

    pub fn succeeded_at(
        register_name: impl Into<String>,
        encoding: Encoding,
        value: u64,
        timestamp: DateTime<Utc>,
    ) -> Self
    {
        RawReading {
            register_name: register_name.into(),
            encoding,
            timestamp,
            value: Some(value),
            error_detail: None,
        }
    }

    pub fn failed_at(
        register_name: impl Into<String>,
        encoding: Encoding,
        detail: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self
    {
        RawReading {
            register_name: register_name.into(),
            encoding,
            timestamp,
            value: None,
            error_detail: Some(detail.into()),
        }
    }

    pub fn register_name(&self) -> &str
    {
        &self.register_name
    }

    pub fn encoding(&self) -> Encoding
    {
        self.encoding
    }

    pub fn timestamp(&self) -> DateTime<Utc>
    {
        self.timestamp
    }

    pub fn success(&self) -> bool
    {
        self.value.is_some()
    }

    /// The raw value, `None` for a failed reading
    pub fn value(&self) -> Option<u64>
    {
        self.value
    }

    pub fn error_detail(&self) -> Option<&str>
    {
        self.error_detail.as_deref()
    }
}

/// One decoded field of a reading
///
/// Derived on demand by the parser; never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedField
{
    pub label: String,
    pub bits: BitRange,
    pub raw_subvalue: u64,
    pub rendered_text: String,
}
