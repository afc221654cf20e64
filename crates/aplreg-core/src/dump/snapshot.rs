//! Snapshots and their JSON persistence.
//!
//! The on-disk form is a self-describing JSON document:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "label": "boot",
//!   "category_filter": "HID",
//!   "created_at": "2026-10-19T12:00:00Z",
//!   "registers": [
//!     {"name": "SYS_APL_HID0_EL1", "encoding": "s3_0_c15_c0_0",
//!      "value": "0x10002990120e0e00", "success": true,
//!      "timestamp": "2026-10-19T12:00:00.001Z"}
//!   ]
//! }
//! ```
//!
//! All listed keys are mandatory (`category_filter` and `value` may be
//! `null`). Unknown keys are ignored so newer writers stay readable.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RegisterError, Result};
use crate::types::{Category, Encoding, RawReading};

/// Current version of the persisted format
pub const FORMAT_VERSION: u32 = 1;

/// A set of readings taken together
///
/// Readings keep the order they were taken in. A snapshot cut short by an
/// interrupted dump is still valid; it simply holds fewer readings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot
{
    label: String,
    category_filter: Option<Category>,
    created_at: DateTime<Utc>,
    readings: Vec<RawReading>,
}

impl Snapshot
{
    /// An empty snapshot created now
    pub fn new(label: impl Into<String>, category_filter: Option<Category>) -> Self
    {
        Self::with_created_at(label, category_filter, Utc::now())
    }

    pub fn with_created_at(label: impl Into<String>, category_filter: Option<Category>, created_at: DateTime<Utc>) -> Self
    {
        Snapshot {
            label: label.into(),
            category_filter,
            created_at,
            readings: Vec::new(),
        }
    }

    /// Append a reading
    ///
    /// ## Errors
    ///
    /// [`RegisterError::SnapshotFormat`] if a reading for the same register
    /// name is already present. Every snapshot that can be saved can also be
    /// loaded back.
    pub fn push(&mut self, reading: RawReading) -> Result<()>
    {
        if self.get(reading.register_name()).is_some() {
            return Err(RegisterError::SnapshotFormat(format!(
                "register {} appears more than once",
                reading.register_name()
            )));
        }
        self.readings.push(reading);
        Ok(())
    }

    pub fn label(&self) -> &str
    {
        &self.label
    }

    pub fn category_filter(&self) -> Option<Category>
    {
        self.category_filter
    }

    pub fn created_at(&self) -> DateTime<Utc>
    {
        self.created_at
    }

    pub fn readings(&self) -> &[RawReading]
    {
        &self.readings
    }

    /// Reading for a register name
    pub fn get(&self, name: &str) -> Option<&RawReading>
    {
        self.readings.iter().find(|r| r.register_name() == name)
    }

    pub fn len(&self) -> usize
    {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.readings.is_empty()
    }

    /// Serialize to the persisted JSON form (pretty-printed)
    pub fn to_json(&self) -> Result<String>
    {
        Ok(serde_json::to_string_pretty(&SnapshotFile::from(self))?)
    }

    /// Parse the persisted JSON form
    ///
    /// ## Errors
    ///
    /// - [`RegisterError::Json`] for malformed JSON, a missing mandatory key
    ///   or a malformed encoding or hex value
    /// - [`RegisterError::SnapshotFormat`] for an unsupported version, a record
    ///   whose `success` flag disagrees with its `value`, or a register listed
    ///   twice
    pub fn from_json(text: &str) -> Result<Self>
    {
        let file: SnapshotFile = serde_json::from_str(text)?;
        file.try_into()
    }

    /// Write the snapshot to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()>
    {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        debug!(path = %path.display(), registers = self.len(), "Snapshot saved");
        Ok(())
    }

    /// Read a snapshot from `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self>
    {
        let path = path.as_ref();
        let snapshot = Self::from_json(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), registers = snapshot.len(), "Snapshot loaded");
        Ok(snapshot)
    }
}

#[derive(Serialize, Deserialize)]
struct SnapshotFile
{
    #[serde(default = "default_version")]
    format_version: u32,
    label: String,
    #[serde(deserialize_with = "Option::deserialize")]
    category_filter: Option<Category>,
    created_at: DateTime<Utc>,
    registers: Vec<ReadingRecord>,
}

#[derive(Serialize, Deserialize)]
struct ReadingRecord
{
    name: String,
    encoding: Encoding,
    #[serde(with = "hex")]
    value: Option<u64>,
    success: bool,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

const fn default_version() -> u32
{
    FORMAT_VERSION
}

impl From<&Snapshot> for SnapshotFile
{
    fn from(snapshot: &Snapshot) -> Self
    {
        SnapshotFile {
            format_version: FORMAT_VERSION,
            label: snapshot.label.clone(),
            category_filter: snapshot.category_filter,
            created_at: snapshot.created_at,
            registers: snapshot
                .readings
                .iter()
                .map(|r| ReadingRecord {
                    name: r.register_name().to_string(),
                    encoding: r.encoding(),
                    value: r.value(),
                    success: r.success(),
                    timestamp: r.timestamp(),
                    error: r.error_detail().map(str::to_string),
                })
                .collect(),
        }
    }
}

impl TryFrom<SnapshotFile> for Snapshot
{
    type Error = RegisterError;

    fn try_from(file: SnapshotFile) -> Result<Self>
    {
        if file.format_version > FORMAT_VERSION {
            return Err(RegisterError::SnapshotFormat(format!(
                "format version {} is newer than supported version {FORMAT_VERSION}",
                file.format_version
            )));
        }

        let mut snapshot = Snapshot::with_created_at(file.label, file.category_filter, file.created_at);
        for record in file.registers {
            let reading = match (record.success, record.value) {
                (true, Some(value)) => RawReading::succeeded_at(record.name, record.encoding, value, record.timestamp),
                (false, None) => RawReading::failed_at(
                    record.name,
                    record.encoding,
                    record.error.unwrap_or_else(|| String::from("read failed")),
                    record.timestamp,
                ),
                (true, None) => {
                    return Err(RegisterError::SnapshotFormat(format!(
                        "register {} is marked successful but has no value",
                        record.name
                    )));
                }
                (false, Some(_)) => {
                    return Err(RegisterError::SnapshotFormat(format!(
                        "register {} is marked failed but has a value",
                        record.name
                    )));
                }
            };
            snapshot.push(reading)?;
        }

        Ok(snapshot)
    }
}

/// `Option<u64>` as a `"0x..."` string or `null`
pub(crate) mod hex
{
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option, clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    {
        match value {
            Some(v) => serializer.collect_str(&format_args!("{v:#018x}")),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error>
    {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .ok_or_else(|| D::Error::custom(format!("expected a 0x-prefixed hex value, found `{text}`")))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(D::Error::custom(format!("invalid hex value `{text}`")));
        }
        u64::from_str_radix(digits, 16)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid hex value `{text}`: {e}")))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn hid0() -> Encoding
    {
        Encoding::new_unchecked(3, 0, 15, 0, 0)
    }

    #[test]
    fn test_value_is_hex_string()
    {
        let mut snapshot = Snapshot::new("boot", Some(Category::Hid));
        snapshot.push(RawReading::succeeded("SYS_APL_HID0_EL1", hid0(), 0x10)).unwrap();

        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(json["format_version"], 1);
        assert_eq!(json["category_filter"], "HID");
        assert_eq!(json["registers"][0]["value"], "0x0000000000000010");
        assert_eq!(json["registers"][0]["encoding"], "s3_0_c15_c0_0");
        assert!(json["registers"][0].get("error").is_none());
    }

    #[test]
    fn test_failed_value_is_null()
    {
        let mut snapshot = Snapshot::new("boot", None);
        snapshot.push(RawReading::failed("SYS_APL_HID0_EL1", hid0(), "denied")).unwrap();

        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert!(json["category_filter"].is_null());
        assert!(json["registers"][0]["value"].is_null());
        assert_eq!(json["registers"][0]["success"], false);
        assert_eq!(json["registers"][0]["error"], "denied");
    }

    #[test]
    fn test_missing_category_filter_is_rejected()
    {
        let text = r#"{"label": "x", "created_at": "2026-10-19T12:00:00Z", "registers": []}"#;
        assert!(matches!(Snapshot::from_json(text), Err(RegisterError::Json(_))));
    }

    #[test]
    fn test_missing_value_is_rejected()
    {
        let text = r#"{"label": "x", "category_filter": null, "created_at": "2026-10-19T12:00:00Z",
            "registers": [{"name": "A", "encoding": "s3_0_c15_c0_0", "success": false,
                           "timestamp": "2026-10-19T12:00:00Z"}]}"#;
        assert!(matches!(Snapshot::from_json(text), Err(RegisterError::Json(_))));
    }

    #[test]
    fn test_unknown_keys_are_ignored()
    {
        let text = r#"{"label": "x", "category_filter": null, "created_at": "2026-10-19T12:00:00Z",
            "host": "m1-mini", "registers": [{"name": "A", "encoding": "s3_0_c15_c0_0", "value": "0x1",
            "success": true, "timestamp": "2026-10-19T12:00:00Z", "note": "extra"}]}"#;
        let snapshot = Snapshot::from_json(text).unwrap();
        assert_eq!(snapshot.get("A").and_then(RawReading::value), Some(1));
    }

    #[test]
    fn test_success_flag_must_match_value()
    {
        let text = r#"{"label": "x", "category_filter": null, "created_at": "2026-10-19T12:00:00Z",
            "registers": [{"name": "A", "encoding": "s3_0_c15_c0_0", "value": null,
                           "success": true, "timestamp": "2026-10-19T12:00:00Z"}]}"#;
        assert!(matches!(Snapshot::from_json(text), Err(RegisterError::SnapshotFormat(_))));
    }

    #[test]
    fn test_newer_version_is_rejected()
    {
        let text = r#"{"format_version": 2, "label": "x", "category_filter": null,
            "created_at": "2026-10-19T12:00:00Z", "registers": []}"#;
        assert!(matches!(Snapshot::from_json(text), Err(RegisterError::SnapshotFormat(_))));
    }

    #[test]
    fn test_push_rejects_duplicate_name()
    {
        let mut snapshot = Snapshot::new("boot", None);
        snapshot.push(RawReading::succeeded("X", hid0(), 1)).unwrap();

        let other = Encoding::new_unchecked(3, 0, 15, 1, 0);
        let result = snapshot.push(RawReading::succeeded("X", other, 2));
        assert!(matches!(result, Err(RegisterError::SnapshotFormat(_))));
        assert_eq!(snapshot.len(), 1);

        // Whatever was accepted loads back
        let loaded = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_duplicate_record_is_rejected()
    {
        let text = r#"{"label": "x", "category_filter": null, "created_at": "2026-10-19T12:00:00Z",
            "registers": [
                {"name": "A", "encoding": "s3_0_c15_c0_0", "value": "0x1", "success": true,
                 "timestamp": "2026-10-19T12:00:00Z"},
                {"name": "A", "encoding": "s3_0_c15_c1_0", "value": "0x2", "success": true,
                 "timestamp": "2026-10-19T12:00:00Z"}]}"#;
        assert!(matches!(Snapshot::from_json(text), Err(RegisterError::SnapshotFormat(_))));
    }

    #[test]
    fn test_hex_value_must_be_plain_digits()
    {
        for value in ["0x+10", "0x-1", "0x", "0x 10", "0x1_0"] {
            let text = format!(
                r#"{{"label": "x", "category_filter": null, "created_at": "2026-10-19T12:00:00Z",
                "registers": [{{"name": "A", "encoding": "s3_0_c15_c0_0", "value": "{value}",
                               "success": true, "timestamp": "2026-10-19T12:00:00Z"}}]}}"#
            );
            assert!(matches!(Snapshot::from_json(&text), Err(RegisterError::Json(_))), "{value} was accepted");
        }
    }
}
