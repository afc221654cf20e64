//! Snapshot comparison.

use serde::Serialize;
use tracing::debug;

use super::Snapshot;
use crate::catalog::Catalog;
use crate::error::Result;
use crate::parser::changed_fields;
use crate::types::{Encoding, RawReading};

/// How one register differs between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiffStatus
{
    /// Only in the second snapshot
    Added,
    /// Only in the first snapshot
    Removed,
    /// Same raw value in both
    Unchanged,
    /// Different raw values; `fields` names the fields whose rendering differs
    Changed
    {
        fields: Vec<String>
    },
    /// The read failed in at least one snapshot
    Unreadable,
}

impl DiffStatus
{
    pub const fn name(&self) -> &'static str
    {
        match self {
            DiffStatus::Added => "added",
            DiffStatus::Removed => "removed",
            DiffStatus::Unchanged => "unchanged",
            DiffStatus::Changed { .. } => "changed",
            DiffStatus::Unreadable => "unreadable",
        }
    }
}

/// One register's entry in a [`Diff`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry
{
    pub name: String,
    pub encoding: Encoding,
    #[serde(with = "super::snapshot::hex")]
    pub before: Option<u64>,
    #[serde(with = "super::snapshot::hex")]
    pub after: Option<u64>,
    #[serde(flatten)]
    pub status: DiffStatus,
}

/// Count of entries per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary
{
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub changed: usize,
    pub unreadable: usize,
}

/// Result of comparing two snapshots
///
/// Entries follow the first snapshot's order, then registers only present in
/// the second snapshot in its order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diff
{
    pub entries: Vec<DiffEntry>,
}

impl Diff
{
    pub fn get(&self, name: &str) -> Option<&DiffEntry>
    {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn summary(&self) -> DiffSummary
    {
        let mut summary = DiffSummary::default();
        for entry in &self.entries {
            match entry.status {
                DiffStatus::Added => summary.added += 1,
                DiffStatus::Removed => summary.removed += 1,
                DiffStatus::Unchanged => summary.unchanged += 1,
                DiffStatus::Changed { .. } => summary.changed += 1,
                DiffStatus::Unreadable => summary.unreadable += 1,
            }
        }
        summary
    }

    /// Entries other than `unchanged`
    pub fn differences(&self) -> impl Iterator<Item = &DiffEntry>
    {
        self.entries.iter().filter(|e| e.status != DiffStatus::Unchanged)
    }

    /// Whether both snapshots held the same registers with the same values
    pub fn is_identical(&self) -> bool
    {
        self.differences().next().is_none()
    }
}

/// Compare two snapshots register by register
///
/// Registers are matched by name and encoding. A name found in both
/// snapshots at different encodings is reported as removed from `a` and
/// added in `b`. For a register read successfully in both
/// snapshots with different values, the catalog definition is used to name
/// the fields whose rendered text changed; a register the catalog does not
/// know is reported as changed with no field names.
///
/// ## Errors
///
/// Only [`RegisterError::FieldRange`](crate::error::RegisterError::FieldRange),
/// which a validated catalog cannot produce.
///
/// ## Example
///
/// ```rust
/// use aplreg_core::catalog::Catalog;
/// use aplreg_core::dump::{compare, DiffStatus, Snapshot};
/// use aplreg_core::types::{Encoding, RawReading};
///
/// let catalog = Catalog::apple_silicon()?;
/// let hid0 = Encoding::new(3, 0, 15, 0, 0)?;
///
/// let mut a = Snapshot::new("before", None);
/// a.push(RawReading::succeeded("SYS_APL_HID0_EL1", hid0, 0))?;
/// let mut b = Snapshot::new("after", None);
/// b.push(RawReading::succeeded("SYS_APL_HID0_EL1", hid0, 1 << 20))?;
///
/// let diff = compare(&catalog, &a, &b)?;
/// assert_eq!(
///     diff.entries[0].status,
///     DiffStatus::Changed { fields: vec!["Loop Buffer Disable".to_string()] }
/// );
/// # Ok::<(), aplreg_core::error::RegisterError>(())
/// ```
pub fn compare(catalog: &Catalog, a: &Snapshot, b: &Snapshot) -> Result<Diff>
{
    let mut entries = Vec::with_capacity(a.len().max(b.len()));

    for before in a.readings() {
        let entry = match b.get(before.register_name()) {
            Some(after) if after.encoding() == before.encoding() => compare_pair(catalog, before, after)?,
            _ => DiffEntry {
                name: before.register_name().to_string(),
                encoding: before.encoding(),
                before: before.value(),
                after: None,
                status: DiffStatus::Removed,
            },
        };
        entries.push(entry);
    }

    for after in b.readings() {
        let matched = a
            .get(after.register_name())
            .is_some_and(|before| before.encoding() == after.encoding());
        if !matched {
            entries.push(DiffEntry {
                name: after.register_name().to_string(),
                encoding: after.encoding(),
                before: None,
                after: after.value(),
                status: DiffStatus::Added,
            });
        }
    }

    let diff = Diff { entries };
    debug!(a = a.label(), b = b.label(), summary = ?diff.summary(), "Snapshots compared");
    Ok(diff)
}

fn compare_pair(catalog: &Catalog, before: &RawReading, after: &RawReading) -> Result<DiffEntry>
{
    let status = match (before.value(), after.value()) {
        (Some(x), Some(y)) if x == y => DiffStatus::Unchanged,
        (Some(x), Some(y)) => {
            let definition = catalog
                .lookup_by_encoding(before.encoding())
                .or_else(|| catalog.lookup(before.register_name()));
            let fields = match definition {
                Some(def) => changed_fields(def, x, y)?,
                None => Vec::new(),
            };
            DiffStatus::Changed { fields }
        }
        _ => DiffStatus::Unreadable,
    };

    Ok(DiffEntry {
        name: before.register_name().to_string(),
        encoding: before.encoding(),
        before: before.value(),
        after: after.value(),
        status,
    })
}
