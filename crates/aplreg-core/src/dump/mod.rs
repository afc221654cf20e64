//! # Dump/Compare Engine
//!
//! Bulk reads of catalogued registers into [`Snapshot`]s, persistence of
//! snapshots, and comparison of two snapshots.
//!
//! ## Dump lifecycle
//!
//! A dump moves through a small state machine:
//!
//! ```text
//! Idle -> Reading { completed, total } -> Aggregating -> Persisted | Displayed
//!   ^                                                          |
//!   +------------------- next dump / reset() ------------------+
//! ```
//!
//! Every selected register is read exactly once. A failed read is recorded
//! as a failed reading and the dump carries on; the final [`DumpTally`]
//! reports how many reads succeeded and failed. A dump is never aborted by
//! a read failure.

mod diff;
mod snapshot;

use std::fmt;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

pub use diff::{compare, Diff, DiffEntry, DiffStatus, DiffSummary};
pub use snapshot::{Snapshot, FORMAT_VERSION};
use tracing::{debug, info, info_span, warn};

use crate::catalog::Catalog;
use crate::codec::resolve;
use crate::error::Result;
use crate::parser::parse;
use crate::reader::{capture, RegisterReader};
use crate::report::{self, OutputFormat};
use crate::types::{Category, ParsedField, RawReading, RegisterDefinition};

/// Where a dump operation currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpState
{
    /// No dump in progress
    Idle,
    /// Reading registers
    Reading
    {
        completed: usize,
        total: usize,
    },
    /// All reads done; building the report
    Aggregating,
    /// The last report was written to a file
    Persisted(PathBuf),
    /// The last report was rendered for display
    Displayed,
}

/// Succeeded and failed read counts of a dump or probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpTally
{
    pub succeeded: usize,
    pub failed: usize,
}

impl DumpTally
{
    /// Tally a sequence of readings
    pub fn of<'a>(readings: impl IntoIterator<Item = &'a RawReading>) -> Self
    {
        let mut tally = DumpTally::default();
        for reading in readings {
            tally.record(reading);
        }
        tally
    }

    pub fn record(&mut self, reading: &RawReading)
    {
        if reading.success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub const fn total(&self) -> usize
    {
        self.succeeded + self.failed
    }
}

impl fmt::Display for DumpTally
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self.failed {
            0 => write!(f, "completed with no failures"),
            1 => write!(f, "completed with 1 failure"),
            n => write!(f, "completed with {n} failures"),
        }
    }
}

/// Result of one dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport
{
    pub snapshot: Snapshot,
    pub tally: DumpTally,
    /// The progress callback stopped the dump before every register was read
    pub interrupted: bool,
}

/// One register read and decoded
#[derive(Debug, Clone)]
pub struct RegisterReport<'c>
{
    pub definition: &'c RegisterDefinition,
    pub reading: RawReading,
    pub fields: Vec<ParsedField>,
}

/// Drives dumps against a catalog and a reader
///
/// ## Example
///
/// ```rust
/// use aplreg_core::catalog::Catalog;
/// use aplreg_core::dump::DumpEngine;
/// use aplreg_core::reader::StaticReader;
/// use aplreg_core::types::{Category, Encoding};
///
/// let catalog = Catalog::apple_silicon()?;
/// let mut reader = StaticReader::new().with_value(Encoding::new(3, 0, 15, 0, 0)?, 0x10);
/// let mut engine = DumpEngine::new(&catalog, &mut reader);
///
/// let report = engine.dump("boot", Some(Category::Hid));
/// assert_eq!(report.tally.succeeded, 1);
/// assert_eq!(report.snapshot.len(), catalog.list(Some(Category::Hid)).len());
/// # Ok::<(), aplreg_core::error::RegisterError>(())
/// ```
pub struct DumpEngine<'c, 'r, R: RegisterReader + ?Sized>
{
    catalog: &'c Catalog,
    reader: &'r mut R,
    state: DumpState,
}

impl<'c, 'r, R: RegisterReader + ?Sized> DumpEngine<'c, 'r, R>
{
    pub fn new(catalog: &'c Catalog, reader: &'r mut R) -> Self
    {
        DumpEngine {
            catalog,
            reader,
            state: DumpState::Idle,
        }
    }

    pub fn state(&self) -> &DumpState
    {
        &self.state
    }

    pub fn catalog(&self) -> &'c Catalog
    {
        self.catalog
    }

    /// Return to `Idle`
    pub fn reset(&mut self)
    {
        self.transition(DumpState::Idle);
    }

    /// Read every register of `filter` (or all) once
    pub fn dump(&mut self, label: &str, filter: Option<Category>) -> DumpReport
    {
        self.dump_with_progress(label, filter, |_| ControlFlow::Continue(()))
    }

    /// Like [`DumpEngine::dump`], calling `progress` after each read
    ///
    /// Returning `ControlFlow::Break(())` stops the dump. The report then
    /// holds the readings taken so far and is marked interrupted.
    pub fn dump_with_progress<F>(&mut self, label: &str, filter: Option<Category>, mut progress: F) -> DumpReport
    where
        F: FnMut(&RawReading) -> ControlFlow<()>,
    {
        if self.state != DumpState::Idle {
            self.reset();
        }

        let category = filter.map_or("all", Category::as_str);
        let _span = info_span!("dump", label, category).entered();

        let targets = self.catalog.list(filter);
        let total = targets.len();
        let mut snapshot = Snapshot::new(label, filter);
        let mut tally = DumpTally::default();
        let mut interrupted = false;

        self.transition(DumpState::Reading { completed: 0, total });
        for (index, def) in targets.into_iter().enumerate() {
            let reading = capture(&mut *self.reader, &def.name, def.encoding);
            tally.record(&reading);
            let flow = progress(&reading);
            if let Err(err) = snapshot.push(reading) {
                warn!(%err, "Reading dropped from snapshot");
            }

            self.state = DumpState::Reading {
                completed: index + 1,
                total,
            };

            if flow.is_break() {
                interrupted = true;
                info!(completed = index + 1, total, "Dump interrupted");
                break;
            }
        }

        self.transition(DumpState::Aggregating);
        info!(succeeded = tally.succeeded, failed = tally.failed, "Dump {}", tally);

        DumpReport {
            snapshot,
            tally,
            interrupted,
        }
    }

    /// Resolve, read and decode one register
    ///
    /// Unlike a dump, a failed read is an error here.
    pub fn read_one(&mut self, name_or_encoding: &str) -> Result<RegisterReport<'c>>
    {
        let definition = resolve(self.catalog, name_or_encoding)?;
        let reading = capture(&mut *self.reader, &definition.name, definition.encoding);
        let fields = parse(definition, &reading)?;

        Ok(RegisterReport {
            definition,
            reading,
            fields,
        })
    }

    /// Save a report's snapshot to `path`
    pub fn persist(&mut self, report: &DumpReport, path: impl AsRef<Path>) -> Result<()>
    {
        let path = path.as_ref();
        report.snapshot.save(path)?;
        info!(path = %path.display(), registers = report.snapshot.len(), "Snapshot persisted");
        self.transition(DumpState::Persisted(path.to_path_buf()));
        Ok(())
    }

    /// Render a report for display
    pub fn display(&mut self, report: &DumpReport, format: OutputFormat) -> Result<String>
    {
        let rendered = match format {
            OutputFormat::Text => report::dump_table(self.catalog, report),
            OutputFormat::Json => report.snapshot.to_json()?,
        };
        self.transition(DumpState::Displayed);
        Ok(rendered)
    }

    fn transition(&mut self, next: DumpState)
    {
        debug!(from = ?self.state, to = ?next, "Dump state transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::reader::StaticReader;
    use crate::types::{Encoding, FieldDefinition};

    fn fixture() -> Catalog
    {
        Catalog::new(vec![
            RegisterDefinition::new("A", Encoding::new_unchecked(3, 0, 15, 0, 0), Category::Hid)
                .with_field(FieldDefinition::flag(3, "Bit 3")),
            RegisterDefinition::new("B", Encoding::new_unchecked(3, 0, 15, 1, 0), Category::Hid),
            RegisterDefinition::new("C", Encoding::new_unchecked(3, 1, 15, 0, 0), Category::PerfCounter),
        ])
        .unwrap()
    }

    #[test]
    fn test_tally_display()
    {
        let tally = |succeeded, failed| DumpTally { succeeded, failed };
        assert_eq!(tally(3, 0).to_string(), "completed with no failures");
        assert_eq!(tally(9, 1).to_string(), "completed with 1 failure");
        assert_eq!(tally(0, 4).to_string(), "completed with 4 failures");
    }

    #[test]
    fn test_state_transitions()
    {
        let catalog = fixture();
        let mut reader = StaticReader::new();
        let mut engine = DumpEngine::new(&catalog, &mut reader);
        assert_eq!(engine.state(), &DumpState::Idle);

        let report = engine.dump("t", None);
        assert_eq!(engine.state(), &DumpState::Aggregating);

        engine.display(&report, OutputFormat::Text).unwrap();
        assert_eq!(engine.state(), &DumpState::Displayed);

        engine.reset();
        assert_eq!(engine.state(), &DumpState::Idle);
    }

    #[test]
    fn test_progress_sees_running_count()
    {
        let catalog = fixture();
        let mut reader = StaticReader::new();
        let mut engine = DumpEngine::new(&catalog, &mut reader);

        let mut seen = Vec::new();
        let report = engine.dump_with_progress("t", None, |reading| {
            seen.push(reading.register_name().to_string());
            ControlFlow::Continue(())
        });
        assert_eq!(seen, vec!["A", "B", "C"]);
        assert!(!report.interrupted);
    }

    #[test]
    fn test_read_one_failure_is_error()
    {
        let catalog = fixture();
        let mut reader = StaticReader::new().with_failure(Encoding::new_unchecked(3, 0, 15, 0, 0), "denied");
        let mut engine = DumpEngine::new(&catalog, &mut reader);
        assert!(matches!(
            engine.read_one("A"),
            Err(crate::error::RegisterError::ReadFailure { .. })
        ));
        assert!(matches!(
            engine.read_one("Z"),
            Err(crate::error::RegisterError::UnresolvedRegister(_))
        ));
    }
}
