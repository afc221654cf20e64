//! # Research/Discovery Helper
//!
//! Tools for looking at registers the catalog does not describe yet.
//!
//! - [`probe`] sweeps a range of encodings and reads every one the catalog
//!   does not already know
//! - [`sample`] reads one register repeatedly and [`BehaviorSummary`]
//!   describes how its value moved
//! - [`infer_fields`] marks each bit of a sample set as static or volatile
//!   and proposes candidate field boundaries
//!
//! Everything here is advisory. Results are typed separately from
//! [`RegisterDefinition`](crate::types::RegisterDefinition) and there is no
//! conversion between them: adding a register or field to the catalog is a
//! decision for a human, not for a heuristic.

mod inference;

use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::thread;
use std::time::Duration;

pub use inference::{infer_fields, BitStability, CandidateField, CandidateShape, FieldInference};
use tracing::{debug, info, info_span};

use crate::catalog::Catalog;
use crate::dump::DumpTally;
use crate::error::{EncodingComponent, RegisterError, Result};
use crate::reader::{capture, RegisterReader};
use crate::types::encoding::check;
use crate::types::{Encoding, RawReading};

/// Inclusive bounds for each encoding component
///
/// ## Example
///
/// ```rust
/// use aplreg_core::research::EncodingRange;
///
/// let range = EncodingRange::new(3..=3, 0..=0, 15..=15, 0..=1, 0..=7)?;
/// assert_eq!(range.len(), 16);
/// assert_eq!(range.encodings().next().unwrap().to_string(), "s3_0_c15_c0_0");
/// # Ok::<(), aplreg_core::error::RegisterError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingRange
{
    op0: RangeInclusive<u8>,
    op1: RangeInclusive<u8>,
    crn: RangeInclusive<u8>,
    crm: RangeInclusive<u8>,
    op2: RangeInclusive<u8>,
}

impl EncodingRange
{
    /// Build a range, validating each bound like an encoding component
    ///
    /// ## Errors
    ///
    /// - [`RegisterError::Parse`] if a bound is outside the component's range
    /// - [`RegisterError::InvalidArgument`] if a range is empty (`start > end`)
    pub fn new(
        op0: RangeInclusive<u8>,
        op1: RangeInclusive<u8>,
        crn: RangeInclusive<u8>,
        crm: RangeInclusive<u8>,
        op2: RangeInclusive<u8>,
    ) -> Result<Self>
    {
        validate(EncodingComponent::Op0, &op0, 2, 3)?;
        validate(EncodingComponent::Op1, &op1, 0, 7)?;
        validate(EncodingComponent::CRn, &crn, 0, 15)?;
        validate(EncodingComponent::CRm, &crm, 0, 15)?;
        validate(EncodingComponent::Op2, &op2, 0, 7)?;

        Ok(EncodingRange {
            op0,
            op1,
            crn,
            crm,
            op2,
        })
    }

    /// The implementation-defined space `s3_<0-7>_c15_c<0-15>_<0-7>`
    pub fn implementation_defined() -> Self
    {
        EncodingRange {
            op0: 3..=3,
            op1: 0..=7,
            crn: 15..=15,
            crm: 0..=15,
            op2: 0..=7,
        }
    }

    /// A range holding exactly one encoding
    pub fn single(encoding: Encoding) -> Self
    {
        let (op0, op1, crn, crm, op2) = encoding.parts();
        EncodingRange {
            op0: op0..=op0,
            op1: op1..=op1,
            crn: crn..=crn,
            crm: crm..=crm,
            op2: op2..=op2,
        }
    }

    /// Every encoding in the range, in ascending component order
    pub fn encodings(&self) -> impl Iterator<Item = Encoding> + '_
    {
        self.op0.clone().flat_map(move |op0| {
            self.op1.clone().flat_map(move |op1| {
                self.crn.clone().flat_map(move |crn| {
                    self.crm.clone().flat_map(move |crm| {
                        self.op2
                            .clone()
                            .map(move |op2| Encoding::new_unchecked(op0, op1, crn, crm, op2))
                    })
                })
            })
        })
    }

    /// Number of encodings in the range
    pub fn len(&self) -> usize
    {
        [&self.op0, &self.op1, &self.crn, &self.crm, &self.op2]
            .iter()
            .map(|r| usize::from(r.end() - r.start()) + 1)
            .product()
    }

    /// Always false: every component range holds at least one value
    pub fn is_empty(&self) -> bool
    {
        false
    }
}

impl fmt::Display for EncodingRange
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let part = |r: &RangeInclusive<u8>| {
            if r.start() == r.end() {
                r.start().to_string()
            } else {
                format!("{}-{}", r.start(), r.end())
            }
        };
        write!(
            f,
            "s{}_{}_c{}_c{}_{}",
            part(&self.op0),
            part(&self.op1),
            part(&self.crn),
            part(&self.crm),
            part(&self.op2)
        )
    }
}

fn validate(component: EncodingComponent, range: &RangeInclusive<u8>, min: u8, max: u8) -> Result<()>
{
    check(component, i64::from(*range.start()), min, max)?;
    check(component, i64::from(*range.end()), min, max)?;
    if range.start() > range.end() {
        return Err(RegisterError::InvalidArgument(format!(
            "{component} range {}-{} is empty",
            range.start(),
            range.end()
        )));
    }
    Ok(())
}

/// Rough shape of a raw value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValuePattern
{
    Zero,
    AllOnes,
    /// Low 16 bits clear
    HighBitsOnly,
    /// Top 16 bits clear
    LowBitsOnly,
    Mixed,
}

impl ValuePattern
{
    pub const fn as_str(self) -> &'static str
    {
        match self {
            ValuePattern::Zero => "zero",
            ValuePattern::AllOnes => "all_ones",
            ValuePattern::HighBitsOnly => "high_bits_only",
            ValuePattern::LowBitsOnly => "low_bits_only",
            ValuePattern::Mixed => "mixed",
        }
    }
}

impl fmt::Display for ValuePattern
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.as_str())
    }
}

/// Classify a value; earlier patterns win (zero is not "high bits only")
pub const fn classify_value(value: u64) -> ValuePattern
{
    if value == 0 {
        ValuePattern::Zero
    } else if value == u64::MAX {
        ValuePattern::AllOnes
    } else if value & 0xFFFF == 0 {
        ValuePattern::HighBitsOnly
    } else if value >> 48 == 0 {
        ValuePattern::LowBitsOnly
    } else {
        ValuePattern::Mixed
    }
}

/// One probed encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHit
{
    pub encoding: Encoding,
    pub reading: RawReading,
}

impl ProbeHit
{
    /// Pattern of the value, `None` if the read failed
    pub fn pattern(&self) -> Option<ValuePattern>
    {
        self.reading.value().map(classify_value)
    }
}

/// Result of a probe sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport
{
    /// One entry per uncatalogued encoding, in sweep order
    pub hits: Vec<ProbeHit>,
    pub tally: DumpTally,
    /// Encodings skipped because the catalog already knows them
    pub skipped_known: usize,
}

impl ProbeReport
{
    /// Encodings that could be read at all
    pub fn responsive(&self) -> impl Iterator<Item = &ProbeHit>
    {
        self.hits.iter().filter(|hit| hit.reading.success())
    }

    /// Readable encodings with a non-zero value
    pub fn nonzero(&self) -> impl Iterator<Item = &ProbeHit>
    {
        self.responsive().filter(|hit| hit.reading.value().is_some_and(|v| v != 0))
    }
}

/// Read every uncatalogued encoding in `range` once
///
/// Read failures are recorded on the individual hit; the sweep always runs
/// to the end of the range.
pub fn probe<R: RegisterReader + ?Sized>(catalog: &Catalog, reader: &mut R, range: &EncodingRange) -> ProbeReport
{
    let _span = info_span!("probe", %range).entered();
    let mut report = ProbeReport::default();

    for encoding in range.encodings() {
        if catalog.contains_encoding(encoding) {
            report.skipped_known += 1;
            continue;
        }

        let reading = capture(reader, &encoding.to_string(), encoding);
        report.tally.record(&reading);
        report.hits.push(ProbeHit { encoding, reading });
    }

    info!(
        probed = report.hits.len(),
        skipped = report.skipped_known,
        responsive = report.tally.succeeded,
        "Probe {}",
        report.tally
    );
    report
}

/// Read one register `iterations` times, pausing `interval` between reads
///
/// ## Errors
///
/// [`RegisterError::InvalidArgument`] if `iterations` is zero. Read failures
/// are recorded on the readings.
pub fn sample<R: RegisterReader + ?Sized>(
    reader: &mut R,
    encoding: Encoding,
    name: &str,
    iterations: usize,
    interval: Duration,
) -> Result<Vec<RawReading>>
{
    if iterations == 0 {
        return Err(RegisterError::InvalidArgument(String::from("iterations must be at least 1")));
    }

    let mut readings = Vec::with_capacity(iterations);
    for i in 0..iterations {
        if i > 0 && !interval.is_zero() {
            thread::sleep(interval);
        }
        readings.push(capture(reader, name, encoding));
    }

    debug!(register = name, iterations, "Sampling finished");
    Ok(readings)
}

/// A value change between two consecutive successful samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueChange
{
    /// Index of the reading that saw the new value
    pub iteration: usize,
    pub old: u64,
    pub new: u64,
}

/// How a register behaved over a series of samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviorSummary
{
    pub iterations: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Distinct values seen, ascending
    pub unique_values: Vec<u64>,
    pub changes: Vec<ValueChange>,
}

impl BehaviorSummary
{
    pub fn from_readings(readings: &[RawReading]) -> Self
    {
        let mut unique = BTreeSet::new();
        let mut changes = Vec::new();
        let mut previous: Option<u64> = None;
        let mut succeeded = 0;

        for (iteration, reading) in readings.iter().enumerate() {
            let Some(value) = reading.value() else {
                continue;
            };
            succeeded += 1;
            unique.insert(value);
            if let Some(old) = previous.filter(|&old| old != value) {
                changes.push(ValueChange {
                    iteration,
                    old,
                    new: value,
                });
            }
            previous = Some(value);
        }

        BehaviorSummary {
            iterations: readings.len(),
            succeeded,
            failed: readings.len() - succeeded,
            unique_values: unique.into_iter().collect(),
            changes,
        }
    }

    /// At least one successful read and no value changes
    pub fn is_stable(&self) -> bool
    {
        self.succeeded > 0 && self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::reader::StaticReader;
    use crate::types::{Category, RegisterDefinition};

    #[test]
    fn test_classify_value()
    {
        assert_eq!(classify_value(0), ValuePattern::Zero);
        assert_eq!(classify_value(u64::MAX), ValuePattern::AllOnes);
        assert_eq!(classify_value(0xFFFF_0000), ValuePattern::HighBitsOnly);
        assert_eq!(classify_value(0x1234), ValuePattern::LowBitsOnly);
        assert_eq!(classify_value(0x1000_0000_0000_0001), ValuePattern::Mixed);
    }

    #[test]
    fn test_range_validation()
    {
        assert!(matches!(
            EncodingRange::new(1..=3, 0..=0, 0..=0, 0..=0, 0..=0),
            Err(RegisterError::Parse(_))
        ));
        assert!(matches!(
            EncodingRange::new(3..=3, 0..=8, 0..=0, 0..=0, 0..=0),
            Err(RegisterError::Parse(_))
        ));
        assert!(matches!(
            EncodingRange::new(3..=3, 5..=2, 0..=0, 0..=0, 0..=0),
            Err(RegisterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_implementation_defined_space()
    {
        let range = EncodingRange::implementation_defined();
        assert_eq!(range.len(), 8 * 16 * 8);
        assert_eq!(range.encodings().count(), range.len());
        assert_eq!(range.to_string(), "s3_0-7_c15_c0-15_0-7");
    }

    #[test]
    fn test_probe_skips_known_and_records_failures()
    {
        let known = Encoding::new_unchecked(3, 0, 15, 0, 0);
        let catalog = Catalog::new(vec![RegisterDefinition::new("KNOWN", known, Category::Hid)]).unwrap();
        let mut reader = StaticReader::new()
            .with_value(Encoding::new_unchecked(3, 0, 15, 0, 1), 0)
            .with_value(Encoding::new_unchecked(3, 0, 15, 0, 2), 0xFF);

        let range = EncodingRange::new(3..=3, 0..=0, 15..=15, 0..=0, 0..=3).unwrap();
        let report = probe(&catalog, &mut reader, &range);

        assert_eq!(report.skipped_known, 1);
        assert_eq!(report.hits.len(), 3);
        assert_eq!(report.tally, DumpTally { succeeded: 2, failed: 1 });
        assert_eq!(report.responsive().count(), 2);
        let nonzero: Vec<String> = report.nonzero().map(|h| h.encoding.to_string()).collect();
        assert_eq!(nonzero, vec!["s3_0_c15_c0_2"]);
        assert!(!reader.reads().contains(&known));
    }

    #[test]
    fn test_behavior_summary()
    {
        let enc = Encoding::new_unchecked(3, 2, 15, 0, 0);
        let readings = vec![
            RawReading::succeeded("PMC0", enc, 1),
            RawReading::succeeded("PMC0", enc, 1),
            RawReading::failed("PMC0", enc, "busy"),
            RawReading::succeeded("PMC0", enc, 5),
        ];

        let summary = BehaviorSummary::from_readings(&readings);
        assert_eq!(summary.iterations, 4);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.unique_values, vec![1, 5]);
        assert_eq!(
            summary.changes,
            vec![ValueChange {
                iteration: 3,
                old: 1,
                new: 5
            }]
        );
        assert!(!summary.is_stable());
    }

    #[test]
    fn test_sample_rejects_zero_iterations()
    {
        let mut reader = StaticReader::new();
        let enc = Encoding::new_unchecked(3, 0, 15, 0, 0);
        assert!(sample(&mut reader, enc, "X", 0, Duration::ZERO).is_err());
        assert_eq!(sample(&mut reader, enc, "X", 3, Duration::ZERO).unwrap().len(), 3);
        assert_eq!(reader.reads().len(), 3);
    }
}
