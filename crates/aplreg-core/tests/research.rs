//! Tests for the research helpers: probing, sampling and field inference

use std::time::Duration;

use aplreg_core::catalog::Catalog;
use aplreg_core::reader::{RegisterReader, StaticReader};
use aplreg_core::report::{behavior_text, probe_text};
use aplreg_core::research::{
    infer_fields, probe, sample, BehaviorSummary, BitStability, CandidateShape, EncodingRange, ValuePattern,
};
use aplreg_core::types::Encoding;
use aplreg_core::Result;

/// Counts up by one on every read, with bit 40 always set
struct TickingReader
{
    ticks: u64,
}

impl RegisterReader for TickingReader
{
    fn read_register(&mut self, _encoding: Encoding) -> Result<u64>
    {
        self.ticks += 1;
        Ok((1 << 40) | self.ticks)
    }
}

#[test]
fn test_probe_implementation_defined_space_skips_catalog()
{
    let catalog = Catalog::apple_silicon().unwrap();
    let range = EncodingRange::implementation_defined();
    let unknown = Encoding::new(3, 7, 15, 15, 7).unwrap();
    let mut reader = StaticReader::new().with_value(unknown, 0xFFFF_0000);

    let report = probe(&catalog, &mut reader, &range);

    let known = range.encodings().filter(|e| catalog.contains_encoding(*e)).count();
    assert_eq!(report.skipped_known, known);
    assert_eq!(report.hits.len() + known, range.len());
    assert_eq!(report.tally.succeeded, 1);
    assert_eq!(report.tally.failed, report.hits.len() - 1);

    let hit = report.responsive().next().unwrap();
    assert_eq!(hit.encoding, unknown);
    assert_eq!(hit.pattern(), Some(ValuePattern::HighBitsOnly));

    let text = probe_text(&report);
    assert!(text.contains("s3_7_c15_c15_7"));
    assert!(text.contains("sys_reg(3, 7, 15, 15, 7)"));
    assert!(text.contains("high_bits_only"));
}

#[test]
fn test_probe_single_encoding()
{
    let catalog = Catalog::apple_silicon().unwrap();
    let hid0 = catalog.lookup("SYS_APL_HID0_EL1").unwrap().encoding;
    let mut reader = StaticReader::new();

    let report = probe(&catalog, &mut reader, &EncodingRange::single(hid0));
    assert_eq!(report.skipped_known, 1);
    assert!(report.hits.is_empty());
    assert!(reader.reads().is_empty());
}

#[test]
fn test_sample_and_infer_counter()
{
    let encoding = Encoding::new(3, 2, 15, 0, 0).unwrap();
    let mut reader = TickingReader { ticks: 0 };

    let readings = sample(&mut reader, encoding, "PMC0", 8, Duration::ZERO).unwrap();
    assert_eq!(readings.len(), 8);

    let summary = BehaviorSummary::from_readings(&readings);
    assert_eq!(summary.succeeded, 8);
    assert_eq!(summary.unique_values.len(), 8);
    assert_eq!(summary.changes.len(), 7);
    assert!(!summary.is_stable());

    let inference = infer_fields(&readings).unwrap();
    assert_eq!(inference.samples(), 8);
    assert_eq!(inference.bit(40), BitStability::Static(true));
    assert_eq!(inference.bit(0), BitStability::Volatile);
    assert_eq!(inference.bit(63), BitStability::Static(false));

    let candidates = inference.candidates();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].shape, CandidateShape::Counter);
    assert_eq!(candidates[0].bits.low, 0);
    assert_eq!(candidates[0].bits.high, 3);

    let text = behavior_text("PMC0", &summary, Some(&inference));
    assert!(text.starts_with("PMC0: 8 samples (0 failed)"));
    assert!(text.contains("unstable"));
    assert!(text.contains("counter"));
}

#[test]
fn test_sample_of_unreadable_register()
{
    let encoding = Encoding::new(3, 2, 15, 0, 0).unwrap();
    let mut reader = StaticReader::new().with_failure(encoding, "undefined instruction");

    let readings = sample(&mut reader, encoding, "PMC0", 4, Duration::ZERO).unwrap();
    let summary = BehaviorSummary::from_readings(&readings);
    assert_eq!(summary.failed, 4);
    assert!(summary.unique_values.is_empty());
    assert!(infer_fields(&readings).is_err());
}
