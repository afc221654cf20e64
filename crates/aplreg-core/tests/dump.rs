//! Tests for dumps, snapshot persistence and comparison

use aplreg_core::catalog::Catalog;
use aplreg_core::dump::{compare, DiffStatus, DumpEngine, DumpState, Snapshot};
use aplreg_core::reader::{ReplayReader, StaticReader};
use aplreg_core::report::OutputFormat;
use aplreg_core::types::{Category, Encoding, FieldDefinition, RawReading, RegisterDefinition};

fn enc(crm: u8, op2: u8) -> Encoding
{
    Encoding::new(3, 0, 15, crm, op2).unwrap()
}

/// Ten HID registers, `HID0`..`HID9`
fn ten_registers() -> Catalog
{
    let definitions = (0..10u8)
        .map(|i| RegisterDefinition::new(format!("HID{i}"), enc(i, 0), Category::Hid))
        .collect();
    Catalog::new(definitions).unwrap()
}

#[test]
fn test_one_failure_does_not_abort_dump()
{
    let catalog = ten_registers();
    let mut reader = StaticReader::new();
    for i in 0..10u8 {
        if i == 4 {
            reader.set_failure(enc(i, 0), "undefined instruction");
        } else {
            reader.set_value(enc(i, 0), u64::from(i) << 8);
        }
    }

    let mut engine = DumpEngine::new(&catalog, &mut reader);
    let report = engine.dump("boot", None);

    assert_eq!(report.snapshot.len(), 10);
    assert_eq!(report.tally.succeeded, 9);
    assert_eq!(report.tally.failed, 1);
    assert_eq!(report.tally.to_string(), "completed with 1 failure");
    assert!(!report.interrupted);

    let failed = report.snapshot.get("HID4").unwrap();
    assert!(!failed.success());
    assert_eq!(failed.value(), None);
    assert_eq!(failed.error_detail(), Some("undefined instruction"));
    assert_eq!(report.snapshot.get("HID9").unwrap().value(), Some(0x900));

    // every register read exactly once
    assert_eq!(reader.reads().len(), 10);
}

#[test]
fn test_empty_filter_is_not_an_error()
{
    let catalog = ten_registers();
    let mut reader = StaticReader::new();
    let mut engine = DumpEngine::new(&catalog, &mut reader);

    let report = engine.dump("empty", Some(Category::PowerManagement));
    assert!(report.snapshot.is_empty());
    assert_eq!(report.tally.succeeded, 0);
    assert_eq!(report.tally.failed, 0);
    assert_eq!(report.snapshot.category_filter(), Some(Category::PowerManagement));
}

#[test]
fn test_interrupted_dump_keeps_partial_readings()
{
    let catalog = ten_registers();
    let mut reader = StaticReader::new();
    let mut engine = DumpEngine::new(&catalog, &mut reader);

    let mut seen = 0;
    let report = engine.dump_with_progress("partial", None, |_| {
        seen += 1;
        if seen == 3 {
            std::ops::ControlFlow::Break(())
        } else {
            std::ops::ControlFlow::Continue(())
        }
    });

    assert!(report.interrupted);
    assert_eq!(report.snapshot.len(), 3);
    assert_eq!(report.tally.total(), 3);
}

#[test]
fn test_persist_then_load_round_trip()
{
    let mut snapshot = Snapshot::new("round trip", Some(Category::Hid));
    snapshot.push(RawReading::succeeded("HID0", enc(0, 0), 0x1000_2990_120e_0e00)).unwrap();
    snapshot.push(RawReading::failed("HID1", enc(1, 0), "undefined instruction")).unwrap();
    snapshot.push(RawReading::succeeded("HID2", enc(2, 0), 0)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    snapshot.save(&path).unwrap();
    let loaded = Snapshot::load(&path).unwrap();

    assert_eq!(loaded.len(), 3);
    let flags: Vec<bool> = loaded.readings().iter().map(RawReading::success).collect();
    assert_eq!(flags, vec![true, false, true]);
    let values: Vec<Option<u64>> = loaded.readings().iter().map(RawReading::value).collect();
    assert_eq!(values, vec![Some(0x1000_2990_120e_0e00), None, Some(0)]);
    assert_eq!(loaded, snapshot);
}

#[test]
fn test_engine_persists_and_replays()
{
    let catalog = ten_registers();
    let mut reader = StaticReader::new().with_failure(enc(9, 0), "busy");
    for i in 0..9u8 {
        reader.set_value(enc(i, 0), 0xdead + u64::from(i));
    }
    let mut engine = DumpEngine::new(&catalog, &mut reader);
    let report = engine.dump("live", None);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("live.json");
    engine.persist(&report, &path).unwrap();
    assert_eq!(engine.state(), &DumpState::Persisted(path.clone()));

    let mut replay = ReplayReader::load(&path).unwrap();
    assert_eq!(replay.label(), "live");
    let mut engine = DumpEngine::new(&catalog, &mut replay);
    let again = engine.dump("replayed", None);

    assert_eq!(again.tally, report.tally);
    assert_eq!(again.snapshot.get("HID0").unwrap().value(), Some(0xdead));

    assert_eq!(again.snapshot.get("HID9").unwrap().error_detail(), Some("busy"));

    let diff = compare(&catalog, &report.snapshot, &again.snapshot).unwrap();
    let summary = diff.summary();
    assert_eq!((summary.unchanged, summary.unreadable), (9, 1));
}

#[test]
fn test_compare_names_fields_on_changed_bit()
{
    let x = enc(0, 0);
    let catalog = Catalog::new(vec![
        RegisterDefinition::new("X", x, Category::Hid).with_fields([
            FieldDefinition::raw(2, 0, "Low"),
            FieldDefinition::counter(5, 3, "Window"),
            FieldDefinition::flag(7, "Top"),
        ]),
    ])
    .unwrap();

    let mut a = Snapshot::new("a", None);
    a.push(RawReading::succeeded("X", x, 0x10)).unwrap();
    let mut b = Snapshot::new("b", None);
    b.push(RawReading::succeeded("X", x, 0x18)).unwrap();

    let diff = compare(&catalog, &a, &b).unwrap();
    assert_eq!(
        diff.get("X").unwrap().status,
        DiffStatus::Changed {
            fields: vec![String::from("Window")]
        }
    );
}

#[test]
fn test_compare_statuses()
{
    let catalog = ten_registers();

    let mut a = Snapshot::new("a", None);
    a.push(RawReading::succeeded("HID0", enc(0, 0), 1)).unwrap();
    a.push(RawReading::succeeded("HID1", enc(1, 0), 1)).unwrap();
    a.push(RawReading::failed("HID2", enc(2, 0), "busy")).unwrap();

    let mut b = Snapshot::new("b", None);
    b.push(RawReading::succeeded("HID0", enc(0, 0), 1)).unwrap();
    b.push(RawReading::succeeded("HID2", enc(2, 0), 5)).unwrap();
    b.push(RawReading::succeeded("HID3", enc(3, 0), 7)).unwrap();

    let diff = compare(&catalog, &a, &b).unwrap();
    let statuses: Vec<(&str, &str)> = diff
        .entries
        .iter()
        .map(|e| (e.name.as_str(), e.status.name()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("HID0", "unchanged"),
            ("HID1", "removed"),
            ("HID2", "unreadable"),
            ("HID3", "added"),
        ]
    );

    let summary = diff.summary();
    assert_eq!(
        (summary.unchanged, summary.removed, summary.unreadable, summary.added),
        (1, 1, 1, 1)
    );
    assert!(!diff.is_identical());
}

#[test]
fn test_display_formats()
{
    let catalog = ten_registers();
    let mut reader = StaticReader::new().with_value(enc(0, 0), 0x10);
    let mut engine = DumpEngine::new(&catalog, &mut reader);
    let report = engine.dump("shown", None);

    let text = engine.display(&report, OutputFormat::Text).unwrap();
    assert!(text.contains("HID0"));
    assert!(text.contains("0x0000000000000010"));
    assert!(text.contains("completed with 9 failures"));
    assert_eq!(engine.state(), &DumpState::Displayed);

    let json = engine.display(&report, OutputFormat::Json).unwrap();
    let parsed = Snapshot::from_json(&json).unwrap();
    assert_eq!(parsed, report.snapshot);
}

#[test]
fn test_compare_splits_name_reused_at_new_encoding()
{
    let catalog = ten_registers();

    let mut a = Snapshot::new("a", None);
    a.push(RawReading::succeeded("X", enc(0, 0), 1)).unwrap();
    let mut b = Snapshot::new("b", None);
    b.push(RawReading::succeeded("X", enc(1, 0), 1)).unwrap();

    let diff = compare(&catalog, &a, &b).unwrap();
    let entries: Vec<(&str, String, &str)> = diff
        .entries
        .iter()
        .map(|e| (e.name.as_str(), e.encoding.to_string(), e.status.name()))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("X", String::from("s3_0_c15_c0_0"), "removed"),
            ("X", String::from("s3_0_c15_c1_0"), "added"),
        ]
    );
}
