//! Tests for error handling

use aplreg_core::codec::parse_canonical_string;
use aplreg_core::dump::Snapshot;
use aplreg_core::error::{EncodingError, RegisterError, Result};
use aplreg_core::parser::{extract_bits, parse, parse_value};
use aplreg_core::types::{BitRange, Category, Encoding, FieldDefinition, RawReading, RegisterDefinition};

#[test]
fn test_encoding_error_display()
{
    let error = parse_canonical_string("s3_0_c15_c0").unwrap_err();
    assert!(matches!(error, EncodingError::ComponentCount { found: 4, .. }));
    assert!(error.to_string().contains("found 4"));

    let error = parse_canonical_string("s3_9_c15_c0_0").unwrap_err();
    assert_eq!(error.to_string(), "op1 = 9 is out of range 0..=7");
}

#[test]
fn test_encoding_error_converts()
{
    fn parse(text: &str) -> Result<u16>
    {
        Ok(parse_canonical_string(text)?.packed())
    }

    let error = parse("s3_0_c15_c0_x").unwrap_err();
    assert!(matches!(error, RegisterError::Parse(_)));
    assert!(error.to_string().starts_with("invalid encoding:"));
}

#[test]
fn test_read_failure_display()
{
    let error = RegisterError::ReadFailure {
        register: String::from("SYS_APL_HID0_EL1"),
        detail: String::from("undefined instruction"),
    };
    assert_eq!(error.to_string(), "failed to read SYS_APL_HID0_EL1: undefined instruction");
}

#[test]
fn test_catalog_integrity_names_registers()
{
    let error = RegisterError::CatalogIntegrity {
        registers: vec![String::from("A"), String::from("C")],
        violations: vec![String::from("A and C share s3_0_c15_c0_0")],
    };
    let message = error.to_string();
    assert!(message.contains("A, C"));
    assert!(message.contains("share s3_0_c15_c0_0"));
}

#[test]
fn test_field_range_propagates()
{
    let error = extract_bits(0, BitRange::new(2, 5)).unwrap_err();
    assert!(matches!(error, RegisterError::FieldRange { high: 2, low: 5, .. }));
}

#[test]
fn test_parse_names_register_and_field_on_bad_range()
{
    // Built directly, so catalog validation never sees the bad field
    let encoding = Encoding::new(3, 0, 15, 0, 0).unwrap();
    let definition = RegisterDefinition::new("BROKEN_EL1", encoding, Category::Hid)
        .with_fields([FieldDefinition::flag(0, "Ok"), FieldDefinition::raw(70, 64, "Past The End")]);

    let field_range = |error: RegisterError| match error {
        RegisterError::FieldRange {
            register,
            field,
            high,
            low,
        } => (register, field, high, low),
        other => panic!("unexpected error: {other}"),
    };
    let want = (String::from("BROKEN_EL1"), String::from("Past The End"), 70, 64);

    assert_eq!(field_range(parse_value(&definition, u64::MAX).unwrap_err()), want);

    let reading = RawReading::succeeded("BROKEN_EL1", encoding, 1);
    let error = parse(&definition, &reading).unwrap_err();
    assert_eq!(
        error.to_string(),
        "field `Past The End` of BROKEN_EL1 has invalid bit range [70:64]"
    );
}

#[test]
fn test_io_and_json_errors_convert()
{
    let missing = Snapshot::load("/nonexistent/aplreg/snapshot.json").unwrap_err();
    assert!(matches!(missing, RegisterError::Io(_)));

    let garbage = Snapshot::from_json("{ not json").unwrap_err();
    assert!(matches!(garbage, RegisterError::Json(_)));
}

#[test]
fn test_error_is_send_and_sync()
{
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RegisterError>();
}
