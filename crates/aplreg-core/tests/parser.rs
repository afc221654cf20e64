//! Tests for the bitfield parser

use aplreg_core::catalog::Catalog;
use aplreg_core::error::RegisterError;
use aplreg_core::parser::{changed_fields, parse, parse_value};
use aplreg_core::types::{Category, Encoding, Enumeration, FieldDefinition, RawReading, RegisterDefinition};

fn power_state() -> RegisterDefinition
{
    RegisterDefinition::new("PWR_STATE", Encoding::new(3, 0, 15, 4, 0).unwrap(), Category::PowerManagement)
        .with_field(FieldDefinition::enumerated(
            2,
            0,
            "State",
            Enumeration::new().with(5, "disabled"),
        ))
        .with_field(FieldDefinition::flag(3, "Lock"))
        .with_field(FieldDefinition::counter(15, 8, "Residency"))
        .with_field(FieldDefinition::signed(23, 16, "Offset"))
        .with_field(FieldDefinition::raw(31, 24, "Reserved"))
}

fn rendered(fields: &[aplreg_core::types::ParsedField], label: &str) -> String
{
    fields
        .iter()
        .find(|f| f.label == label)
        .map(|f| f.rendered_text.clone())
        .unwrap_or_default()
}

#[test]
fn test_mapped_enum_value()
{
    let fields = parse_value(&power_state(), 5).unwrap();
    assert_eq!(rendered(&fields, "State"), "disabled");
}

#[test]
fn test_unmapped_enum_value_is_rendered_not_rejected()
{
    let fields = parse_value(&power_state(), 7).unwrap();
    assert_eq!(rendered(&fields, "State"), "unknown(7)");
    assert_eq!(fields[0].raw_subvalue, 7);
}

#[test]
fn test_every_kind_renders()
{
    let value = 0xAB_FE_2A_0D_u64;
    let fields = parse_value(&power_state(), value).unwrap();

    assert_eq!(fields.len(), 5);
    assert_eq!(rendered(&fields, "Lock"), "set");
    assert_eq!(rendered(&fields, "Residency"), "42 (0x2a)");
    assert_eq!(rendered(&fields, "Offset"), "-2 (0xfe)");
    assert_eq!(rendered(&fields, "Reserved"), "171 (0xab)");
}

#[test]
fn test_fields_keep_definition_order()
{
    let labels: Vec<String> = parse_value(&power_state(), 0)
        .unwrap()
        .into_iter()
        .map(|f| f.label)
        .collect();
    assert_eq!(labels, vec!["State", "Lock", "Residency", "Offset", "Reserved"]);
}

#[test]
fn test_parse_reading()
{
    let def = power_state();
    let ok = RawReading::succeeded("PWR_STATE", def.encoding, 8);
    assert_eq!(rendered(&parse(&def, &ok).unwrap(), "Lock"), "set");

    let failed = RawReading::failed("PWR_STATE", def.encoding, "not implemented");
    assert!(matches!(parse(&def, &failed), Err(RegisterError::ReadFailure { .. })));
}

#[test]
fn test_changed_fields_name_every_intersecting_field()
{
    let def = RegisterDefinition::new("X", Encoding::new(3, 0, 15, 5, 0).unwrap(), Category::Other)
        .with_field(FieldDefinition::raw(2, 0, "Low"))
        .with_field(FieldDefinition::flag(3, "Bit3"))
        .with_field(FieldDefinition::counter(7, 4, "High"));

    assert_eq!(changed_fields(&def, 0x10, 0x18).unwrap(), vec!["Bit3"]);
    assert!(changed_fields(&def, 0x10, 0x10).unwrap().is_empty());
}

#[test]
fn test_seed_registers_decode()
{
    let catalog = Catalog::apple_silicon().unwrap();
    for def in &catalog {
        let fields = parse_value(def, u64::MAX).unwrap();
        assert_eq!(fields.len(), def.fields.len(), "{}", def.name);
    }
}
