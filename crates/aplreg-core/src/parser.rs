//! # Bitfield Parser
//!
//! Turns a raw 64-bit register value into named, rendered fields using the
//! register's [`RegisterDefinition`].
//!
//! Parsing is pure: no I/O, and the definition is only borrowed. Rendering
//! dispatches on each field's [`FieldKind`]:
//!
//! | kind        | rendering                                   |
//! |-------------|---------------------------------------------|
//! | `Flag`      | `set` / `clear`                             |
//! | `Counter`   | `<n> (0x<hex>)`                             |
//! | `RawBits`   | `<n> (0x<hex>)`                             |
//! | `Enum`      | the mapped meaning, or `unknown(<n>)`       |
//! | `SignedInt` | two's complement over the field width, plus hex |
//!
//! An unmapped enumeration value is rendered, not rejected.

use crate::error::{RegisterError, Result};
use crate::types::{BitRange, FieldDefinition, FieldKind, ParsedField, RawReading, RegisterDefinition};

/// Extract the bits `[high:low]` of `value`, shifted down to bit 0
///
/// ## Errors
///
/// [`RegisterError::FieldRange`] if the range is outside bits 0..=63 or
/// inverted. A validated catalog never produces such a range.
///
/// ```rust
/// use aplreg_core::parser::extract_bits;
/// use aplreg_core::types::BitRange;
///
/// assert_eq!(extract_bits(0xABCD, BitRange::new(11, 4))?, 0xBC);
/// assert!(extract_bits(0xABCD, BitRange::new(64, 60)).is_err());
/// # Ok::<(), aplreg_core::error::RegisterError>(())
/// ```
pub fn extract_bits(value: u64, bits: BitRange) -> Result<u64>
{
    if !bits.is_valid() {
        return Err(RegisterError::FieldRange {
            register: String::from("<raw value>"),
            field: bits.to_string(),
            high: bits.high,
            low: bits.low,
        });
    }
    Ok((value & bits.mask()) >> bits.low)
}

/// Render one field's sub-value according to its kind
pub fn render(field: &FieldDefinition, raw: u64) -> String
{
    match &field.kind {
        FieldKind::Flag => {
            if raw == 0 {
                String::from("clear")
            } else {
                String::from("set")
            }
        }
        FieldKind::Counter | FieldKind::RawBits => format!("{raw} ({raw:#x})"),
        FieldKind::Enum(values) => match values.get(raw) {
            Some(meaning) => meaning.to_string(),
            None => format!("unknown({raw})"),
        },
        FieldKind::SignedInt => format!("{} ({raw:#x})", sign_extend(raw, field.bits.width())),
    }
}

/// Decode a successful reading against its definition
///
/// Returns one [`ParsedField`] per declared field, in declaration order.
///
/// ## Errors
///
/// - [`RegisterError::ReadFailure`] if the reading failed; a failed reading
///   has no value and is never decoded as zero
/// - [`RegisterError::InvalidArgument`] if the reading belongs to another
///   encoding
/// - [`RegisterError::FieldRange`] if a field range is invalid
pub fn parse(definition: &RegisterDefinition, reading: &RawReading) -> Result<Vec<ParsedField>>
{
    let Some(value) = reading.value() else {
        return Err(RegisterError::ReadFailure {
            register: reading.register_name().to_string(),
            detail: reading.error_detail().unwrap_or("no value").to_string(),
        });
    };

    if reading.encoding() != definition.encoding {
        return Err(RegisterError::InvalidArgument(format!(
            "reading of {} ({}) does not match definition {} ({})",
            reading.register_name(),
            reading.encoding(),
            definition.name,
            definition.encoding
        )));
    }

    parse_value(definition, value)
}

/// Decode a raw value against a definition, without a reading
///
/// This is the offline path used for values copied out of logs or crash
/// reports.
///
/// ## Example
///
/// ```rust
/// use aplreg_core::parser::parse_value;
/// use aplreg_core::types::{Category, Encoding, Enumeration, FieldDefinition, RegisterDefinition};
///
/// let def = RegisterDefinition::new("DEMO", Encoding::new_unchecked(3, 0, 15, 0, 0), Category::Other)
///     .with_field(FieldDefinition::flag(0, "Enable"))
///     .with_field(FieldDefinition::enumerated(3, 1, "Mode", Enumeration::new().with(5, "disabled")));
///
/// let fields = parse_value(&def, 0b1111)?;
/// assert_eq!(fields[0].rendered_text, "set");
/// assert_eq!(fields[1].rendered_text, "unknown(7)");
/// # Ok::<(), aplreg_core::error::RegisterError>(())
/// ```
pub fn parse_value(definition: &RegisterDefinition, value: u64) -> Result<Vec<ParsedField>>
{
    definition
        .fields
        .iter()
        .map(|field| {
            let raw = extract_bits(value, field.bits).map_err(|_| RegisterError::FieldRange {
                register: definition.name.clone(),
                field: field.label.clone(),
                high: field.bits.high,
                low: field.bits.low,
            })?;

            Ok(ParsedField {
                label: field.label.clone(),
                bits: field.bits,
                raw_subvalue: raw,
                rendered_text: render(field, raw),
            })
        })
        .collect()
}

/// Labels of the fields whose rendered text differs between two values
pub fn changed_fields(definition: &RegisterDefinition, a: u64, b: u64) -> Result<Vec<String>>
{
    let before = parse_value(definition, a)?;
    let after = parse_value(definition, b)?;

    Ok(before
        .into_iter()
        .zip(after)
        .filter(|(x, y)| x.rendered_text != y.rendered_text)
        .map(|(x, _)| x.label)
        .collect())
}

/// Set bits of `value` that no declared field covers
pub fn undocumented_bits(definition: &RegisterDefinition, value: u64) -> u64
{
    value & definition.undocumented_mask()
}

fn sign_extend(raw: u64, width: u32) -> i128
{
    let value = i128::from(raw);
    if width == 0 || width > 64 {
        return value;
    }
    if (raw >> (width - 1)) & 1 == 1 {
        value - (1i128 << width)
    } else {
        value
    }
}
