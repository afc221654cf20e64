//! # Encoding Codec
//!
//! Conversion between register names, [`Encoding`] values and their textual
//! forms.
//!
//! Two textual forms are understood:
//!
//! - the canonical string `s<op0>_<op1>_c<CRn>_c<CRm>_<op2>` (for example
//!   `s3_0_c15_c0_0`), which is what debuggers accept for `register read`
//! - the `sys_reg(op0, op1, CRn, CRm, op2)` notation used in discovery output
//!
//! Parsing is strict. Every component must be a plain decimal integer; values
//! outside a component's range are rejected, never clamped or wrapped.

use crate::catalog::Catalog;
use crate::error::{EncodingComponent, EncodingError, RegisterError, Result};
use crate::types::encoding::check;
use crate::types::{Encoding, RegisterDefinition};

const COMPONENTS: [EncodingComponent; 5] = [
    EncodingComponent::Op0,
    EncodingComponent::Op1,
    EncodingComponent::CRn,
    EncodingComponent::CRm,
    EncodingComponent::Op2,
];

const SYS_REG_PREFIX: &str = "sys_reg(";

/// Format an encoding as its canonical string
///
/// ```rust
/// use aplreg_core::codec::to_canonical_string;
/// use aplreg_core::types::Encoding;
///
/// let enc = Encoding::new(3, 1, 15, 0, 0)?;
/// assert_eq!(to_canonical_string(enc), "s3_1_c15_c0_0");
/// # Ok::<(), aplreg_core::error::EncodingError>(())
/// ```
pub fn to_canonical_string(encoding: Encoding) -> String
{
    encoding.to_string()
}

/// Format an encoding in `sys_reg(op0, op1, CRn, CRm, op2)` notation
pub fn to_sys_reg_notation(encoding: Encoding) -> String
{
    let (op0, op1, crn, crm, op2) = encoding.parts();
    format!("sys_reg({op0}, {op1}, {crn}, {crm}, {op2})")
}

/// Parse the canonical string form
///
/// The prefixes are lowercase and required: `s` on op0, `c` on CRn and CRm.
/// Use [`parse_encoding`] for case-insensitive input.
///
/// ```rust
/// use aplreg_core::codec::parse_canonical_string;
/// use aplreg_core::error::{EncodingComponent, EncodingError};
///
/// let enc = parse_canonical_string("s3_0_c15_c2_0").unwrap();
/// assert_eq!(enc.parts(), (3, 0, 15, 2, 0));
///
/// assert_eq!(
///     parse_canonical_string("s3_0_c16_c0_0"),
///     Err(EncodingError::OutOfRange { component: EncodingComponent::CRn, value: 16, min: 0, max: 15 })
/// );
/// ```
pub fn parse_canonical_string(text: &str) -> std::result::Result<Encoding, EncodingError>
{
    let parts: Vec<&str> = text.split('_').collect();
    if parts.len() != COMPONENTS.len() {
        return Err(EncodingError::ComponentCount {
            text: text.to_string(),
            found: parts.len(),
        });
    }

    let mut values = [0i64; 5];
    for (index, (component, part)) in COMPONENTS.iter().zip(&parts).enumerate() {
        let digits = match prefix_of(*component) {
            Some(prefix) => part.strip_prefix(prefix).ok_or_else(|| EncodingError::MissingPrefix {
                component: *component,
                prefix,
                found: (*part).to_string(),
            })?,
            None => *part,
        };
        values[index] = parse_component(*component, digits)?;
    }

    from_components(values)
}

/// Parse `sys_reg(op0, op1, CRn, CRm, op2)` notation
///
/// Whitespace around components is ignored.
///
/// ```rust
/// use aplreg_core::codec::parse_sys_reg_notation;
///
/// let enc = parse_sys_reg_notation("sys_reg(3, 4, 15, 2, 0)").unwrap();
/// assert_eq!(enc.to_string(), "s3_4_c15_c2_0");
/// ```
pub fn parse_sys_reg_notation(text: &str) -> std::result::Result<Encoding, EncodingError>
{
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix(SYS_REG_PREFIX)
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| EncodingError::MissingWrapper { text: text.to_string() })?;

    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != COMPONENTS.len() {
        return Err(EncodingError::ComponentCount {
            text: text.to_string(),
            found: parts.len(),
        });
    }

    let mut values = [0i64; 5];
    for (index, (component, part)) in COMPONENTS.iter().zip(&parts).enumerate() {
        values[index] = parse_component(*component, part)?;
    }

    from_components(values)
}

/// Parse either textual form, ignoring case and surrounding whitespace
pub fn parse_encoding(text: &str) -> std::result::Result<Encoding, EncodingError>
{
    let normalized = text.trim().to_ascii_lowercase();
    if normalized.starts_with(SYS_REG_PREFIX) {
        parse_sys_reg_notation(&normalized)
    } else {
        parse_canonical_string(&normalized)
    }
}

/// Whether `text` is written in one of the encoding forms rather than as a name
///
/// Used to decide whether a failed parse should be reported as a malformed
/// encoding or as an unknown register name.
pub fn looks_like_encoding(text: &str) -> bool
{
    let normalized = text.trim().to_ascii_lowercase();
    if normalized.starts_with(SYS_REG_PREFIX) {
        return true;
    }
    let mut chars = normalized.chars();
    chars.next() == Some('s')
        && chars.next().is_some_and(|c| c.is_ascii_digit() || c == '-')
        && normalized.contains('_')
}

/// Resolve a register name or encoding to its catalog definition
///
/// Resolution order:
///
/// 1. catalog name, exact then case-insensitive
/// 2. canonical string (case-insensitive) looked up by encoding
/// 3. `sys_reg(...)` notation looked up by encoding
///
/// A well-formed encoding that is not catalogued, or text that is neither a
/// name nor an encoding, is [`RegisterError::UnresolvedRegister`]. Text that is
/// plainly meant as an encoding but malformed is [`RegisterError::Parse`].
///
/// ```rust
/// use aplreg_core::catalog::Catalog;
/// use aplreg_core::codec::resolve;
///
/// let catalog = Catalog::apple_silicon()?;
/// let by_name = resolve(&catalog, "SYS_APL_HID0_EL1")?;
/// let by_encoding = resolve(&catalog, "s3_0_c15_c0_0")?;
/// assert_eq!(by_name, by_encoding);
/// # Ok::<(), aplreg_core::error::RegisterError>(())
/// ```
pub fn resolve<'c>(catalog: &'c Catalog, text: &str) -> Result<&'c RegisterDefinition>
{
    if let Some(definition) = catalog.lookup(text.trim()) {
        return Ok(definition);
    }

    match parse_encoding(text) {
        Ok(encoding) => catalog
            .lookup_by_encoding(encoding)
            .ok_or_else(|| RegisterError::UnresolvedRegister(text.to_string())),
        Err(err) if looks_like_encoding(text) => Err(err.into()),
        Err(_) => Err(RegisterError::UnresolvedRegister(text.to_string())),
    }
}

const fn prefix_of(component: EncodingComponent) -> Option<char>
{
    match component {
        EncodingComponent::Op0 => Some('s'),
        EncodingComponent::CRn | EncodingComponent::CRm => Some('c'),
        EncodingComponent::Op1 | EncodingComponent::Op2 => None,
    }
}

fn parse_component(component: EncodingComponent, text: &str) -> std::result::Result<i64, EncodingError>
{
    let negative = text.starts_with('-');
    let digits = text.strip_prefix('-').unwrap_or(text);
    // Only the canonical spelling: no leading zeros and no `-0`
    let padded = digits.len() > 1 && digits.starts_with('0');
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || padded || (negative && digits == "0") {
        return Err(EncodingError::InvalidNumber {
            component,
            found: text.to_string(),
        });
    }

    // Too many digits for i64 is still a range problem, not a syntax one
    let saturated = if text.starts_with('-') { i64::MIN } else { i64::MAX };
    Ok(text.parse::<i64>().unwrap_or(saturated))
}

fn from_components(values: [i64; 5]) -> std::result::Result<Encoding, EncodingError>
{
    let [op0, op1, crn, crm, op2] = values;
    Ok(Encoding::new_unchecked(
        narrow(EncodingComponent::Op0, op0, 2, 3)?,
        narrow(EncodingComponent::Op1, op1, 0, 7)?,
        narrow(EncodingComponent::CRn, crn, 0, 15)?,
        narrow(EncodingComponent::CRm, crm, 0, 15)?,
        narrow(EncodingComponent::Op2, op2, 0, 7)?,
    ))
}

fn narrow(component: EncodingComponent, value: i64, min: u8, max: u8) -> std::result::Result<u8, EncodingError>
{
    check(component, value, min, max)?;
    u8::try_from(value).map_err(|_| EncodingError::OutOfRange {
        component,
        value,
        min,
        max,
    })
}
