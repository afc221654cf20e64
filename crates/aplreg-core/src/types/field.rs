//! Bitfield schema types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Inclusive bit range `[high:low]` within a 64-bit register
///
/// The range is not validated on construction; [`Catalog::new`] rejects
/// ranges outside `0..=63` or with `low > high`, and the parser re-checks
/// before extracting.
///
/// [`Catalog::new`]: crate::catalog::Catalog::new
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitRange
{
    pub high: u8,
    pub low: u8,
}

impl BitRange
{
    pub const fn new(high: u8, low: u8) -> Self
    {
        BitRange { high, low }
    }

    /// A one-bit range
    pub const fn bit(bit: u8) -> Self
    {
        BitRange { high: bit, low: bit }
    }

    /// Whether the range describes bits of a 64-bit register
    pub const fn is_valid(self) -> bool
    {
        self.low <= self.high && self.high <= 63
    }

    /// Number of bits covered (0 for an inverted range)
    pub const fn width(self) -> u32
    {
        if self.low > self.high {
            0
        } else {
            (self.high - self.low) as u32 + 1
        }
    }

    /// Mask of the covered bits in register position
    ///
    /// Only meaningful for a valid range.
    pub const fn mask(self) -> u64
    {
        let width = self.width();
        if width == 0 {
            0
        } else if width >= 64 {
            u64::MAX
        } else {
            ((1u64 << width) - 1) << self.low
        }
    }

    pub const fn overlaps(self, other: BitRange) -> bool
    {
        self.low <= other.high && other.low <= self.high
    }
}

impl fmt::Display for BitRange
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if self.high == self.low {
            write!(f, "[{}]", self.low)
        } else {
            write!(f, "[{}:{}]", self.high, self.low)
        }
    }
}

/// Mapping from a field value to its symbolic meaning
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Enumeration(BTreeMap<u64, String>);

impl Enumeration
{
    pub fn new() -> Self
    {
        Enumeration(BTreeMap::new())
    }

    /// Add a value and return the enumeration, for table-style construction
    #[must_use]
    pub fn with(mut self, value: u64, meaning: impl Into<String>) -> Self
    {
        self.0.insert(value, meaning.into());
        self
    }

    pub fn get(&self, value: u64) -> Option<&str>
    {
        self.0.get(&value).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)>
    {
        self.0.iter().map(|(value, meaning)| (*value, meaning.as_str()))
    }

    pub fn len(&self) -> usize
    {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(u64, S)> for Enumeration
{
    fn from_iter<I: IntoIterator<Item = (u64, S)>>(iter: I) -> Self
    {
        Enumeration(iter.into_iter().map(|(value, meaning)| (value, meaning.into())).collect())
    }
}

/// How a field's value is rendered
///
/// Rendering dispatches on this tag rather than on the register's category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "kebab-case")]
pub enum FieldKind
{
    /// Single bit, rendered as `set` / `clear`
    Flag,
    /// Unsigned count, rendered as decimal plus hex
    Counter,
    /// Symbolic value; unmapped values render as `unknown(<n>)`
    Enum(Enumeration),
    /// Two's complement over the field width
    SignedInt,
    /// Opaque bits, rendered as decimal plus hex
    #[default]
    RawBits,
}

impl FieldKind
{
    pub const fn name(&self) -> &'static str
    {
        match self {
            FieldKind::Flag => "flag",
            FieldKind::Counter => "counter",
            FieldKind::Enum(_) => "enum",
            FieldKind::SignedInt => "signed-int",
            FieldKind::RawBits => "raw-bits",
        }
    }
}

/// One named bitfield of a register
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDefinition
{
    pub bits: BitRange,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDefinition
{
    /// A field with an explicit kind
    pub fn new(bits: BitRange, label: impl Into<String>, kind: FieldKind) -> Self
    {
        FieldDefinition {
            bits,
            label: label.into(),
            kind,
        }
    }

    /// A field with no declared kind (rendered as raw bits)
    pub fn raw(high: u8, low: u8, label: impl Into<String>) -> Self
    {
        Self::new(BitRange::new(high, low), label, FieldKind::RawBits)
    }

    pub fn flag(bit: u8, label: impl Into<String>) -> Self
    {
        Self::new(BitRange::bit(bit), label, FieldKind::Flag)
    }

    pub fn counter(high: u8, low: u8, label: impl Into<String>) -> Self
    {
        Self::new(BitRange::new(high, low), label, FieldKind::Counter)
    }

    pub fn signed(high: u8, low: u8, label: impl Into<String>) -> Self
    {
        Self::new(BitRange::new(high, low), label, FieldKind::SignedInt)
    }

    pub fn enumerated(high: u8, low: u8, label: impl Into<String>, values: Enumeration) -> Self
    {
        Self::new(BitRange::new(high, low), label, FieldKind::Enum(values))
    }

    /// The enumeration, if this is an `Enum` field
    pub fn enumeration(&self) -> Option<&Enumeration>
    {
        match &self.kind {
            FieldKind::Enum(values) => Some(values),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_bit_range_mask()
    {
        assert_eq!(BitRange::bit(3).mask(), 0b1000);
        assert_eq!(BitRange::new(10, 8).mask(), 0x700);
        assert_eq!(BitRange::new(63, 0).mask(), u64::MAX);
        assert_eq!(BitRange::new(63, 63).mask(), 1 << 63);
    }

    #[test]
    fn test_bit_range_validity()
    {
        assert!(BitRange::new(63, 0).is_valid());
        assert!(!BitRange::new(64, 60).is_valid());
        assert!(!BitRange::new(3, 4).is_valid());
        assert_eq!(BitRange::new(3, 4).width(), 0);
    }

    #[test]
    fn test_bit_range_overlap()
    {
        assert!(BitRange::new(7, 0).overlaps(BitRange::bit(7)));
        assert!(!BitRange::new(7, 0).overlaps(BitRange::bit(8)));
        assert!(BitRange::new(10, 5).overlaps(BitRange::new(6, 2)));
    }

    #[test]
    fn test_bit_range_display()
    {
        assert_eq!(BitRange::bit(45).to_string(), "[45]");
        assert_eq!(BitRange::new(62, 60).to_string(), "[62:60]");
    }

    #[test]
    fn test_enumeration_lookup()
    {
        let values = Enumeration::new().with(0, "off").with(1, "PMI");
        assert_eq!(values.get(1), Some("PMI"));
        assert_eq!(values.get(2), None);
        assert_eq!(values.len(), 2);
    }
}
