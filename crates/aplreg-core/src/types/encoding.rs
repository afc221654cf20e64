//! System register encoding type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EncodingComponent, EncodingError};

/// System register encoding as used by `MRS`/`MSR`
///
/// An encoding is the 5-tuple `(op0, op1, CRn, CRm, op2)` that names a system
/// register at the instruction level. It is stored packed into 16 bits, in the
/// same layout the instruction uses for bits 5-20:
///
/// ```text
/// 15 14 | 13 12 11 | 10  9  8  7 | 6  5  4  3 | 2  1  0
///  op0  |   op1    |     CRn     |    CRm     |   op2
/// ```
///
/// Only `op0` values 2 and 3 address system registers; 0 and 1 encode
/// instructions and are rejected by [`Encoding::new`].
///
/// ## Canonical form
///
/// `Display` produces the canonical string `s<op0>_<op1>_c<CRn>_c<CRm>_<op2>`,
/// which is also the name debuggers accept for `register read`. `FromStr`
/// parses exactly that form.
///
/// ## Example
///
/// ```rust
/// use aplreg_core::types::Encoding;
///
/// let hid0 = Encoding::new(3, 0, 15, 0, 0)?;
/// assert_eq!(hid0.to_string(), "s3_0_c15_c0_0");
/// assert_eq!("s3_0_c15_c0_0".parse::<Encoding>()?, hid0);
/// # Ok::<(), aplreg_core::error::EncodingError>(())
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Encoding(u16);

impl Encoding
{
    /// Construct an encoding, rejecting any component outside its range
    pub fn new(op0: u8, op1: u8, crn: u8, crm: u8, op2: u8) -> Result<Self, EncodingError>
    {
        check(EncodingComponent::Op0, op0.into(), 2, 3)?;
        check(EncodingComponent::Op1, op1.into(), 0, 7)?;
        check(EncodingComponent::CRn, crn.into(), 0, 15)?;
        check(EncodingComponent::CRm, crm.into(), 0, 15)?;
        check(EncodingComponent::Op2, op2.into(), 0, 7)?;

        Ok(Self::new_unchecked(op0, op1, crn, crm, op2))
    }

    /// Construct an encoding without range checks
    ///
    /// Out-of-range values are silently truncated to their bit width. Used for
    /// compile-time tables; the catalog re-validates `op0` on load.
    pub const fn new_unchecked(op0: u8, op1: u8, crn: u8, crm: u8, op2: u8) -> Self
    {
        let op0 = (op0 as u16 & 0b11) << 14;
        let op1 = (op1 as u16 & 0b111) << 11;
        let crn = (crn as u16 & 0b1111) << 7;
        let crm = (crm as u16 & 0b1111) << 3;
        let op2 = op2 as u16 & 0b111;
        Self(op0 | op1 | crn | crm | op2)
    }

    #[inline]
    pub const fn op0(self) -> u8
    {
        ((self.0 >> 14) & 0b11) as u8
    }

    #[inline]
    pub const fn op1(self) -> u8
    {
        ((self.0 >> 11) & 0b111) as u8
    }

    #[inline]
    pub const fn crn(self) -> u8
    {
        ((self.0 >> 7) & 0b1111) as u8
    }

    #[inline]
    pub const fn crm(self) -> u8
    {
        ((self.0 >> 3) & 0b1111) as u8
    }

    #[inline]
    pub const fn op2(self) -> u8
    {
        (self.0 & 0b111) as u8
    }

    /// The five components in `(op0, op1, CRn, CRm, op2)` order
    pub const fn parts(self) -> (u8, u8, u8, u8, u8)
    {
        (self.op0(), self.op1(), self.crn(), self.crm(), self.op2())
    }

    /// Returns the encoding as packed into bits 5-20 of `MRS`/`MSR`
    #[inline]
    pub const fn packed(self) -> u16
    {
        self.0
    }

    /// Whether `op0` addresses the system register space (2 or 3)
    pub const fn is_system_register(self) -> bool
    {
        self.op0() >= 2
    }
}

pub(crate) fn check(component: EncodingComponent, value: i64, min: u8, max: u8) -> Result<(), EncodingError>
{
    if value < 0 {
        return Err(EncodingError::Negative { component, value });
    }
    if value < i64::from(min) || value > i64::from(max) {
        return Err(EncodingError::OutOfRange {
            component,
            value,
            min,
            max,
        });
    }
    Ok(())
}

impl fmt::Debug for Encoding
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Encoding")
            .field("op0", &self.op0())
            .field("op1", &self.op1())
            .field("CRn", &self.crn())
            .field("CRm", &self.crm())
            .field("op2", &self.op2())
            .finish()
    }
}

impl fmt::Display for Encoding
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "s{}_{}_c{}_c{}_{}",
            self.op0(),
            self.op1(),
            self.crn(),
            self.crm(),
            self.op2()
        )
    }
}

impl FromStr for Encoding
{
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        crate::codec::parse_canonical_string(s)
    }
}

impl Serialize for Encoding
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Encoding
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error>
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
