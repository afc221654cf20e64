//! Per-bit stability analysis over a set of samples.

use std::fmt;

use crate::error::{RegisterError, Result};
use crate::types::{BitRange, Encoding, RawReading};

/// Behaviour of one bit across the sample set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitStability
{
    /// The bit held this value in every sample
    Static(bool),
    /// The bit changed at least once
    Volatile,
}

/// Suggested interpretation of a run of volatile bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateShape
{
    Flag,
    Counter,
}

impl fmt::Display for CandidateShape
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            CandidateShape::Flag => f.write_str("flag"),
            CandidateShape::Counter => f.write_str("counter"),
        }
    }
}

/// A possible field boundary
///
/// Advisory only. This is deliberately not a
/// [`FieldDefinition`](crate::types::FieldDefinition) and cannot be turned
/// into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateField
{
    pub bits: BitRange,
    pub shape: CandidateShape,
}

/// Per-bit classification of one register's samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInference
{
    encoding: Encoding,
    samples: usize,
    /// Bits that differed from the first sample at least once
    volatile: u64,
    /// Value of the first sample
    baseline: u64,
}

impl FieldInference
{
    pub fn encoding(&self) -> Encoding
    {
        self.encoding
    }

    /// Number of successful readings analysed
    pub fn samples(&self) -> usize
    {
        self.samples
    }

    /// Stability of bit `bit` (0..=63)
    pub fn bit(&self, bit: u8) -> BitStability
    {
        let mask = 1u64 << (bit & 63);
        if self.volatile & mask != 0 {
            BitStability::Volatile
        } else {
            BitStability::Static(self.baseline & mask != 0)
        }
    }

    /// Stability of every bit, bit 0 first
    pub fn bits(&self) -> Vec<BitStability>
    {
        (0..64).map(|bit| self.bit(bit)).collect()
    }

    pub fn volatile_mask(&self) -> u64
    {
        self.volatile
    }

    /// Static bits that were set in every sample
    pub fn static_ones(&self) -> u64
    {
        self.baseline & !self.volatile
    }

    /// Runs of contiguous volatile bits, lowest first
    ///
    /// A one-bit run is suggested as a flag, a wider run as a counter.
    pub fn candidates(&self) -> Vec<CandidateField>
    {
        let mut candidates = Vec::new();
        let mut run_start: Option<u8> = None;

        for bit in 0..=64u8 {
            let volatile = bit < 64 && self.volatile & (1u64 << bit) != 0;
            match (volatile, run_start) {
                (true, None) => run_start = Some(bit),
                (false, Some(low)) => {
                    let high = bit - 1;
                    let shape = if high == low {
                        CandidateShape::Flag
                    } else {
                        CandidateShape::Counter
                    };
                    candidates.push(CandidateField {
                        bits: BitRange::new(high, low),
                        shape,
                    });
                    run_start = None;
                }
                _ => {}
            }
        }

        candidates
    }
}

/// Classify every bit as static or volatile across `readings`
///
/// Failed readings are skipped.
///
/// ## Errors
///
/// [`RegisterError::InvalidArgument`] if the readings belong to more than one
/// encoding or none of them succeeded.
///
/// ## Example
///
/// ```rust
/// use aplreg_core::research::{infer_fields, BitStability, CandidateShape};
/// use aplreg_core::types::{Encoding, RawReading};
///
/// let enc = Encoding::new(3, 2, 15, 0, 0)?;
/// let readings = [
///     RawReading::succeeded("PMC0", enc, 0b1_0000),
///     RawReading::succeeded("PMC0", enc, 0b1_0101),
///     RawReading::succeeded("PMC0", enc, 0b1_0110),
/// ];
///
/// let inference = infer_fields(&readings)?;
/// assert_eq!(inference.bit(4), BitStability::Static(true));
/// assert_eq!(inference.bit(0), BitStability::Volatile);
/// assert_eq!(inference.candidates()[0].shape, CandidateShape::Counter);
/// # Ok::<(), aplreg_core::error::RegisterError>(())
/// ```
pub fn infer_fields(readings: &[RawReading]) -> Result<FieldInference>
{
    let Some(first) = readings.first() else {
        return Err(RegisterError::InvalidArgument(String::from("no readings to analyse")));
    };

    let encoding = first.encoding();
    if let Some(other) = readings.iter().find(|r| r.encoding() != encoding) {
        return Err(RegisterError::InvalidArgument(format!(
            "readings mix encodings {encoding} and {}",
            other.encoding()
        )));
    }

    let mut values = readings.iter().filter_map(RawReading::value);
    let Some(baseline) = values.next() else {
        return Err(RegisterError::InvalidArgument(format!(
            "no successful readings of {encoding} to analyse"
        )));
    };

    let mut samples = 1;
    let mut volatile = 0u64;
    for value in values {
        volatile |= value ^ baseline;
        samples += 1;
    }

    Ok(FieldInference {
        encoding,
        samples,
        volatile,
        baseline,
    })
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn enc() -> Encoding
    {
        Encoding::new_unchecked(3, 2, 15, 0, 0)
    }

    #[test]
    fn test_single_sample_is_all_static()
    {
        let inference = infer_fields(&[RawReading::succeeded("R", enc(), 0x8000_0000_0000_0001)]).unwrap();
        assert_eq!(inference.volatile_mask(), 0);
        assert_eq!(inference.bit(0), BitStability::Static(true));
        assert_eq!(inference.bit(1), BitStability::Static(false));
        assert_eq!(inference.bit(63), BitStability::Static(true));
        assert!(inference.candidates().is_empty());
    }

    #[test]
    fn test_candidates_split_runs()
    {
        let readings = [
            RawReading::succeeded("R", enc(), 0),
            RawReading::succeeded("R", enc(), 0b0110_0001),
            RawReading::succeeded("R", enc(), 1 << 63),
        ];
        let inference = infer_fields(&readings).unwrap();
        assert_eq!(
            inference.candidates(),
            vec![
                CandidateField {
                    bits: BitRange::bit(0),
                    shape: CandidateShape::Flag
                },
                CandidateField {
                    bits: BitRange::new(6, 5),
                    shape: CandidateShape::Counter
                },
                CandidateField {
                    bits: BitRange::bit(63),
                    shape: CandidateShape::Flag
                },
            ]
        );
    }

    #[test]
    fn test_failed_readings_are_skipped()
    {
        let readings = [
            RawReading::failed("R", enc(), "busy"),
            RawReading::succeeded("R", enc(), 4),
            RawReading::succeeded("R", enc(), 4),
        ];
        let inference = infer_fields(&readings).unwrap();
        assert_eq!(inference.samples(), 2);
        assert_eq!(inference.static_ones(), 4);
    }

    #[test]
    fn test_rejects_unusable_input()
    {
        assert!(matches!(infer_fields(&[]), Err(RegisterError::InvalidArgument(_))));
        assert!(matches!(
            infer_fields(&[RawReading::failed("R", enc(), "busy")]),
            Err(RegisterError::InvalidArgument(_))
        ));

        let mixed = [
            RawReading::succeeded("R", enc(), 0),
            RawReading::succeeded("S", Encoding::new_unchecked(3, 2, 15, 1, 0), 0),
        ];
        assert!(matches!(infer_fields(&mixed), Err(RegisterError::InvalidArgument(_))));
    }
}
