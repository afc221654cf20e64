//! # Register Readers
//!
//! The read capability the rest of the crate consumes.
//!
//! Reading a system register means executing `MRS` on the target CPU, which
//! this crate never does itself. Instead every component takes a
//! [`RegisterReader`] and calls it once per register. Implementations decide
//! how the value is obtained:
//!
//! - [`LldbReader`]: drives an `lldb` subprocess against a live process or a
//!   core file and parses `register read` output
//! - [`StaticReader`]: an in-memory table, for tests and offline work
//! - [`ReplayReader`]: serves the values of a previously saved snapshot
//!
//! ## Why use a trait?
//!
//! The dump engine and the research helper only need "give me the value of
//! this encoding". Keeping that behind a trait lets the same code run against
//! a debugger, a replayed capture or a test fixture.
//!
//! Readers are called synchronously and must not assume any caching or
//! batching by the caller.

mod lldb;

use std::collections::HashMap;

use tracing::{debug, warn};

pub use lldb::{parse_register_read_output, LldbReader, LldbTarget};

use crate::dump::Snapshot;
use crate::error::{RegisterError, Result};
use crate::types::{Encoding, RawReading};

/// Source of raw system register values
pub trait RegisterReader
{
    /// Read one register
    ///
    /// ## Errors
    ///
    /// [`RegisterError::ReadFailure`] when the value cannot be obtained. Batch
    /// operations record the message on a failed [`RawReading`] and carry on.
    fn read_register(&mut self, encoding: Encoding) -> Result<u64>;
}

impl<R: RegisterReader + ?Sized> RegisterReader for Box<R>
{
    fn read_register(&mut self, encoding: Encoding) -> Result<u64>
    {
        (**self).read_register(encoding)
    }
}

/// Read one register and record the outcome as a [`RawReading`]
///
/// Never fails: a reader error becomes a failed reading carrying the
/// backend's detail message.
pub fn capture<R: RegisterReader + ?Sized>(reader: &mut R, name: &str, encoding: Encoding) -> RawReading
{
    match reader.read_register(encoding) {
        Ok(value) => {
            debug!(register = name, %encoding, value = %format!("{value:#018x}"), "Read register");
            RawReading::succeeded(name, encoding, value)
        }
        Err(err) => {
            warn!(register = name, %encoding, error = %err, "Register read failed");
            let detail = match err {
                RegisterError::ReadFailure { detail, .. } => detail,
                other => other.to_string(),
            };
            RawReading::failed(name, encoding, detail)
        }
    }
}

fn unavailable(encoding: Encoding, detail: &str) -> RegisterError
{
    RegisterError::ReadFailure {
        register: encoding.to_string(),
        detail: detail.to_string(),
    }
}

/// In-memory reader backed by a table of values and failures
///
/// Encodings that were never inserted fail with "register not available".
/// Every read is logged so tests can check how often each register was
/// touched.
///
/// ## Example
///
/// ```rust
/// use aplreg_core::reader::{RegisterReader, StaticReader};
/// use aplreg_core::types::Encoding;
///
/// let hid0 = Encoding::new_unchecked(3, 0, 15, 0, 0);
/// let mut reader = StaticReader::new().with_value(hid0, 0x10);
///
/// assert_eq!(reader.read_register(hid0)?, 0x10);
/// assert_eq!(reader.reads(), &[hid0]);
/// # Ok::<(), aplreg_core::error::RegisterError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticReader
{
    values: HashMap<Encoding, std::result::Result<u64, String>>,
    reads: Vec<Encoding>,
}

impl StaticReader
{
    pub fn new() -> Self
    {
        Self::default()
    }

    #[must_use]
    pub fn with_value(mut self, encoding: Encoding, value: u64) -> Self
    {
        self.set_value(encoding, value);
        self
    }

    #[must_use]
    pub fn with_failure(mut self, encoding: Encoding, detail: impl Into<String>) -> Self
    {
        self.set_failure(encoding, detail);
        self
    }

    pub fn set_value(&mut self, encoding: Encoding, value: u64)
    {
        self.values.insert(encoding, Ok(value));
    }

    pub fn set_failure(&mut self, encoding: Encoding, detail: impl Into<String>)
    {
        self.values.insert(encoding, Err(detail.into()));
    }

    /// Encodings read so far, in call order
    pub fn reads(&self) -> &[Encoding]
    {
        &self.reads
    }
}

impl RegisterReader for StaticReader
{
    fn read_register(&mut self, encoding: Encoding) -> Result<u64>
    {
        self.reads.push(encoding);
        match self.values.get(&encoding) {
            Some(Ok(value)) => Ok(*value),
            Some(Err(detail)) => Err(unavailable(encoding, detail)),
            None => Err(unavailable(encoding, "register not available")),
        }
    }
}

/// Reader that answers from a saved snapshot
///
/// Registers that failed when the snapshot was taken fail again with the
/// recorded detail; registers absent from the snapshot are unavailable.
#[derive(Debug, Clone)]
pub struct ReplayReader
{
    label: String,
    inner: StaticReader,
}

impl ReplayReader
{
    pub fn new(snapshot: &Snapshot) -> Self
    {
        let mut inner = StaticReader::new();
        for reading in snapshot.readings() {
            match reading.value() {
                Some(value) => inner.set_value(reading.encoding(), value),
                None => inner.set_failure(reading.encoding(), reading.error_detail().unwrap_or("read failed")),
            }
        }

        ReplayReader {
            label: snapshot.label().to_string(),
            inner,
        }
    }

    /// Load a snapshot file and replay it
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self>
    {
        let snapshot = Snapshot::load(path)?;
        Ok(Self::new(&snapshot))
    }

    /// Label of the replayed snapshot
    pub fn label(&self) -> &str
    {
        &self.label
    }
}

impl RegisterReader for ReplayReader
{
    fn read_register(&mut self, encoding: Encoding) -> Result<u64>
    {
        self.inner.read_register(encoding)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_static_reader_failures()
    {
        let hid0 = Encoding::new_unchecked(3, 0, 15, 0, 0);
        let hid1 = Encoding::new_unchecked(3, 0, 15, 1, 0);
        let mut reader = StaticReader::new().with_failure(hid0, "permission denied");

        let err = reader.read_register(hid0).unwrap_err();
        assert_eq!(err.to_string(), "failed to read s3_0_c15_c0_0: permission denied");
        assert!(matches!(reader.read_register(hid1), Err(RegisterError::ReadFailure { .. })));
        assert_eq!(reader.reads(), &[hid0, hid1]);
    }

    #[test]
    fn test_capture_records_failure_detail()
    {
        let hid0 = Encoding::new_unchecked(3, 0, 15, 0, 0);
        let mut reader = StaticReader::new();

        let reading = capture(&mut reader, "SYS_APL_HID0_EL1", hid0);
        assert!(!reading.success());
        assert_eq!(reading.value(), None);
        assert_eq!(reading.error_detail(), Some("register not available"));
    }

    #[test]
    fn test_boxed_reader()
    {
        let hid0 = Encoding::new_unchecked(3, 0, 15, 0, 0);
        let mut reader: Box<dyn RegisterReader> = Box::new(StaticReader::new().with_value(hid0, 7));
        assert_eq!(capture(&mut reader, "HID0", hid0).value(), Some(7));
    }
}
