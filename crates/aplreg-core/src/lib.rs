//! # aplreg-core
//!
//! Introspection of Apple Silicon implementation-defined system registers.
//!
//! This crate turns opaque register encodings and raw 64-bit values into
//! structured data, and supports bulk snapshot and compare workflows:
//!
//! - [`catalog`]: the validated, read-only table of known registers
//! - [`codec`]: names, encodings and their canonical strings
//! - [`parser`]: decoding a raw value into named, rendered fields
//! - [`dump`]: bulk reads into snapshots, JSON persistence and diffs
//! - [`research`]: probing unknown encodings and inferring field boundaries
//! - [`reader`]: the read capability (`lldb`, in-memory, snapshot replay)
//! - [`report`]: text and JSON rendering of results
//!
//! ## Reading registers
//!
//! The crate never executes `MRS` itself. Values come from a
//! [`RegisterReader`], usually an `lldb` session attached to a process or
//! core file. Everything except the reader is pure and runs on any host.
//!
//! ## Example
//!
//! ```rust
//! use aplreg_core::prelude::*;
//!
//! let catalog = Catalog::apple_silicon()?;
//! let hid0 = resolve(&catalog, "SYS_APL_HID0_EL1")?;
//!
//! let fields = parse_value(hid0, 1 << 20)?;
//! assert_eq!(fields[0].label, "Loop Buffer Disable");
//! assert_eq!(fields[0].rendered_text, "set");
//! # Ok::<(), RegisterError>(())
//! ```
//!
//! ## Data quality
//!
//! The shipped catalog is reconstructed from public reverse-engineering
//! work, not vendor documentation. Treat its field boundaries and
//! enumerations as a seed dataset that needs independent verification.

pub mod catalog;
pub mod codec;
pub mod dump;
pub mod error;
pub mod parser;
pub mod prelude;
pub mod reader;
pub mod report;
pub mod research;
pub mod types;

pub use catalog::Catalog;
pub use error::{RegisterError, Result};
pub use reader::RegisterReader;
