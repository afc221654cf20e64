//! # Error Types
//!
//! General error handling for register introspection.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

/// One of the five fields of a system register encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingComponent
{
    Op0,
    Op1,
    CRn,
    CRm,
    Op2,
}

impl std::fmt::Display for EncodingComponent
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        let name = match self {
            EncodingComponent::Op0 => "op0",
            EncodingComponent::Op1 => "op1",
            EncodingComponent::CRn => "CRn",
            EncodingComponent::CRm => "CRm",
            EncodingComponent::Op2 => "op2",
        };
        f.write_str(name)
    }
}

/// Errors produced while building or parsing an encoding
///
/// Every variant names the offending component so the caller can report
/// exactly which part of `s<op0>_<op1>_c<CRn>_c<CRm>_<op2>` was wrong.
/// Values are never clamped or wrapped into range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError
{
    /// The text did not split into exactly five components
    #[error("expected 5 components in `{text}`, found {found}")]
    ComponentCount
    {
        /// The input that was rejected
        text: String,
        /// Number of components found
        found: usize,
    },

    /// Text was not wrapped in `sys_reg(` ... `)`
    #[error("expected `sys_reg(op0, op1, CRn, CRm, op2)`, found `{text}`")]
    MissingWrapper
    {
        text: String
    },

    /// A component was missing its `s` or `c` prefix
    #[error("{component} must be written as `{prefix}<n>`, found `{found}`")]
    MissingPrefix
    {
        component: EncodingComponent,
        prefix: char,
        found: String,
    },

    /// A component was not a plain decimal integer in canonical spelling
    #[error("{component} is not a decimal number: `{found}`")]
    InvalidNumber
    {
        component: EncodingComponent,
        found: String,
    },

    /// A component was negative
    #[error("{component} must not be negative, found {value}")]
    Negative
    {
        component: EncodingComponent,
        value: i64,
    },

    /// A component was outside its bit width (or op0 outside {2, 3})
    #[error("{component} = {value} is out of range {min}..={max}")]
    OutOfRange
    {
        component: EncodingComponent,
        value: i64,
        min: u8,
        max: u8,
    },
}

/// Main error type for register introspection
///
/// ## Error Categories
///
/// 1. **Load-time errors**: `CatalogIntegrity` (fatal, the catalog cannot be used)
/// 2. **Request errors**: `UnresolvedRegister`, `Parse`, `InvalidArgument`
/// 3. **Read errors**: `ReadFailure` (recorded per register in batch operations)
/// 4. **Defects**: `FieldRange` (should be unreachable for a validated catalog)
/// 5. **Persistence errors**: `SnapshotFormat`, `Json`, `Io`
#[derive(Error, Debug)]
pub enum RegisterError
{
    /// The catalog violated one of its invariants
    ///
    /// Raised by `Catalog::new` when two registers share a name or encoding,
    /// a field range falls outside bits 0..=63, or two fields overlap. All
    /// offending registers are named, never silently dropped.
    #[error("catalog integrity violated by {}: {}", .registers.join(", "), .violations.join("; "))]
    CatalogIntegrity
    {
        /// Names of the registers involved
        registers: Vec<String>,
        /// Human readable description of each violation
        violations: Vec<String>,
    },

    /// A name or encoding matched nothing in the catalog
    #[error("unresolved register: `{0}` is neither a catalog name nor a known encoding")]
    UnresolvedRegister(String),

    /// A canonical encoding string was malformed
    #[error("invalid encoding: {0}")]
    Parse(#[from] EncodingError),

    /// The read capability could not produce a value
    ///
    /// During dumps and probes this is recorded on the individual reading
    /// instead of being returned.
    #[error("failed to read {register}: {detail}")]
    ReadFailure
    {
        /// Register name or canonical encoding
        register: String,
        /// Detail reported by the read backend
        detail: String,
    },

    /// A field's bit range does not fit in a 64-bit register
    ///
    /// Catalog validation makes this unreachable; seeing it means a
    /// definition bypassed validation.
    #[error("field `{field}` of {register} has invalid bit range [{high}:{low}]")]
    FieldRange
    {
        register: String,
        field: String,
        high: u8,
        low: u8,
    },

    /// A persisted snapshot was structurally valid JSON but semantically wrong
    #[error("invalid snapshot: {0}")]
    SnapshotFormat(String),

    /// Invalid argument passed to an operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (for snapshot files, spawning the debugger, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, RegisterError>`
///
/// ```rust
/// use aplreg_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, RegisterError>;
