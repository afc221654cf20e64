//! Common module for library exports

pub use crate::catalog::Catalog;
pub use crate::codec::{parse_canonical_string, resolve, to_canonical_string};
pub use crate::dump::{compare, Diff, DiffStatus, DumpEngine, DumpReport, DumpTally, Snapshot};
pub use crate::error::{EncodingError, RegisterError, Result};
pub use crate::parser::{parse, parse_value};
pub use crate::reader::{LldbReader, LldbTarget, RegisterReader, ReplayReader, StaticReader};
pub use crate::report::OutputFormat;
pub use crate::research::{infer_fields, probe, sample, EncodingRange};
pub use crate::types::{
    BitRange, Category, Encoding, Enumeration, FieldDefinition, FieldKind, ParsedField, RawReading, RegisterDefinition,
};
