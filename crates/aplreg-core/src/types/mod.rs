//! # Types
//!
//! Data model shared by every component: encodings, categories, register
//! and field definitions, and readings.
//!
//! These types carry no behaviour beyond construction and simple queries;
//! validation lives in the catalog and interpretation in the parser.

pub mod category;
pub mod encoding;
pub mod field;
pub mod reading;
pub mod register;

// Re-export all public types
pub use category::Category;
pub use encoding::Encoding;
pub use field::{BitRange, Enumeration, FieldDefinition, FieldKind};
pub use reading::{ParsedField, RawReading};
pub use register::RegisterDefinition;
