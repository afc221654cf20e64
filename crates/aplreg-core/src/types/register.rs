//! Register definitions.

use serde::Serialize;

use super::{Category, Encoding, FieldDefinition};

/// A known system register and its bitfield schema
///
/// Definitions are immutable once a [`Catalog`] is built from them; the
/// catalog owns them and hands out shared references.
///
/// ## Example
///
/// ```rust
/// use aplreg_core::types::{Category, Encoding, FieldDefinition, RegisterDefinition};
///
/// let def = RegisterDefinition::new("SYS_APL_HID0_EL1", Encoding::new_unchecked(3, 0, 15, 0, 0), Category::Hid)
///     .with_field(FieldDefinition::flag(20, "Loop Buffer Disable"))
///     .with_field(FieldDefinition::counter(62, 60, "Instruction Cache Prefetch Depth"));
///
/// assert_eq!(def.fields.len(), 2);
/// assert_eq!(def.canonical_name(), "s3_0_c15_c0_0");
/// ```
///
/// [`Catalog`]: crate::catalog::Catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterDefinition
{
    pub name: String,
    pub encoding: Encoding,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
}

impl RegisterDefinition
{
    pub fn new(name: impl Into<String>, encoding: Encoding, category: Category) -> Self
    {
        RegisterDefinition {
            name: name.into(),
            encoding,
            category,
            description: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self
    {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldDefinition) -> Self
    {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDefinition>) -> Self
    {
        self.fields.extend(fields);
        self
    }

    /// The canonical encoding string, as accepted by `register read`
    pub fn canonical_name(&self) -> String
    {
        self.encoding.to_string()
    }

    /// Look up a field by label
    pub fn field(&self, label: &str) -> Option<&FieldDefinition>
    {
        self.fields.iter().find(|f| f.label == label)
    }

    /// Bits not covered by any declared field
    pub fn undocumented_mask(&self) -> u64
    {
        !self
            .fields
            .iter()
            .filter(|f| f.bits.is_valid())
            .fold(0u64, |acc, f| acc | f.bits.mask())
    }
}
