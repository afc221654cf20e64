//! Free-text search over register names, descriptions and field labels.

use serde::Serialize;

use super::Catalog;
use crate::types::{BitRange, Category, Encoding};

/// What part of a definition matched a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind
{
    /// The register name
    Name,
    /// The register description
    Description,
    /// A field label
    Field,
}

impl MatchKind
{
    pub const fn as_str(self) -> &'static str
    {
        match self {
            MatchKind::Name => "name",
            MatchKind::Description => "description",
            MatchKind::Field => "field",
        }
    }
}

/// One search result
///
/// `field` and `bits` are set only for [`MatchKind::Field`] hits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit
{
    pub register: String,
    pub encoding: Encoding,
    pub category: Category,
    #[serde(rename = "match")]
    pub kind: MatchKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bits: Option<BitRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Catalog
{
    /// Case-insensitive substring search
    ///
    /// Registers are visited in catalog order. Each register yields at most
    /// one register-level hit (its name, else its description), followed by
    /// one hit per matching field label in field order. A blank query
    /// matches nothing.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use aplreg_core::catalog::{Catalog, MatchKind};
    ///
    /// let catalog = Catalog::apple_silicon()?;
    /// let hits = catalog.search("loop buffer");
    /// assert_eq!(hits[0].register, "SYS_APL_HID0_EL1");
    /// assert_eq!(hits[0].kind, MatchKind::Field);
    /// # Ok::<(), aplreg_core::error::RegisterError>(())
    /// ```
    pub fn search(&self, query: &str) -> Vec<SearchHit>
    {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let matches = |text: &str| text.to_lowercase().contains(&needle);

        let mut hits = Vec::new();
        for def in self {
            let register_match = if matches(&def.name) {
                Some(MatchKind::Name)
            } else if def.description.as_deref().is_some_and(matches) {
                Some(MatchKind::Description)
            } else {
                None
            };

            if let Some(kind) = register_match {
                hits.push(SearchHit {
                    register: def.name.clone(),
                    encoding: def.encoding,
                    category: def.category,
                    kind,
                    field: None,
                    bits: None,
                    description: def.description.clone(),
                });
            }

            for field in def.fields.iter().filter(|f| matches(&f.label)) {
                hits.push(SearchHit {
                    register: def.name.clone(),
                    encoding: def.encoding,
                    category: def.category,
                    kind: MatchKind::Field,
                    field: Some(field.label.clone()),
                    bits: Some(field.bits),
                    description: def.description.clone(),
                });
            }
        }
        hits
    }
}
