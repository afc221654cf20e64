//! # Register Catalog
//!
//! The immutable table of known system registers.
//!
//! A [`Catalog`] is built once from a list of [`RegisterDefinition`]s and
//! validated as a whole. After construction it never changes; every other
//! component borrows it. There is no process-wide table: callers construct
//! the catalog they need (usually [`Catalog::apple_silicon`]) and pass it
//! down, which lets tests use small fixture catalogs.
//!
//! ## Invariants
//!
//! - register names are unique (ignoring ASCII case), and so are encodings
//! - every encoding has `op0` 2 or 3
//! - every field range lies within bits 0..=63 with `low <= high`
//! - fields of one register do not overlap and have distinct labels
//! - `Flag` fields are one bit wide; `Enum` values fit in the field width
//!
//! Violations are collected across the whole table and reported together in
//! one [`RegisterError::CatalogIntegrity`].
//!
//! [`Catalog::search`] looks through names, descriptions and field labels,
//! and [`define`] expands the abbreviations those names are built from.

mod apple;
mod glossary;
mod search;

use std::collections::HashMap;

pub use glossary::{define, glossary};
pub use search::{MatchKind, SearchHit};
use tracing::debug;

use crate::error::{RegisterError, Result};
use crate::types::{Category, Encoding, FieldKind, RegisterDefinition};

/// Validated, read-only collection of register definitions
#[derive(Debug, Clone)]
pub struct Catalog
{
    registers: Vec<RegisterDefinition>,
    by_name: HashMap<String, usize>,
    by_folded_name: HashMap<String, usize>,
    by_encoding: HashMap<Encoding, usize>,
}

impl Catalog
{
    /// Build a catalog, validating every invariant
    ///
    /// ## Errors
    ///
    /// Returns [`RegisterError::CatalogIntegrity`] naming every register that
    /// violates an invariant, with one message per violation.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use aplreg_core::catalog::Catalog;
    /// use aplreg_core::types::{Category, Encoding, FieldDefinition, RegisterDefinition};
    ///
    /// let catalog = Catalog::new(vec![
    ///     RegisterDefinition::new("DEMO", Encoding::new_unchecked(3, 0, 15, 0, 0), Category::Hid)
    ///         .with_field(FieldDefinition::flag(0, "Enable")),
    /// ])?;
    /// assert_eq!(catalog.len(), 1);
    ///
    /// let broken = Catalog::new(vec![
    ///     RegisterDefinition::new("A", Encoding::new_unchecked(3, 0, 15, 0, 0), Category::Hid),
    ///     RegisterDefinition::new("B", Encoding::new_unchecked(3, 0, 15, 0, 0), Category::Hid),
    /// ]);
    /// assert!(broken.is_err());
    /// # Ok::<(), aplreg_core::error::RegisterError>(())
    /// ```
    pub fn new(definitions: Vec<RegisterDefinition>) -> Result<Self>
    {
        let mut found = Violations::default();

        let mut by_name = HashMap::with_capacity(definitions.len());
        let mut by_folded_name = HashMap::with_capacity(definitions.len());
        let mut by_encoding = HashMap::with_capacity(definitions.len());

        for (index, def) in definitions.iter().enumerate() {
            if def.name.trim().is_empty() {
                found.push(&def.name, format!("register at position {index} has an empty name"));
            }

            if !def.encoding.is_system_register() {
                found.push(
                    &def.name,
                    format!("{}: op0 of {} is {}, expected 2 or 3", def.name, def.encoding, def.encoding.op0()),
                );
            }

            let folded = def.name.to_ascii_lowercase();
            if let Some(&first) = by_folded_name.get(&folded) {
                let other: &RegisterDefinition = &definitions[first];
                found.name(&other.name);
                found.push(&def.name, format!("duplicate name: {} and {}", other.name, def.name));
            } else {
                by_folded_name.insert(folded, index);
                by_name.insert(def.name.clone(), index);
            }

            if let Some(&first) = by_encoding.get(&def.encoding) {
                let other: &RegisterDefinition = &definitions[first];
                found.name(&other.name);
                found.push(
                    &def.name,
                    format!("duplicate encoding {}: {} and {}", def.encoding, other.name, def.name),
                );
            } else {
                by_encoding.insert(def.encoding, index);
            }

            for message in field_violations(def) {
                found.push(&def.name, message);
            }
        }

        if !found.messages.is_empty() {
            return Err(RegisterError::CatalogIntegrity {
                registers: found.registers,
                violations: found.messages,
            });
        }

        debug!(registers = definitions.len(), "Catalog validated");

        Ok(Catalog {
            registers: definitions,
            by_name,
            by_folded_name,
            by_encoding,
        })
    }

    /// The shipped Apple Silicon seed catalog
    ///
    /// The definitions are reverse-engineered from public research and are
    /// not authoritative. Treat field boundaries and enumerations as a
    /// starting point requiring independent verification.
    pub fn apple_silicon() -> Result<Self>
    {
        Self::new(apple::definitions())
    }

    /// Find a register by name, exact match first, then ignoring ASCII case
    pub fn lookup(&self, name: &str) -> Option<&RegisterDefinition>
    {
        self.by_name
            .get(name)
            .or_else(|| self.by_folded_name.get(&name.to_ascii_lowercase()))
            .map(|&index| &self.registers[index])
    }

    pub fn lookup_by_encoding(&self, encoding: Encoding) -> Option<&RegisterDefinition>
    {
        self.by_encoding.get(&encoding).map(|&index| &self.registers[index])
    }

    pub fn contains_encoding(&self, encoding: Encoding) -> bool
    {
        self.by_encoding.contains_key(&encoding)
    }

    /// Registers in insertion order, optionally restricted to one category
    pub fn list(&self, category: Option<Category>) -> Vec<&RegisterDefinition>
    {
        self.registers
            .iter()
            .filter(|def| category.is_none_or(|c| def.category == c))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisterDefinition>
    {
        self.registers.iter()
    }

    /// Categories present in the catalog, in first-seen order, with counts
    pub fn categories(&self) -> Vec<(Category, usize)>
    {
        let mut counts: Vec<(Category, usize)> = Vec::new();
        for def in &self.registers {
            match counts.iter_mut().find(|(c, _)| *c == def.category) {
                Some((_, count)) => *count += 1,
                None => counts.push((def.category, 1)),
            }
        }
        counts
    }

    pub fn len(&self) -> usize
    {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.registers.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog
{
    type Item = &'a RegisterDefinition;
    type IntoIter = std::slice::Iter<'a, RegisterDefinition>;

    fn into_iter(self) -> Self::IntoIter
    {
        self.registers.iter()
    }
}

/// Violations collected while validating, with offending register names
#[derive(Default)]
struct Violations
{
    registers: Vec<String>,
    messages: Vec<String>,
}

impl Violations
{
    fn name(&mut self, register: &str)
    {
        if !self.registers.iter().any(|r| r == register) {
            self.registers.push(register.to_string());
        }
    }

    fn push(&mut self, register: &str, message: String)
    {
        self.name(register);
        self.messages.push(message);
    }
}

/// Field-level invariant violations of one register
fn field_violations(def: &RegisterDefinition) -> Vec<String>
{
    let mut violations = Vec::new();

    for (i, field) in def.fields.iter().enumerate() {
        let bits = field.bits;
        if !bits.is_valid() {
            violations.push(format!(
                "{}: field `{}` has invalid range [{}:{}]",
                def.name, field.label, bits.high, bits.low
            ));
            continue;
        }

        match &field.kind {
            FieldKind::Flag if bits.width() != 1 => {
                violations.push(format!(
                    "{}: flag `{}` spans {} bits {bits}",
                    def.name,
                    field.label,
                    bits.width()
                ));
            }
            FieldKind::Enum(values) => {
                let limit = bits.mask() >> bits.low;
                for (value, meaning) in values.iter() {
                    if value > limit {
                        violations.push(format!(
                            "{}: enum `{}` maps {value} ({meaning}) which does not fit in {bits}",
                            def.name, field.label
                        ));
                    }
                }
            }
            _ => {}
        }

        for other in &def.fields[..i] {
            if other.label == field.label {
                violations.push(format!("{}: duplicate field label `{}`", def.name, field.label));
            }
            if other.bits.is_valid() && other.bits.overlaps(bits) {
                violations.push(format!(
                    "{}: fields `{}` {} and `{}` {bits} overlap",
                    def.name, other.label, other.bits, field.label
                ));
            }
        }
    }

    violations
}
