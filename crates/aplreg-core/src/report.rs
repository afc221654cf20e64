//! # Reports
//!
//! Plain-text and JSON rendering of every result the toolkit produces.
//!
//! Text output is meant for a terminal; JSON output is the persisted
//! snapshot structure (for dumps) or a direct serialization of the result.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use crate::catalog::{Catalog, MatchKind, SearchHit};
use crate::codec::to_sys_reg_notation;
use crate::dump::{Diff, DiffStatus, DumpReport};
use crate::error::Result;
use crate::parser::undocumented_bits;
use crate::research::{BehaviorSummary, BitStability, FieldInference, ProbeReport};
use crate::types::{Category, FieldKind, ParsedField, RegisterDefinition};

/// Rendering of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat
{
    /// Human-readable table
    #[default]
    Text,
    /// Structured JSON
    Json,
}

impl fmt::Display for OutputFormat
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

impl FromStr for OutputFormat
{
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err>
    {
        match s.to_ascii_lowercase().as_str() {
            "text" | "table" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {s}. Use 'text' or 'json'")),
        }
    }
}

fn hex(value: Option<u64>) -> String
{
    value.map_or_else(|| String::from("-"), |v| format!("{v:#018x}"))
}

/// One decoded register
pub fn register_text(definition: &RegisterDefinition, value: u64, fields: &[ParsedField]) -> String
{
    let mut out = String::new();
    let _ = writeln!(out, "{} ({}) = {value:#018x}", definition.name, definition.encoding);
    if let Some(description) = &definition.description {
        let _ = writeln!(out, "  {description}");
    }
    let _ = writeln!(out, "  Category: {}", definition.category);

    if fields.is_empty() {
        let _ = writeln!(out, "  (no documented fields)");
    } else {
        let label_width = fields.iter().map(|f| f.label.len()).max().unwrap_or(0);
        for field in fields {
            let _ = writeln!(
                out,
                "  {:<9} {:<label_width$}  {}",
                field.bits.to_string(),
                field.label,
                field.rendered_text
            );
        }
    }

    let extra = undocumented_bits(definition, value);
    if extra != 0 && !definition.fields.is_empty() {
        let _ = writeln!(out, "  Undocumented bits set: {extra:#x}");
    }
    out
}

/// Table of a dump's readings plus its tally
pub fn dump_table(catalog: &Catalog, report: &DumpReport) -> String
{
    let snapshot = &report.snapshot;
    let mut out = String::new();

    let filter = snapshot.category_filter().map_or("all", Category::as_str);
    let _ = writeln!(
        out,
        "Snapshot \"{}\" (category: {filter}, taken {})",
        snapshot.label(),
        snapshot.created_at().to_rfc3339()
    );

    let name_width = snapshot
        .readings()
        .iter()
        .map(|r| r.register_name().len())
        .max()
        .unwrap_or(0)
        .max(4);
    let _ = writeln!(out, "{:<name_width$}  {:<16}  {:<16}  VALUE", "NAME", "ENCODING", "CATEGORY");

    for reading in snapshot.readings() {
        let category = catalog
            .lookup_by_encoding(reading.encoding())
            .map_or("-", |def| def.category.as_str());
        let value = match reading.value() {
            Some(v) => format!("{v:#018x}"),
            None => format!("error: {}", reading.error_detail().unwrap_or("read failed")),
        };
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<16}  {:<16}  {value}",
            reading.register_name(),
            reading.encoding().to_string(),
            category
        );
    }

    let _ = write!(out, "{} registers: {}", snapshot.len(), report.tally);
    if report.interrupted {
        let _ = write!(out, " (interrupted)");
    }
    out.push('\n');
    out
}

/// Catalog listing grouped by category
pub fn catalog_text(catalog: &Catalog, filter: Option<Category>) -> String
{
    let mut out = String::new();
    let registers = catalog.list(filter);
    let name_width = registers.iter().map(|d| d.name.len()).max().unwrap_or(0);

    for (category, _) in catalog.categories() {
        let members: Vec<&&RegisterDefinition> = registers.iter().filter(|d| d.category == category).collect();
        if members.is_empty() {
            continue;
        }

        let _ = writeln!(out, "{category} ({})", members.len());
        for def in members {
            let _ = writeln!(
                out,
                "  {:<name_width$}  {:<16}  {:>2} fields  {}",
                def.name,
                def.encoding.to_string(),
                def.fields.len(),
                def.description.as_deref().unwrap_or("")
            );
        }
    }

    let _ = writeln!(out, "{} registers", registers.len());
    out
}

/// Catalog listing as JSON
pub fn catalog_json(catalog: &Catalog, filter: Option<Category>) -> Result<String>
{
    Ok(serde_json::to_string_pretty(&catalog.list(filter))?)
}

/// Layout of one register without a value
pub fn describe_text(definition: &RegisterDefinition) -> String
{
    let mut out = String::new();
    let _ = writeln!(out, "{}", definition.name);
    let _ = writeln!(
        out,
        "  Encoding: {} / {}",
        definition.encoding,
        to_sys_reg_notation(definition.encoding)
    );
    let _ = writeln!(out, "  Category: {}", definition.category);
    if let Some(description) = &definition.description {
        let _ = writeln!(out, "  {description}");
    }

    if definition.fields.is_empty() {
        let _ = writeln!(out, "  (no documented fields)");
        return out;
    }

    let label_width = definition.fields.iter().map(|f| f.label.len()).max().unwrap_or(0);
    for field in &definition.fields {
        let _ = writeln!(
            out,
            "  {:<9} {:<label_width$}  {}",
            field.bits.to_string(),
            field.label,
            field.kind.name()
        );
        if let FieldKind::Enum(values) = &field.kind {
            for (value, meaning) in values.iter() {
                let _ = writeln!(out, "  {:<9} {:<label_width$}    {value} = {meaning}", "", "");
            }
        }
    }
    out
}

/// Register layout as JSON
pub fn describe_json(definition: &RegisterDefinition) -> Result<String>
{
    Ok(serde_json::to_string_pretty(definition)?)
}

/// Search results, one line each
pub fn search_text(query: &str, hits: &[SearchHit]) -> String
{
    let mut out = String::new();
    if hits.is_empty() {
        let _ = writeln!(out, "No matches for \"{query}\"");
        return out;
    }

    let name_width = hits.iter().map(|h| h.register.len()).max().unwrap_or(0);
    for hit in hits {
        let detail = match (hit.kind, &hit.field, hit.bits) {
            (MatchKind::Field, Some(field), Some(bits)) => format!("{bits} {field}"),
            _ => hit.description.clone().unwrap_or_default(),
        };
        let _ = writeln!(
            out,
            "  {:<11}  {:<name_width$}  {:<16}  {detail}",
            hit.kind.as_str(),
            hit.register,
            hit.category.as_str()
        );
    }
    let _ = writeln!(out, "{} matches for \"{query}\"", hits.len());
    out
}

/// Search results as JSON
pub fn search_json(hits: &[SearchHit]) -> Result<String>
{
    Ok(serde_json::to_string_pretty(hits)?)
}

/// Glossary entries, one per line
pub fn glossary_text(entries: &[(&str, &str)]) -> String
{
    let width = entries.iter().map(|(term, _)| term.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (term, meaning) in entries {
        let _ = writeln!(out, "{term:<width$}  {meaning}");
    }
    out
}

/// Differences between two snapshots, then the summary
pub fn diff_text(a_label: &str, b_label: &str, diff: &Diff) -> String
{
    let mut out = String::new();
    let _ = writeln!(out, "Comparing \"{a_label}\" -> \"{b_label}\"");

    let name_width = diff.entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    for entry in diff.differences() {
        let _ = write!(
            out,
            "  {:<10}  {:<name_width$}  {} -> {}",
            entry.status.name(),
            entry.name,
            hex(entry.before),
            hex(entry.after)
        );
        if let DiffStatus::Changed { fields } = &entry.status {
            if !fields.is_empty() {
                let _ = write!(out, "  fields: {}", fields.join(", "));
            }
        }
        out.push('\n');
    }

    let s = diff.summary();
    let _ = writeln!(
        out,
        "Summary: {} changed, {} added, {} removed, {} unreadable, {} unchanged",
        s.changed, s.added, s.removed, s.unreadable, s.unchanged
    );
    out
}

/// Diff as JSON
pub fn diff_json(diff: &Diff) -> Result<String>
{
    Ok(serde_json::to_string_pretty(diff)?)
}

/// Responsive encodings of a probe, then its tally
pub fn probe_text(report: &ProbeReport) -> String
{
    let mut out = String::new();
    for hit in report.responsive() {
        let _ = writeln!(
            out,
            "{:<16}  {:<26}  {}  {}",
            hit.encoding.to_string(),
            to_sys_reg_notation(hit.encoding),
            hex(hit.reading.value()),
            hit.pattern().map_or("-", |p| p.as_str())
        );
    }

    let _ = writeln!(
        out,
        "Probed {} encodings ({} already catalogued): {} responsive, {} non-zero; {}",
        report.hits.len(),
        report.skipped_known,
        report.tally.succeeded,
        report.nonzero().count(),
        report.tally
    );
    out
}

/// Sampling summary plus per-bit inference, if one could be made
pub fn behavior_text(name: &str, summary: &BehaviorSummary, inference: Option<&FieldInference>) -> String
{
    let mut out = String::new();
    let _ = writeln!(out, "{name}: {} samples ({} failed)", summary.iterations, summary.failed);
    let _ = writeln!(
        out,
        "  {} ({} unique values, {} changes)",
        if summary.is_stable() { "stable" } else { "unstable" },
        summary.unique_values.len(),
        summary.changes.len()
    );

    for change in summary.changes.iter().take(10) {
        let _ = writeln!(
            out,
            "    #{:<5} {:#018x} -> {:#018x}",
            change.iteration, change.old, change.new
        );
    }
    if summary.changes.len() > 10 {
        let _ = writeln!(out, "    ... and {} more", summary.changes.len() - 10);
    }

    if let Some(inference) = inference {
        let map: String = (0..64u8)
            .rev()
            .map(|bit| match inference.bit(bit) {
                BitStability::Volatile => 'x',
                BitStability::Static(true) => '1',
                BitStability::Static(false) => '0',
            })
            .collect();
        let _ = writeln!(out, "  bits 63..0: {map}");

        let candidates = inference.candidates();
        if candidates.is_empty() {
            let _ = writeln!(out, "  no volatile bits");
        } else {
            let _ = writeln!(out, "  candidate fields (advisory):");
            for candidate in candidates {
                let _ = writeln!(out, "    {:<9} {}", candidate.bits.to_string(), candidate.shape);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::parser::parse_value;
    use crate::types::{Encoding, FieldDefinition};

    #[test]
    fn test_output_format_from_str()
    {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_register_text()
    {
        let def = RegisterDefinition::new("DEMO", Encoding::new_unchecked(3, 0, 15, 0, 0), Category::Hid)
            .with_description("Demo register")
            .with_field(FieldDefinition::flag(0, "Enable"));
        let fields = parse_value(&def, 0x11).unwrap();
        let text = register_text(&def, 0x11, &fields);

        assert!(text.starts_with("DEMO (s3_0_c15_c0_0) = 0x0000000000000011\n"));
        assert!(text.contains("Demo register"));
        assert!(text.contains("[0]"));
        assert!(text.contains("Enable  set"));
        assert!(text.contains("Undocumented bits set: 0x10"));
    }

    #[test]
    fn test_search_text()
    {
        let catalog = Catalog::apple_silicon().unwrap();
        let hits = catalog.search("loop buffer");
        let text = search_text("loop buffer", &hits);

        assert!(text.contains("SYS_APL_HID0_EL1"));
        assert!(text.contains("[20] Loop Buffer Disable"));
        assert!(text.ends_with(&format!("{} matches for \"loop buffer\"\n", hits.len())));
        assert_eq!(search_text("zzz", &[]), "No matches for \"zzz\"\n");

        let json: serde_json::Value = serde_json::from_str(&search_json(&hits).unwrap()).unwrap();
        assert_eq!(json[0]["match"], "field");
        assert_eq!(json[0]["encoding"], "s3_0_c15_c0_0");
    }

    #[test]
    fn test_describe_text_lists_enum_values()
    {
        let def = RegisterDefinition::new("DEMO", Encoding::new_unchecked(3, 0, 15, 0, 0), Category::Hid).with_field(
            FieldDefinition::enumerated(1, 0, "Mode", crate::types::Enumeration::new().with(1, "fast")),
        );
        let text = describe_text(&def);

        assert!(text.contains("Encoding: s3_0_c15_c0_0 / sys_reg(3, 0, 15, 0, 0)"));
        assert!(text.contains("Mode  enum"));
        assert!(text.contains("1 = fast"));
    }
}
