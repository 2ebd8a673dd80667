//! Rendering of a platform table into the links-file syntax.
//!
//! The target files build `Map<string, Map<number, string>>` values from
//! nested array literals. Only the version, the CUDA ordinal and the URL are
//! written; checksums and sizes stay in memory.

use crate::aggregate::{PlatformTable, VariantEntry};

const VERSION_INDENT: &str = "      ";
const VERSION_BODY_INDENT: &str = "        ";
const VARIANT_INDENT: &str = "          ";
const VARIANT_BODY_INDENT: &str = "            ";

/// Render the entries that go between the opening marker and the closing
/// `])`. Entries are separated by `,\n`; there is no trailing newline.
pub fn render_table(table: &PlatformTable) -> String {
    table
        .iter()
        .map(|(version, variants)| render_version(version.as_str(), variants))
        .collect::<Vec<_>>()
        .join(",\n")
}

fn render_version(version: &str, variants: &[VariantEntry]) -> String {
    let items = variants
        .iter()
        .map(render_variant)
        .collect::<Vec<_>>()
        .join(",\n");

    let mut out = String::new();
    out.push_str(VERSION_INDENT);
    out.push_str("[\n");
    out.push_str(VERSION_BODY_INDENT);
    out.push_str(&quote(version));
    out.push_str(",\n");
    out.push_str(VERSION_BODY_INDENT);
    out.push_str("new Map([\n");
    out.push_str(&items);
    out.push('\n');
    out.push_str(VERSION_BODY_INDENT);
    out.push_str("])\n");
    out.push_str(VERSION_INDENT);
    out.push(']');
    out
}

fn render_variant(entry: &VariantEntry) -> String {
    format!(
        "{outer}[\n{inner}{},\n{inner}{}\n{outer}]",
        entry.ordinal,
        quote(&entry.url),
        outer = VARIANT_INDENT,
        inner = VARIANT_BODY_INDENT,
    )
}

/// Single-quoted string literal.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}
