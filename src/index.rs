//! Plain-text catalog of a family's documents, `<prefix>-index.txt`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use crate::family::Family;
use crate::record::Listing;

/// Right margin of index entries.
pub const INDEX_WIDTH: usize = 73;

/// Render the whole index: header, then one entry per record by
/// descending document id.
pub fn render_index(family: Family, listing: &Listing, today: NaiveDate) -> String {
    let column = family.index_column();
    let indent = " ".repeat(column);
    let mut out = format!(
        "ICANN {} document index as of {}\n\n",
        family.name(),
        today.format("%d-%b-%Y")
    );

    for record in listing.values().rev() {
        let text = match &record.published_date {
            Some(date) => format!("{} ({})", record.title, date),
            None => record.title.clone(),
        };
        for line in wrap_entry(&record.document_id, &text, column, INDEX_WIDTH) {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&indent);
        out.push_str(record.source_url.as_str());
        out.push_str("\n\n");
    }
    out
}

/// Replace the family's index file with a fresh rendering.
pub fn write_index(
    dir: &Path,
    family: Family,
    listing: &Listing,
    today: NaiveDate,
) -> Result<PathBuf> {
    let path = dir.join(family.index_filename());
    fs::write(&path, render_index(family, listing, today))
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Greedy word wrap with a hanging indent, measured in characters. `lead`
/// starts the first line, padded to `column` and always followed by at
/// least one space; words longer than the width are never split.
fn wrap_entry(lead: &str, text: &str, column: usize, width: usize) -> Vec<String> {
    let mut line = format!("{:<column$}", lead);
    let mut used = line.chars().count();
    if used == lead.chars().count() {
        line.push(' ');
        used += 1;
    }
    let mut lines = Vec::new();
    let mut fresh = true;

    for word in text.split_whitespace() {
        let chars = word.chars().count();
        if !fresh && used + 1 + chars > width {
            lines.push(line.trim_end().to_string());
            line = " ".repeat(column);
            used = column;
            fresh = true;
        }
        if !fresh {
            line.push(' ');
            used += 1;
        }
        line.push_str(word);
        used += chars;
        fresh = false;
    }
    lines.push(line.trim_end().to_string());
    lines
}
