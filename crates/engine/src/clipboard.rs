//! Clipboard text -> rectangular grid of raw cell strings.
//!
//! Tab-delimited text (what spreadsheets put on the clipboard) is split on
//! tabs only. Anything without a tab is read as CSV with the `csv` crate:
//! fields may be quoted to hold commas or newlines, and `""` inside quotes is
//! a literal quote.
//!
//! Parsing never fails. An unterminated quote swallows the rest of the input
//! into the open field.

use gridpaste_core::ColumnDef;

/// Parsed clipboard content, one inner vec per row. Always rectangular.
pub type Grid = Vec<Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
}

impl Delimiter {
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Tab => '\t',
            Delimiter::Comma => ',',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Drop the first row when it repeats the column labels.
    pub skip_header: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { skip_header: true }
    }
}

/// Any tab anywhere means TSV.
pub fn detect_delimiter(raw: &str) -> Delimiter {
    if raw.contains('\t') {
        Delimiter::Tab
    } else {
        Delimiter::Comma
    }
}

/// Parse with default options (header row stripped when present).
pub fn parse_clipboard(raw: &str, columns: &[ColumnDef]) -> Grid {
    parse_clipboard_with(raw, columns, ParseOptions::default())
}

pub fn parse_clipboard_with(raw: &str, columns: &[ColumnDef], options: ParseOptions) -> Grid {
    let mut rows = match detect_delimiter(raw) {
        Delimiter::Tab => split_tsv(raw),
        Delimiter::Comma => split_csv(raw),
    };

    // A lone newline (or a lone quote) is nothing, not one blank cell.
    if rows.len() == 1 && rows[0].len() == 1 && rows[0][0].is_empty() {
        rows.clear();
    }

    if options.skip_header && rows.first().is_some_and(|first| is_header_row(first, columns)) {
        rows.remove(0);
    }

    pad_to_rectangle(rows)
}

/// True if `cells` spells out the column labels (or ids) in order.
///
/// Case-insensitive; surrounding whitespace and trailing empty cells are ignored.
pub fn is_header_row(cells: &[String], columns: &[ColumnDef]) -> bool {
    if columns.is_empty() {
        return false;
    }
    let used = cells
        .iter()
        .rposition(|c| !c.trim().is_empty())
        .map_or(0, |last| last + 1);
    if used != columns.len() {
        return false;
    }
    cells[..used].iter().zip(columns).all(|(cell, column)| {
        let cell = cell.trim().to_lowercase();
        cell == column.label().to_lowercase() || cell == column.id.to_lowercase()
    })
}

fn split_tsv(raw: &str) -> Vec<Vec<String>> {
    let mut lines: Vec<&str> = raw.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
        .into_iter()
        .map(|line| {
            line.strip_suffix('\r')
                .unwrap_or(line)
                .split('\t')
                .map(str::to_string)
                .collect()
        })
        .collect()
}

/// CSV records via the `csv` reader. Only `\n` ends a record so that a `\r`
/// left at the end of the last field can be stripped like in TSV input.
/// Blank lines produce no record.
fn split_csv(raw: &str) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_reader(raw.as_bytes());

    let mut rows = Vec::new();
    for result in reader.byte_records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("clipboard: CSV read stopped early: {}", e);
                break;
            }
        };
        let mut row: Vec<String> = record
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();
        if let Some(last) = row.last_mut() {
            if last.ends_with('\r') {
                last.pop();
            }
        }
        rows.push(row);
    }
    rows
}

fn pad_to_rectangle(mut rows: Vec<Vec<String>>) -> Grid {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }
    rows
}
