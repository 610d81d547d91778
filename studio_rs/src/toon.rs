//! Tolerant parser for tool-bridge response payloads.
//!
//! The SochDB engine serializes query results through two independent code
//! paths: a JSON formatter and the compact "toon" text formatter
//! (`results[N]{cols}:` header plus comma-delimited lines). Callers cannot
//! predict which one a given tool returns, so everything here resolves both
//! to the same logical shape. Precedence is fixed: JSON attempt first, toon
//! line grammar second, empty sentinel last - and no input is ever an
//! error.
//!
//! The identifier regex and the `"null"` literal exclusion below are
//! heuristics inferred from observed engine output, not a formal grammar.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Literal prefix of the optional toon header line.
pub const TOON_HEADER_PREFIX: &str = "results[";

/// Bare identifiers that may be qualified into `/<table>/<id>` paths.
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("identifier pattern is valid"));

/// Result of a key scan. `Empty` is the valid zero-record outcome, not an
/// error; transport failures are sentineled by the caller instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    Keys(Vec<String>),
    Empty,
}

/// Tabular decode of a toon payload: optional header columns plus every
/// line split into trimmed fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RowSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Extract qualified key paths from a scan payload.
///
/// JSON attempt first: an array yields the string `_path` field of each
/// element in source order, silently skipping elements without one. A parse
/// failure or a non-array value falls through to the toon line grammar,
/// where the first comma-field of each data line is classified: `/`-prefixed
/// paths pass verbatim, bare identifiers are qualified against `table`,
/// anything else (including the literal `null`) is discarded.
pub fn scan_keys(body: &str, table: &str) -> ScanOutcome {
    let keys = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("_path").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        _ => fallback_keys(body, table),
    };
    if keys.is_empty() {
        ScanOutcome::Empty
    } else {
        ScanOutcome::Keys(keys)
    }
}

fn fallback_keys(body: &str, table: &str) -> Vec<String> {
    let mut keys = Vec::new();
    for line in data_lines(body) {
        let first = match line.split(',').next() {
            Some(field) => field.trim(),
            None => continue,
        };
        if first.is_empty() || first == "null" {
            continue;
        }
        if first.starts_with('/') {
            keys.push(first.to_string());
        } else if IDENTIFIER.is_match(first) {
            keys.push(format!("/{table}/{first}"));
        }
        // Anything else is noise from the formatter; drop it silently.
    }
    keys
}

/// Table names from a `list_tables` payload: first field of every data
/// line, with blanks and the `null` literal dropped.
pub fn table_names(body: &str) -> Vec<String> {
    data_lines(body)
        .filter_map(|line| line.split(',').next())
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "null")
        .map(str::to_string)
        .collect()
}

/// Full tabular decode. Column names come from the optional
/// `results[N]{a,b}:` header; without one the column list is empty and
/// consumers fall back to positional fields.
pub fn row_set(body: &str) -> RowSet {
    let mut lines = non_blank_lines(body).peekable();

    let columns = match lines.peek() {
        Some(line) if line.starts_with(TOON_HEADER_PREFIX) => {
            let header = lines.next().unwrap_or_default();
            header_columns(header)
        }
        _ => Vec::new(),
    };

    let rows = lines
        .map(|line| {
            line.split(',')
                .map(|field| field.trim().to_string())
                .collect()
        })
        .collect();

    RowSet { columns, rows }
}

/// Columns from a `results[N]{a,b}:` header line. Tolerates a missing or
/// empty `{...}` section.
fn header_columns(header: &str) -> Vec<String> {
    let Some(open) = header.find('{') else {
        return Vec::new();
    };
    let Some(close) = header[open..].find('}') else {
        return Vec::new();
    };
    header[open + 1..open + close]
        .split(',')
        .map(str::trim)
        .filter(|col| !col.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank_lines(body: &str) -> impl Iterator<Item = &str> {
    body.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Data lines: blanks removed, at most one leading header line dropped.
fn data_lines(body: &str) -> impl Iterator<Item = &str> {
    let mut lines = non_blank_lines(body).peekable();
    if lines
        .peek()
        .is_some_and(|line| line.starts_with(TOON_HEADER_PREFIX))
    {
        lines.next();
    }
    lines
}
