//! Renderer-agnostic command results.
//!
//! Every command produces a [`TabularResult`]: ordered column names and
//! rows of text cells. Masking and truncation happen here, once, so the
//! table and structured renderers never disagree about what is shown.

use serde_json::{Map, Value};

use crate::error::CoreError;

/// Replacement text for sensitive values.
pub const MASK: &str = "********";

/// Cells longer than this many characters are truncated.
pub const MAX_CELL_CHARS: usize = 60;

const ELLIPSIS: &str = "...";
const SENSITIVE_MARKERS: &[&str] = &["password", "secret", "token", "key"];

/// Whether values in `column` must be masked.
pub fn is_sensitive(column: &str) -> bool {
    let lower = column.to_ascii_lowercase();
    SENSITIVE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Mask or truncate one cell for display.
pub fn sanitize_cell(column: &str, value: &str) -> String {
    if is_sensitive(column) && !value.is_empty() {
        return MASK.to_owned();
    }
    if value.chars().count() > MAX_CELL_CHARS {
        let keep = MAX_CELL_CHARS - ELLIPSIS.len();
        let mut out: String = value.chars().take(keep).collect();
        out.push_str(ELLIPSIS);
        return out;
    }
    value.to_owned()
}

/// Ordered columns plus rows of text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularResult {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TabularResult {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Single-row result from `(column, value)` pairs, used by detail views.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let (columns, row): (Vec<String>, Vec<String>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())).unzip();
        Self {
            columns,
            rows: vec![row],
        }
    }

    /// Append a row; its arity must match the columns.
    pub fn push_row<I, S>(&mut self, row: I) -> Result<(), CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = row.into_iter().map(Into::into).collect();
        if row.len() != self.columns.len() {
            return Err(CoreError::Internal(format!(
                "row has {} cells but the result has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stable sort on one column's text; unknown columns are ignored.
    pub fn sort_by_column(&mut self, column: &str) {
        if let Some(idx) = self.columns.iter().position(|c| c == column) {
            self.rows.sort_by(|a, b| a.get(idx).cmp(&b.get(idx)));
        }
    }

    /// Copy with sensitive columns masked and long cells truncated.
    pub fn sanitized(&self) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(col, cell)| sanitize_cell(col, cell))
                    .collect()
            })
            .collect();
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Rows as JSON objects keyed by column name, preserving column order.
    pub fn records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let record: Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(col, cell)| (col.clone(), Value::String(cell.clone())))
                    .collect();
                Value::Object(record)
            })
            .collect()
    }
}
