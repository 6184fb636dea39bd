//! Untyped tables as they come off disk.
//!
//! Sources disagree on headers, encodings and cell types, so every loader
//! produces a `RawTable` of `Cell`s and the feature stages pick typed columns
//! out of it.

pub mod delimited;
pub mod sheet;
pub mod write;

use crate::time::{parse_loose_date, ymd_from_compact};
use anyhow::bail;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::path::Path;

pub use write::{format_value, write_csv, write_csv_with_bom};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn from_text(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Non-empty text; numbers and dates are not text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    return None;
                }
                t.replace(',', "").parse::<f64>().ok()
            }
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::DateTime(dt) => Some(dt.date()),
            Cell::Text(s) => parse_loose_date(s),
            Cell::Number(v) if v.fract() == 0.0 && *v >= 0.0 => {
                ymd_from_compact(&format!("{}", *v as u64))
            }
            _ => None,
        }
    }

    /// How the cell reads when printed back, used in diagnostics.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(v) => format_value(Some(*v)),
            Cell::DateTime(dt) => dt.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rename_columns(&mut self, f: impl Fn(&str) -> String) {
        for c in &mut self.columns {
            *c = f(c);
        }
    }

    pub fn drop_column(&mut self, idx: usize) {
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
    }

    /// Stacks tables vertically, aligning columns by name.
    ///
    /// The result carries the union of columns in order of first appearance;
    /// cells a table does not have are `Empty`.
    pub fn concat(tables: impl IntoIterator<Item = RawTable>) -> RawTable {
        let mut out = RawTable::default();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for table in tables {
            let mapping: Vec<usize> = table
                .columns
                .iter()
                .map(|name| {
                    *positions.entry(name.clone()).or_insert_with(|| {
                        out.columns.push(name.clone());
                        out.columns.len() - 1
                    })
                })
                .collect();

            let width = out.columns.len();
            for row in &mut out.rows {
                row.resize(width, Cell::Empty);
            }

            for row in table.rows {
                let mut aligned = vec![Cell::Empty; width];
                for (cell, &dst) in row.into_iter().zip(&mapping) {
                    aligned[dst] = cell;
                }
                out.rows.push(aligned);
            }
        }

        out
    }
}

/// First alias, in priority order, that names a column. `None` when no alias matches.
pub fn resolve_column(columns: &[String], aliases: &[String]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| columns.iter().position(|c| c == alias))
}

/// Loads a table, choosing the reader by file extension.
pub fn load_table(path: &Path) -> anyhow::Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => delimited::read_csv_file(path),
        "xlsx" | "xlsm" | "xls" | "ods" => sheet::read_first_sheet(path),
        other => bail!("unsupported table format {other:?}: {}", path.display()),
    }
}
