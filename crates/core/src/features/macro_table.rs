use crate::config::MacroTableConfig;
use crate::domain::MacroTable;
use crate::error::SourceError;
use crate::tabular::{load_table, RawTable};
use anyhow::Context;
use std::path::Path;

/// Loads the cleaned macro table shared by every instrument.
///
/// Headers are lower-cased and trimmed, configured columns are dropped and
/// dates are truncated to the day. Any problem here is fatal for the run.
pub fn load_macro_table(path: &Path, cfg: &MacroTableConfig) -> anyhow::Result<MacroTable> {
    if !path.exists() {
        return Err(SourceError::MissingSourceFile {
            path: path.to_path_buf(),
        }
        .into());
    }

    let raw = load_table(path)
        .with_context(|| format!("failed to load macro table {}", path.display()))?;
    macro_table_from_raw(raw, path, cfg)
}

pub fn macro_table_from_raw(
    mut raw: RawTable,
    path: &Path,
    cfg: &MacroTableConfig,
) -> anyhow::Result<MacroTable> {
    raw.rename_columns(|c| c.trim().to_lowercase());

    for dropped in &cfg.drop_columns {
        let dropped = dropped.trim().to_lowercase();
        if let Some(idx) = raw.column_index(&dropped) {
            tracing::info!(column = %dropped, "dropping macro column");
            raw.drop_column(idx);
        }
    }

    let date_column = cfg.date_column.trim().to_lowercase();
    let date_idx = raw
        .column_index(&date_column)
        .ok_or_else(|| SourceError::missing_column(path, &date_column))?;

    let value_indices: Vec<usize> = (0..raw.columns.len()).filter(|i| *i != date_idx).collect();
    let columns: Vec<String> = value_indices
        .iter()
        .map(|i| raw.columns[*i].clone())
        .collect();

    let mut table = MacroTable::new(columns);
    let mut duplicates = 0usize;
    for (row_no, row) in raw.rows.iter().enumerate() {
        let date = row[date_idx]
            .as_date()
            .ok_or_else(|| SourceError::UnparseableDate {
                path: path.to_path_buf(),
                row: row_no + 1,
                value: row[date_idx].display(),
            })?;

        let values = value_indices.iter().map(|i| row[*i].as_f64()).collect();
        if !table.insert(date, values) {
            duplicates += 1;
        }
    }

    if duplicates > 0 {
        tracing::warn!(
            duplicates,
            path = %path.display(),
            "macro table has repeated dates; kept first"
        );
    }

    tracing::info!(
        rows = table.len(),
        columns = ?table.columns,
        range = ?table.date_range(),
        "macro table loaded"
    );
    Ok(table)
}
