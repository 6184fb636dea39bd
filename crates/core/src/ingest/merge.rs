//! Wide tables built by outer-joining single-value series on date.

use crate::config::{PriceSourceConfig, SeriesGroup};
use crate::error::SourceError;
use crate::tabular::{format_value, load_table, write_csv, RawTable};
use anyhow::Context;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub name: String,
    pub points: Vec<(NaiveDate, Option<f64>)>,
}

#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    pub output: PathBuf,
    pub columns: Vec<String>,
    pub rows: usize,
    pub skipped: Vec<PathBuf>,
}

/// Full outer join on date, ascending. A series with several points on one
/// date contributes the first.
pub fn outer_join(series: &[NamedSeries]) -> BTreeMap<NaiveDate, Vec<Option<f64>>> {
    let width = series.len();
    let mut out: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    let mut filled: BTreeMap<NaiveDate, Vec<bool>> = BTreeMap::new();

    for (col, s) in series.iter().enumerate() {
        for (date, value) in &s.points {
            let row = out.entry(*date).or_insert_with(|| vec![None; width]);
            let seen = filled.entry(*date).or_insert_with(|| vec![false; width]);
            if !seen[col] {
                row[col] = *value;
                seen[col] = true;
            }
        }
    }
    out
}

/// Reads `date_column`/`value_column` out of a loaded table.
pub fn series_from_table(
    table: &RawTable,
    path: &Path,
    name: &str,
    date_column: &str,
    value_column: &str,
) -> anyhow::Result<NamedSeries> {
    let date_idx = table
        .column_index(date_column)
        .ok_or_else(|| SourceError::missing_column(path, date_column))?;
    let value_idx = table
        .column_index(value_column)
        .ok_or_else(|| SourceError::missing_column(path, value_column))?;

    let mut points = Vec::with_capacity(table.len());
    for (row_no, row) in table.rows.iter().enumerate() {
        let date = row[date_idx]
            .as_date()
            .ok_or_else(|| SourceError::UnparseableDate {
                path: path.to_path_buf(),
                row: row_no + 1,
                value: row[date_idx].display(),
            })?;
        points.push((date, row[value_idx].as_f64()));
    }

    Ok(NamedSeries {
        name: name.to_string(),
        points,
    })
}

/// Merges every per-instrument price CSV in `stock_dir` into one table of
/// closes, one column per file stem. `output` itself is never read back.
pub fn merge_price_files(
    stock_dir: &Path,
    output: &Path,
    cfg: &PriceSourceConfig,
) -> anyhow::Result<MergeReport> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(stock_dir)
        .with_context(|| format!("failed to list {}", stock_dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        })
        .filter(|p| p.file_name() != output.file_name() || p.parent() != output.parent())
        .collect();
    files.sort();

    let mut series = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();
    for path in files {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let loaded = load_table(&path).and_then(|t| {
            series_from_table(&t, &path, &name, &cfg.date_column, &cfg.close_column)
        });
        match loaded {
            Ok(s) => series.push(s),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %format!("{err:#}"),
                    "skipping price file"
                );
                skipped.push(path);
            }
        }
    }

    let mut report = write_wide(output, &cfg.date_column, &series)?;
    report.skipped = skipped;
    Ok(report)
}

/// Merges fetched series files (`<data_dir>/<group>/<name>.csv`, columns
/// `Date,Value,Name`) into the wide macro table.
pub fn merge_macro_series(
    data_dir: &Path,
    groups: &[SeriesGroup],
    output: &Path,
) -> anyhow::Result<MergeReport> {
    let mut series = Vec::new();
    let mut skipped = Vec::new();

    for group in groups {
        for s in &group.series {
            let path = data_dir.join(&group.name).join(format!("{}.csv", s.name));
            if !path.exists() {
                tracing::warn!(path = %path.display(), "macro series file missing; skipping");
                skipped.push(path);
                continue;
            }

            let loaded = load_table(&path)
                .and_then(|t| series_from_table(&t, &path, &s.name, "Date", "Value"));
            match loaded {
                Ok(ns) => series.push(ns),
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %format!("{err:#}"),
                        "skipping macro series"
                    );
                    skipped.push(path);
                }
            }
        }
    }

    let mut report = write_wide(output, "date", &series)?;
    report.skipped = skipped;
    Ok(report)
}

fn write_wide(
    output: &Path,
    date_label: &str,
    series: &[NamedSeries],
) -> anyhow::Result<MergeReport> {
    anyhow::ensure!(!series.is_empty(), "nothing to merge into {}", output.display());

    let joined = outer_join(series);
    let mut header = vec![date_label.to_string()];
    header.extend(series.iter().map(|s| s.name.clone()));

    let rows = write_csv(
        output,
        &header,
        joined.iter().map(|(date, values)| {
            let mut row = Vec::with_capacity(values.len() + 1);
            row.push(date.format("%Y-%m-%d").to_string());
            row.extend(values.iter().map(|v| format_value(*v)));
            row
        }),
    )?;

    tracing::info!(path = %output.display(), rows, columns = series.len(), "wide table written");
    Ok(MergeReport {
        output: output.to_path_buf(),
        columns: header,
        rows,
        skipped: Vec::new(),
    })
}
