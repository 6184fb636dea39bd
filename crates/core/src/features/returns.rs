use crate::config::PriceSourceConfig;
use crate::domain::ReturnRow;
use crate::error::SourceError;
use crate::tabular::{load_table, RawTable};
use anyhow::Context;
use chrono::NaiveDate;
use std::path::Path;

/// Loads one instrument's price file and turns it into daily returns.
pub fn load_returns(path: &Path, cfg: &PriceSourceConfig) -> anyhow::Result<Vec<ReturnRow>> {
    if !path.exists() {
        return Err(SourceError::MissingSourceFile {
            path: path.to_path_buf(),
        }
        .into());
    }

    let raw =
        load_table(path).with_context(|| format!("failed to load prices {}", path.display()))?;
    returns_from_raw(&raw, path, cfg)
}

pub fn returns_from_raw(
    raw: &RawTable,
    path: &Path,
    cfg: &PriceSourceConfig,
) -> anyhow::Result<Vec<ReturnRow>> {
    let date_idx = raw
        .column_index(&cfg.date_column)
        .ok_or_else(|| SourceError::missing_column(path, &cfg.date_column))?;
    let close_idx = raw
        .column_index(&cfg.close_column)
        .ok_or_else(|| SourceError::missing_column(path, &cfg.close_column))?;

    let mut closes = Vec::with_capacity(raw.len());
    for (row_no, row) in raw.rows.iter().enumerate() {
        let date = row[date_idx]
            .as_date()
            .ok_or_else(|| SourceError::UnparseableDate {
                path: path.to_path_buf(),
                row: row_no + 1,
                value: row[date_idx].display(),
            })?;
        closes.push((date, row[close_idx].as_f64()));
    }

    Ok(daily_returns(closes))
}

/// `(close[i] / close[i-1] - 1) * 100` over the date-sorted series.
///
/// The first observation has no return. A missing close removes both the
/// return on its own day and the one on the following day.
pub fn daily_returns(mut closes: Vec<(NaiveDate, Option<f64>)>) -> Vec<ReturnRow> {
    closes.sort_by_key(|(date, _)| *date);

    closes
        .windows(2)
        .filter_map(|w| {
            let (_, prev) = w[0];
            let (date, close) = w[1];
            let ret = (close? / prev? - 1.0) * 100.0;
            ret.is_finite().then_some(ReturnRow { date, ret })
        })
        .collect()
}
