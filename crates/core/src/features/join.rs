use crate::config::OutputConfig;
use crate::domain::{
    EventClassifier, EventFlags, FeatureTable, FinalRow, MacroTable, NewsDailyFeature, ReturnRow,
};
use crate::tabular::{format_value, write_csv_with_bom};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;

/// Assembles the labeled table for one instrument.
///
/// Every return row is kept. A date with K news rows yields K output rows
/// sharing the return; a date without news gets count 0 and no events.
/// Macro values are looked up by date and stay `None` where the macro table
/// has no row.
pub fn join_features(
    returns: &[ReturnRow],
    news: &[NewsDailyFeature],
    macro_table: &MacroTable,
) -> FeatureTable {
    let mut by_date: HashMap<NaiveDate, Vec<&NewsDailyFeature>> = HashMap::new();
    for n in news {
        by_date.entry(n.date).or_default().push(n);
    }

    let macro_width = macro_table.columns.len();
    let macro_values = |date: NaiveDate| -> Vec<Option<f64>> {
        macro_table
            .get(date)
            .map(<[Option<f64>]>::to_vec)
            .unwrap_or_else(|| vec![None; macro_width])
    };

    let mut rows = Vec::with_capacity(returns.len().max(news.len()));
    for r in returns {
        match by_date.get(&r.date) {
            Some(matches) => {
                for n in matches {
                    rows.push(FinalRow {
                        date: r.date,
                        article_count: n.article_count,
                        flags: n.flags,
                        macro_values: macro_values(r.date),
                        target: r.ret,
                    });
                }
            }
            None => rows.push(FinalRow {
                date: r.date,
                article_count: 0,
                flags: EventFlags::NONE,
                macro_values: macro_values(r.date),
                target: r.ret,
            }),
        }
    }

    FeatureTable {
        macro_columns: macro_table.columns.clone(),
        rows,
    }
}

/// Output header: date, count, E1..E7, macro columns, target.
pub fn output_header(table: &FeatureTable, labels: &OutputConfig) -> Vec<String> {
    let mut header = vec![labels.date_label.clone(), labels.count_label.clone()];
    header.extend(EventClassifier::indicator_columns());
    header.extend(table.macro_columns.iter().cloned());
    header.push(labels.target_label.clone());
    header
}

pub fn render_row(row: &FinalRow) -> Vec<String> {
    let mut out = Vec::with_capacity(3 + row.flags.indicators().len() + row.macro_values.len());
    out.push(row.date.format("%Y-%m-%d").to_string());
    out.push(row.article_count.to_string());
    out.extend(row.flags.indicators().iter().map(|b| b.to_string()));
    out.extend(row.macro_values.iter().map(|v| format_value(*v)));
    out.push(format_value(Some(row.target)));
    out
}

/// Writes the table with a BOM; returns the number of data rows.
pub fn write_feature_table(
    path: &Path,
    table: &FeatureTable,
    labels: &OutputConfig,
) -> anyhow::Result<usize> {
    let header = output_header(table, labels);
    write_csv_with_bom(path, &header, table.rows.iter().map(render_row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn news(day: u32, count: u32, bits: &str) -> NewsDailyFeature {
        NewsDailyFeature {
            date: d(day),
            article_count: count,
            flags: EventFlags::parse(bits).unwrap(),
        }
    }

    #[test]
    fn one_to_many_join_repeats_return() {
        let returns = [
            ReturnRow { date: d(2), ret: 10.0 },
            ReturnRow { date: d(3), ret: -1.0 },
        ];
        let features = [news(2, 2, "0100000"), news(2, 2, "0000001")];

        let table = join_features(&returns, &features, &MacroTable::default());
        let on_2: Vec<_> = table.rows_on(d(2)).collect();
        assert_eq!(on_2.len(), 2);
        assert!(on_2.iter().all(|r| r.target == 10.0 && r.article_count == 2));
        assert_eq!(on_2[0].flags.indicators(), [0, 1, 0, 0, 0, 0, 0]);
        assert_eq!(on_2[1].flags.indicators(), [0, 0, 0, 0, 0, 0, 1]);

        let on_3: Vec<_> = table.rows_on(d(3)).collect();
        assert_eq!(on_3.len(), 1);
        assert_eq!(on_3[0].article_count, 0);
        assert_eq!(on_3[0].flags, EventFlags::NONE);
    }

    #[test]
    fn news_without_price_row_is_dropped() {
        let returns = [ReturnRow { date: d(2), ret: 1.0 }];
        let table = join_features(&returns, &[news(5, 1, "1000000")], &MacroTable::default());
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].article_count, 0);
    }

    #[test]
    fn macro_gaps_stay_missing() {
        let mut macro_table = MacroTable::new(vec!["usd_krw".into(), "vix".into()]);
        macro_table.insert(d(2), vec![Some(1450.0), None]);

        let returns = [
            ReturnRow { date: d(2), ret: 1.0 },
            ReturnRow { date: d(3), ret: 2.0 },
        ];
        let table = join_features(&returns, &[], &macro_table);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].macro_values, vec![Some(1450.0), None]);
        assert_eq!(table.rows[1].macro_values, vec![None, None]);
    }

    #[test]
    fn renders_columns_in_order() {
        let mut macro_table = MacroTable::new(vec!["vix".into()]);
        macro_table.insert(d(2), vec![Some(15.5)]);
        let table = join_features(
            &[ReturnRow { date: d(2), ret: 10.0 }],
            &[news(2, 1, "0010000")],
            &macro_table,
        );

        let header = output_header(&table, &OutputConfig::default());
        assert_eq!(header, vec![
            "Date", "x1", "E1", "E2", "E3", "E4", "E5", "E6", "E7", "vix", "y(stock)",
        ]);
        assert_eq!(render_row(&table.rows[0]), vec![
            "2025-01-02", "1", "0", "0", "1", "0", "0", "0", "0", "15.5", "10.0",
        ]);
    }
}
