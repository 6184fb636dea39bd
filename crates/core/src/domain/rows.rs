use crate::domain::event::EventFlags;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Day-over-day close return in percent, for every trading day after the first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnRow {
    pub date: NaiveDate,
    pub ret: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewsArticle {
    pub date: NaiveDate,
    /// `None` when the body cell is empty or not text.
    pub body: Option<String>,
    /// The body cell as read, whatever its type. Deduplication key.
    pub raw_body: String,
}

/// One row per surviving article; `article_count` is shared by every article on the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewsDailyFeature {
    pub date: NaiveDate,
    pub article_count: u32,
    pub flags: EventFlags,
}

/// Macro indicators keyed by day. At most one row per date.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    pub columns: Vec<String>,
    rows: BTreeMap<NaiveDate, Vec<Option<f64>>>,
}

impl MacroTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    /// Inserts a row unless the date is already present; returns whether it was inserted.
    pub fn insert(&mut self, date: NaiveDate, values: Vec<Option<f64>>) -> bool {
        debug_assert_eq!(values.len(), self.columns.len());
        if self.rows.contains_key(&date) {
            return false;
        }
        self.rows.insert(date, values);
        true
    }

    pub fn get(&self, date: NaiveDate) -> Option<&[Option<f64>]> {
        self.rows.get(&date).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.keys().next()?;
        let last = self.rows.keys().next_back()?;
        Some((*first, *last))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinalRow {
    pub date: NaiveDate,
    pub article_count: u32,
    pub flags: EventFlags,
    /// Aligned with `FeatureTable::macro_columns`; `None` where macro history has no row.
    pub macro_values: Vec<Option<f64>>,
    pub target: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    pub macro_columns: Vec<String>,
    pub rows: Vec<FinalRow>,
}

impl FeatureTable {
    pub fn rows_on(&self, date: NaiveDate) -> impl Iterator<Item = &FinalRow> {
        self.rows.iter().filter(move |r| r.date == date)
    }
}
