use crate::config::NewsSourceConfig;
use crate::domain::{EventClassifier, NewsArticle, NewsDailyFeature};
use crate::error::SourceError;
use crate::tabular::{load_table, resolve_column, RawTable};
use anyhow::Context;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Counters reported once per instrument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsStats {
    pub files_found: usize,
    pub files_loaded: usize,
    pub rows_read: usize,
    pub invalid_dates: usize,
    pub duplicates_removed: usize,
    pub articles: usize,
}

#[derive(Debug, Clone, Default)]
pub struct NewsAggregate {
    pub features: Vec<NewsDailyFeature>,
    pub stats: NewsStats,
}

/// Finds, loads and classifies every news archive for one instrument.
///
/// Never fails: unreadable archives are skipped and a missing date or body
/// column yields no features.
pub fn aggregate_news(
    news_dir: &Path,
    aliases: &[String],
    cfg: &NewsSourceConfig,
    classifier: &EventClassifier,
) -> NewsAggregate {
    let mut stats = NewsStats::default();

    let files = match discover_news_files(news_dir, aliases, cfg) {
        Ok(files) => files,
        Err(err) => {
            tracing::warn!(dir = %news_dir.display(), error = %err, "news directory not readable");
            Vec::new()
        }
    };
    stats.files_found = files.len();
    if files.is_empty() {
        tracing::info!(?aliases, "no news archives matched");
        return NewsAggregate {
            features: Vec::new(),
            stats,
        };
    }

    let (table, loaded) = load_news_archives(&files);
    stats.files_loaded = loaded;
    stats.rows_read = table.len();

    let Some(extracted) = extract_articles(&table, cfg) else {
        tracing::warn!(
            columns = ?table.columns,
            "news archives lack a recognized date or body column; using zero-news features"
        );
        return NewsAggregate {
            features: Vec::new(),
            stats,
        };
    };
    stats.invalid_dates = extracted.invalid_dates;

    let before = extracted.articles.len();
    let articles = dedup_articles(extracted.articles);
    stats.duplicates_removed = before - articles.len();
    stats.articles = articles.len();

    tracing::info!(
        original = before,
        removed = stats.duplicates_removed,
        remaining = stats.articles,
        "news deduplicated"
    );

    NewsAggregate {
        features: daily_features(&articles, classifier),
        stats,
    }
}

/// Archives in `dir` whose file name contains any alias, with the configured
/// extension, skipping editor lock files. Sorted and without repeats.
pub fn discover_news_files(
    dir: &Path,
    aliases: &[String],
    cfg: &NewsSourceConfig,
) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let wanted_ext = cfg.extension.trim_start_matches('.').to_ascii_lowercase();
    let mut found = BTreeSet::new();

    for entry in
        std::fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !cfg.temp_prefix.is_empty() && name.starts_with(cfg.temp_prefix.as_str()) {
            continue;
        }

        let ext_matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&wanted_ext));
        if !ext_matches {
            continue;
        }

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
        if aliases.iter().any(|a| !a.is_empty() && stem.contains(a.as_str())) {
            found.insert(path);
        }
    }

    Ok(found.into_iter().collect())
}

/// Loads and stacks archives; returns the table and how many files loaded.
pub fn load_news_archives(files: &[PathBuf]) -> (RawTable, usize) {
    let mut tables = Vec::with_capacity(files.len());
    for path in files {
        match load_table(path) {
            Ok(mut t) => {
                t.rename_columns(|c| c.trim().to_string());
                tables.push(t);
            }
            Err(err) => {
                let err = SourceError::LoadFailure {
                    path: path.clone(),
                    detail: format!("{err:#}"),
                };
                tracing::warn!(error = %err, "skipping news archive");
            }
        }
    }

    let loaded = tables.len();
    (RawTable::concat(tables), loaded)
}

#[derive(Debug, Clone, Default)]
pub struct ExtractedArticles {
    pub articles: Vec<NewsArticle>,
    pub invalid_dates: usize,
}

/// Picks the date and body columns and keeps rows whose date parses.
/// `None` when either column is absent.
pub fn extract_articles(table: &RawTable, cfg: &NewsSourceConfig) -> Option<ExtractedArticles> {
    let date_idx = resolve_column(&table.columns, &cfg.date_aliases)?;
    let body_idx = table.column_index(&cfg.body_column)?;

    let mut out = ExtractedArticles::default();
    for row in &table.rows {
        match row[date_idx].as_date() {
            Some(date) => out.articles.push(NewsArticle {
                date,
                body: row[body_idx].as_text().map(str::to_string),
                raw_body: row[body_idx].display(),
            }),
            None => out.invalid_dates += 1,
        }
    }
    Some(out)
}

/// Collapses articles identical on `(date, body cell)`, keeping the first seen.
/// Non-text bodies compare by their printed value.
pub fn dedup_articles(articles: Vec<NewsArticle>) -> Vec<NewsArticle> {
    let mut seen = HashSet::with_capacity(articles.len());
    articles
        .into_iter()
        .filter(|a| seen.insert((a.date, a.raw_body.clone())))
        .collect()
}

/// One feature row per article, in article order, each carrying its date's article count.
pub fn daily_features(
    articles: &[NewsArticle],
    classifier: &EventClassifier,
) -> Vec<NewsDailyFeature> {
    let mut counts: HashMap<NaiveDate, u32> = HashMap::new();
    for a in articles {
        *counts.entry(a.date).or_default() += 1;
    }

    articles
        .iter()
        .map(|a| NewsDailyFeature {
            date: a.date,
            article_count: counts.get(&a.date).copied().unwrap_or(0),
            flags: classifier.classify(a.body.as_deref()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::tabular::delimited::read_csv_bytes;
    use crate::tabular::Cell;
    use proptest::prelude::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn article(day: u32, body: Option<&str>) -> NewsArticle {
        NewsArticle {
            date: d(day),
            body: body.map(str::to_string),
            raw_body: body.unwrap_or_default().to_string(),
        }
    }

    fn classifier() -> EventClassifier {
        EventClassifier::from_config(&PipelineConfig::default().event_categories).unwrap()
    }

    #[test]
    fn dedup_keeps_first_of_identical_date_and_body() {
        let out = dedup_articles(vec![
            article(2, Some("a")),
            article(2, Some("a")),
            article(3, Some("a")),
            article(2, None),
            article(2, None),
        ]);
        assert_eq!(out, vec![
            article(2, Some("a")),
            article(3, Some("a")),
            article(2, None),
        ]);
    }

    #[test]
    fn counts_are_broadcast_per_date() {
        let features = daily_features(
            &[
                article(2, Some("공급계약")),
                article(2, Some("소송")),
                article(3, None),
            ],
            &classifier(),
        );
        assert_eq!(features.len(), 3);
        assert_eq!(features[0].article_count, 2);
        assert_eq!(features[1].article_count, 2);
        assert_eq!(features[2].article_count, 1);
        assert_eq!(features[0].flags.to_string(), "0100000");
        assert_eq!(features[1].flags.to_string(), "0000001");
        assert_eq!(features[2].flags.to_string(), "0000000");
    }

    #[test]
    fn extract_prefers_higher_priority_date_alias_and_drops_bad_dates() {
        let mut table = read_csv_bytes(
            " 작성일,일자,본문\n2024-12-31,2025-01-02,a\n2024-12-31,언제,b\n".as_bytes(),
        )
        .unwrap();
        table.rename_columns(|c| c.trim().to_string());

        let out = extract_articles(&table, &NewsSourceConfig::default()).unwrap();
        assert_eq!(out.articles, vec![article(2, Some("a"))]);
        assert_eq!(out.invalid_dates, 1);
    }

    #[test]
    fn numeric_bodies_on_one_date_stay_distinct() {
        let mut table = RawTable::new(vec!["일자".into(), "본문".into()]);
        for body in [Cell::Number(1.0), Cell::Number(2.0), Cell::Number(2.0), Cell::Empty] {
            table.push_row(vec![Cell::Text("2025-01-02".into()), body]);
        }

        let out = extract_articles(&table, &NewsSourceConfig::default()).unwrap();
        assert!(out.articles.iter().all(|a| a.body.is_none()));

        let kept = dedup_articles(out.articles);
        let keys: Vec<_> = kept.iter().map(|a| a.raw_body.as_str()).collect();
        assert_eq!(keys, vec!["1.0", "2.0", ""]);

        let features = daily_features(&kept, &classifier());
        assert!(features.iter().all(|f| f.article_count == 3 && !f.flags.any()));
    }

    #[test]
    fn extract_without_body_column_is_none() {
        let table = read_csv_bytes("일자,제목\n2025-01-02,a\n".as_bytes()).unwrap();
        assert!(extract_articles(&table, &NewsSourceConfig::default()).is_none());
    }

    #[test]
    fn discovery_matches_alias_extension_and_skips_lock_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "기아_뉴스_2025.xlsx",
            "~$기아_뉴스_2025.xlsx",
            "기아_뉴스.csv",
            "현대차_뉴스.xlsx",
            "기아 기아.xlsx",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let files = discover_news_files(
            dir.path(),
            &["기아".to_string(), "기아 ".to_string()],
            &NewsSourceConfig::default(),
        )
        .unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["기아 기아.xlsx", "기아_뉴스_2025.xlsx"]);
    }

    #[test]
    fn unreadable_archives_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.csv");
        std::fs::write(&good, "일자,본문\n2025-01-02,a\n").unwrap();
        let missing = dir.path().join("missing.xlsx");

        let (table, loaded) = load_news_archives(&[missing, good]);
        assert_eq!(loaded, 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn missing_news_dir_yields_empty_aggregate() {
        let agg = aggregate_news(
            Path::new("/nonexistent/news"),
            &["기아".to_string()],
            &NewsSourceConfig::default(),
            &classifier(),
        );
        assert!(agg.features.is_empty());
        assert_eq!(agg.stats, NewsStats::default());
    }

    proptest! {
        #[test]
        fn dedup_is_idempotent(
            raw in prop::collection::vec((1u32..5, prop::option::of("[ab]{0,2}")), 0..40)
        ) {
            let articles: Vec<_> = raw
                .iter()
                .map(|(day, body)| article(*day, body.as_deref()))
                .collect();
            let once = dedup_articles(articles);
            let twice = dedup_articles(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn article_count_matches_rows_per_date(days in prop::collection::vec(1u32..6, 0..40)) {
            let articles: Vec<_> = days
                .iter()
                .enumerate()
                .map(|(i, day)| article(*day, Some(&format!("기사 {i}"))))
                .collect();
            let features = daily_features(&articles, &classifier());
            for f in &features {
                let expected = articles.iter().filter(|a| a.date == f.date).count() as u32;
                prop_assert_eq!(f.article_count, expected);
            }
        }
    }
}
