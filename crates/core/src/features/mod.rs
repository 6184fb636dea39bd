//! Labeled feature tables: price returns joined with news events and macro indicators.

pub mod join;
pub mod macro_table;
pub mod news;
pub mod returns;

use crate::config::{InstrumentConfig, PipelineConfig, Settings};
use crate::domain::{EventClassifier, MacroTable};
use crate::error::SourceError;
use anyhow::Context;
use std::path::PathBuf;

pub use join::{join_features, write_feature_table};
pub use macro_table::load_macro_table;
pub use news::{aggregate_news, NewsAggregate, NewsStats};
pub use returns::load_returns;

#[derive(Debug, Clone)]
pub struct InstrumentReport {
    pub name: String,
    pub output: PathBuf,
    pub rows: usize,
    pub news: NewsStats,
}

#[derive(Debug, Clone)]
pub struct SkippedInstrument {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    pub written: Vec<InstrumentReport>,
    pub skipped: Vec<SkippedInstrument>,
}

/// Builds one output table per configured instrument.
///
/// Fails only when the shared macro table cannot be loaded or the config is
/// invalid; an instrument whose own data is unusable is skipped.
pub fn build_all(settings: &Settings, cfg: &PipelineConfig) -> anyhow::Result<BuildSummary> {
    cfg.validate()?;
    let classifier = EventClassifier::from_config(&cfg.event_categories)?;

    let macro_table = load_macro_table(&settings.macro_file, &cfg.macro_table)
        .context("macro table is required by every instrument")?;

    let mut summary = BuildSummary::default();
    for inst in &cfg.instruments {
        let span = tracing::info_span!("instrument", name = %inst.name);
        let _enter = span.enter();

        match build_instrument(settings, cfg, inst, &classifier, &macro_table) {
            Ok(report) => summary.written.push(report),
            Err(err) => {
                tracing::warn!(
                    kind = skip_kind(&err),
                    error = %format!("{err:#}"),
                    "skipping instrument"
                );
                summary.skipped.push(SkippedInstrument {
                    name: inst.name.clone(),
                    reason: format!("{err:#}"),
                });
            }
        }
    }

    tracing::info!(
        written = summary.written.len(),
        skipped = summary.skipped.len(),
        "feature build finished"
    );
    Ok(summary)
}

pub fn build_instrument(
    settings: &Settings,
    cfg: &PipelineConfig,
    inst: &InstrumentConfig,
    classifier: &EventClassifier,
    macro_table: &MacroTable,
) -> anyhow::Result<InstrumentReport> {
    let price_path = settings.stock_dir.join(&inst.price_file);
    let returns = load_returns(&price_path, &cfg.price)?;
    tracing::debug!(returns = returns.len(), "returns computed");

    let news = aggregate_news(&settings.news_dir, &inst.news_aliases, &cfg.news, classifier);
    let table = join_features(&returns, &news.features, macro_table);

    let output = settings
        .output_dir
        .join(format!("{}{}", inst.name, cfg.output.file_suffix));
    let rows = write_feature_table(&output, &table, &cfg.output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    tracing::info!(path = %output.display(), rows, "feature table written");
    Ok(InstrumentReport {
        name: inst.name.clone(),
        output,
        rows,
        news: news.stats,
    })
}

fn skip_kind(err: &anyhow::Error) -> &'static str {
    match err.downcast_ref::<SourceError>() {
        Some(SourceError::MissingSourceFile { .. }) => "missing_source_file",
        Some(SourceError::MissingExpectedColumn { .. }) => "missing_expected_column",
        Some(SourceError::UnparseableDate { .. }) => "unparseable_date",
        Some(SourceError::LoadFailure { .. }) => "load_failure",
        None => "other",
    }
}
