use anyhow::Context;
use clap::{Parser, Subcommand};
use finfeat_core::config::{PipelineConfig, Settings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "finfeat_worker")]
struct Args {
    /// Pipeline config JSON. Overrides FINFEAT_PIPELINE_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build one labeled feature table per instrument (default).
    Build,

    /// Download the configured FRED series into per-group CSV files.
    FetchMacro {
        /// First observation date (YYYY-MM-DD). Defaults to the config.
        #[arg(long)]
        start: Option<String>,

        /// Last observation date (YYYY-MM-DD). Defaults to the config.
        #[arg(long)]
        end: Option<String>,
    },

    /// Outer-join every per-instrument price file into one close table.
    MergePrices {
        /// Output file name inside the stock directory.
        #[arg(long, default_value = "stock.csv")]
        output: String,
    },

    /// Outer-join the fetched macro series into the macro table used by `build`.
    MergeMacro,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if let Some(path) = args.config {
        settings.pipeline_config_path = Some(path);
    }

    let result = run(args.command.unwrap_or(Command::Build), &settings).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "run failed");
    }
    result
}

async fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
    let cfg = settings.load_pipeline_config()?;

    match command {
        Command::Build => {
            tracing::info!(
                instruments = cfg.instruments.len(),
                macro_file = %settings.macro_file.display(),
                output_dir = %settings.output_dir.display(),
                "feature build starting"
            );
            let summary = finfeat_core::features::build_all(settings, &cfg)?;
            for skipped in &summary.skipped {
                tracing::warn!(
                    instrument = %skipped.name,
                    reason = %skipped.reason,
                    "instrument skipped"
                );
            }
        }
        Command::FetchMacro { start, end } => {
            let fetch = fetch_window(&cfg, start.as_deref(), end.as_deref())?;
            let client = finfeat_core::ingest::FredClient::from_settings(settings)?;
            let summary =
                finfeat_core::ingest::fetch_and_save_groups(&client, &settings.data_dir, &fetch)
                    .await?;
            tracing::info!(
                saved = summary.saved.len(),
                failed = summary.failed.len(),
                start = %fetch.start,
                end = %fetch.end,
                "macro fetch finished"
            );
        }
        Command::MergePrices { output } => {
            let output = settings.stock_dir.join(output);
            let report = finfeat_core::ingest::merge_price_files(
                &settings.stock_dir,
                &output,
                &cfg.price,
            )?;
            tracing::info!(path = %report.output.display(), rows = report.rows, "prices merged");
        }
        Command::MergeMacro => {
            let report = finfeat_core::ingest::merge_macro_series(
                &settings.data_dir,
                &cfg.fetch.groups,
                &settings.macro_file,
            )?;
            tracing::info!(
                path = %report.output.display(),
                rows = report.rows,
                "macro series merged"
            );
        }
    }

    Ok(())
}

fn fetch_window(
    cfg: &PipelineConfig,
    start: Option<&str>,
    end: Option<&str>,
) -> anyhow::Result<finfeat_core::config::FetchConfig> {
    let mut fetch = cfg.fetch.clone();
    if let Some(s) = start {
        fetch.start = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --start {s}"))?;
    }
    if let Some(s) = end {
        fetch.end = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --end {s}"))?;
    }
    anyhow::ensure!(
        fetch.start <= fetch.end,
        "fetch window is empty: {} > {}",
        fetch.start,
        fetch.end
    );
    Ok(fetch)
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
