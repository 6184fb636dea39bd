pub mod domain;
pub mod error;
pub mod features;
pub mod ingest;
pub mod tabular;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::path::{Path, PathBuf};

    pub use crate::pipeline_config::*;

    const DEFAULT_DATA_DIR: &str = "./data";
    const DEFAULT_MACRO_FILE: &str = "clean/daily_macro_with_nan.csv";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub data_dir: PathBuf,
        pub news_dir: PathBuf,
        pub stock_dir: PathBuf,
        pub macro_file: PathBuf,
        pub output_dir: PathBuf,
        pub pipeline_config_path: Option<PathBuf>,
        pub fred_api_key: Option<String>,
        pub fred_base_url: Option<String>,
        pub fred_timeout_secs: Option<u64>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let data_dir = env_path("FINFEAT_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into());

            let fred_timeout_secs = match std::env::var("FRED_TIMEOUT_SECS") {
                Ok(s) => Some(
                    s.trim()
                        .parse::<u64>()
                        .with_context(|| format!("FRED_TIMEOUT_SECS is not a number: {s}"))?,
                ),
                Err(_) => None,
            };

            Ok(Self {
                news_dir: env_path("FINFEAT_NEWS_DIR").unwrap_or_else(|| data_dir.join("news")),
                stock_dir: env_path("FINFEAT_STOCK_DIR").unwrap_or_else(|| data_dir.join("stock")),
                macro_file: env_path("FINFEAT_MACRO_FILE")
                    .unwrap_or_else(|| data_dir.join(DEFAULT_MACRO_FILE)),
                output_dir: env_path("FINFEAT_OUTPUT_DIR")
                    .unwrap_or_else(|| data_dir.join("final")),
                pipeline_config_path: env_path("FINFEAT_PIPELINE_CONFIG"),
                fred_api_key: std::env::var("FRED_API_KEY").ok(),
                fred_base_url: std::env::var("FRED_BASE_URL").ok(),
                fred_timeout_secs,
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                data_dir,
            })
        }

        /// Settings rooted at `data_dir` with the default sub-layout and no secrets.
        pub fn rooted_at(data_dir: impl AsRef<Path>) -> Self {
            let data_dir = data_dir.as_ref().to_path_buf();
            Self {
                news_dir: data_dir.join("news"),
                stock_dir: data_dir.join("stock"),
                macro_file: data_dir.join(DEFAULT_MACRO_FILE),
                output_dir: data_dir.join("final"),
                pipeline_config_path: None,
                fred_api_key: None,
                fred_base_url: None,
                fred_timeout_secs: None,
                sentry_dsn: None,
                data_dir,
            }
        }

        pub fn require_fred_api_key(&self) -> anyhow::Result<&str> {
            self.fred_api_key
                .as_deref()
                .context("FRED_API_KEY is required")
        }

        /// Loads the pipeline config from `FINFEAT_PIPELINE_CONFIG`, or the built-in default.
        pub fn load_pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
            match &self.pipeline_config_path {
                Some(path) => PipelineConfig::from_json_file(path),
                None => Ok(PipelineConfig::default()),
            }
        }
    }

    fn env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    }
}

mod pipeline_config;
