//! Raw-table producers that run ahead of the feature build.

pub mod fred;
pub mod merge;
pub mod types;

pub use fred::{fetch_and_save_groups, FredClient, MacroSeriesClient};
pub use merge::{merge_macro_series, merge_price_files, MergeReport};
pub use types::SeriesPoint;
