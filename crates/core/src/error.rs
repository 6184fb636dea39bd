use std::path::PathBuf;

/// Source-data failures the batch driver knows how to classify.
///
/// Everything else travels as a plain `anyhow::Error`.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source file not found: {}", path.display())]
    MissingSourceFile { path: PathBuf },

    #[error("column {column:?} not found in {}", path.display())]
    MissingExpectedColumn { path: PathBuf, column: String },

    #[error("unparseable date {value:?} in {} (row {row})", path.display())]
    UnparseableDate {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("failed to load {}: {detail}", path.display())]
    LoadFailure { path: PathBuf, detail: String },
}

impl SourceError {
    pub fn missing_column(path: impl Into<PathBuf>, column: impl Into<String>) -> Self {
        Self::MissingExpectedColumn {
            path: path.into(),
            column: column.into(),
        }
    }
}
