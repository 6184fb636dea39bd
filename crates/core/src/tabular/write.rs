use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes a header and rows as CSV, creating parent directories.
pub fn write_csv<R>(path: &Path, header: &[String], rows: R) -> anyhow::Result<usize>
where
    R: IntoIterator<Item = Vec<String>>,
{
    write_inner(path, header, rows, false)
}

/// Same as `write_csv`, prefixed with a UTF-8 byte-order mark so spreadsheet
/// tools pick the right encoding for Korean headers.
pub fn write_csv_with_bom<R>(path: &Path, header: &[String], rows: R) -> anyhow::Result<usize>
where
    R: IntoIterator<Item = Vec<String>>,
{
    write_inner(path, header, rows, true)
}

fn write_inner<R>(path: &Path, header: &[String], rows: R, bom: bool) -> anyhow::Result<usize>
where
    R: IntoIterator<Item = Vec<String>>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    if bom {
        out.write_all("\u{feff}".as_bytes())
            .context("failed to write BOM")?;
    }

    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(header)
        .with_context(|| format!("failed to write header to {}", path.display()))?;

    let mut written = 0usize;
    for row in rows {
        wtr.write_record(&row)
            .with_context(|| format!("failed to write row to {}", path.display()))?;
        written += 1;
    }
    wtr.flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(written)
}

/// Renders a float the way the downstream notebooks expect (`10.0`, not `10`);
/// missing values are blank.
pub fn format_value(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:?}"),
        _ => String::new(),
    }
}
