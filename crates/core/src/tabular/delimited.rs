use super::{Cell, RawTable};
use anyhow::Context;
use encoding_rs::EUC_KR;
use std::borrow::Cow;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn read_csv_file(path: &Path) -> anyhow::Result<RawTable> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    read_csv_bytes(&bytes).with_context(|| format!("failed to parse CSV {}", path.display()))
}

/// Parses CSV bytes with a header row. UTF-8 (with or without BOM) is
/// preferred; anything else is decoded as EUC-KR.
pub fn read_csv_bytes(bytes: &[u8]) -> anyhow::Result<RawTable> {
    let text = decode_text(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .context("missing CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = RawTable::new(columns);
    for record in reader.records() {
        let record = record.context("malformed CSV record")?;
        table.push_row(record.iter().map(Cell::from_text).collect());
    }

    Ok(table)
}

fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            let (cow, _, had_errors) = EUC_KR.decode(bytes);
            if had_errors {
                tracing::debug!(
                    "CSV is neither UTF-8 nor clean EUC-KR; replacement chars inserted"
                );
            }
            cow
        }
    }
}
