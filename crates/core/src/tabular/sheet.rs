use super::{Cell, RawTable};
use anyhow::Context;
use calamine::{open_workbook_auto, Data, DataType, Reader};
use std::path::Path;

/// Reads the first worksheet, taking its first row as the header.
pub fn read_first_sheet(path: &Path) -> anyhow::Result<RawTable> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .with_context(|| format!("workbook has no sheets: {}", path.display()))?
        .with_context(|| format!("failed to read first sheet of {}", path.display()))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(RawTable::default());
    };

    let columns = header
        .iter()
        .enumerate()
        .map(|(i, c)| match to_cell(c) {
            Cell::Empty => format!("Unnamed: {i}"),
            other => other.display(),
        })
        .collect();

    let mut table = RawTable::new(columns);
    for row in rows {
        table.push_row(row.iter().map(to_cell).collect());
    }
    Ok(table)
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::String(s) => Cell::from_text(s),
        Data::Float(v) => Cell::Number(*v),
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) => {
            data.as_datetime().map(Cell::DateTime).unwrap_or(Cell::Empty)
        }
        _ => Cell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_xlsxwriter::{Format, Workbook};

    #[test]
    fn converts_scalar_cells() {
        assert_eq!(to_cell(&Data::String("본문".into())), Cell::Text("본문".into()));
        assert_eq!(to_cell(&Data::String(String::new())), Cell::Empty);
        assert_eq!(to_cell(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(to_cell(&Data::Empty), Cell::Empty);
    }

    #[test]
    fn iso_datetime_cells_become_dates() {
        let cell = to_cell(&Data::DateTimeIso("2025-01-02T09:30:00".into()));
        assert_eq!(
            cell.as_date(),
            chrono::NaiveDate::from_ymd_opt(2025, 1, 2)
        );
    }

    #[test]
    fn reads_header_row_and_typed_cells_from_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("기아_뉴스.xlsx");

        let mut workbook = Workbook::new();
        let date = Format::new().set_num_format("yyyy-mm-dd");
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, " 일자").unwrap();
        sheet.write_string(0, 1, "본문").unwrap();
        sheet.write_number_with_format(1, 0, 45659.5, &date).unwrap();
        sheet.write_string(1, 1, "공급계약 체결").unwrap();
        sheet.write_number(2, 0, 20250103.0).unwrap();
        sheet.write_string(2, 1, "소송").unwrap();
        workbook.save(&path).unwrap();

        let table = read_first_sheet(&path).unwrap();
        assert_eq!(table.columns, vec![" 일자", "본문"]);
        assert_eq!(table.len(), 2);

        assert!(matches!(table.rows[0][0], Cell::DateTime(_)));
        assert_eq!(table.rows[0][0].as_date(), NaiveDate::from_ymd_opt(2025, 1, 2));
        assert_eq!(table.rows[0][1], Cell::Text("공급계약 체결".into()));

        assert_eq!(table.rows[1][0], Cell::Number(20250103.0));
        assert_eq!(table.rows[1][0].as_date(), NaiveDate::from_ymd_opt(2025, 1, 3));
    }

    #[test]
    fn missing_workbook_is_an_error() {
        assert!(read_first_sheet(Path::new("/nonexistent/뉴스.xlsx")).is_err());
    }
}
