//! 入力シート読み込み
//!
//! First sheet only, first row is the header. Cells keep their type; text
//! and number normalization happens per field later.

use crate::error::{EntryError, Result};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use pavement_entry_common::{CellValue, Row};
use std::path::Path;
use tracing::{debug, warn};

pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    if !path.exists() {
        return Err(EntryError::FileNotFound(path.display().to_string()));
    }

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| EntryError::Spreadsheet(format!("cannot open {}: {}", path.display(), e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| EntryError::Spreadsheet("workbook has no sheets".into()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| EntryError::Spreadsheet(format!("cannot read sheet '{}': {}", sheet_name, e)))?;

    let mut rows_iter = range.rows();
    let header_row = rows_iter
        .next()
        .ok_or_else(|| EntryError::Spreadsheet(format!("sheet '{}' is empty", sheet_name)))?;

    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();
    debug!("Columns in '{}': {:?}", sheet_name, headers);

    let mut rows = Vec::new();
    for (index, cells) in rows_iter.enumerate() {
        let sheet_row = index + 2;
        let mut row = Row::new().at_sheet_row(sheet_row);
        for (header, cell) in headers.iter().zip(cells) {
            if header.is_empty() {
                continue;
            }
            row.insert(header, to_cell_value(cell, sheet_row));
        }
        if row.is_blank() {
            continue;
        }
        rows.push(row);
    }

    Ok(rows)
}

/// `sheet_row` is 1-based, for diagnostics
fn to_cell_value(cell: &Data, sheet_row: usize) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_date() {
            Some(date) => CellValue::Text(date.format("%m/%d/%Y").to_string()),
            None => CellValue::Text(cell.to_string()),
        },
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => {
            warn!("Cell error {:?} in sheet row {}, treated as empty", e, sheet_row);
            CellValue::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_types() {
        assert_eq!(to_cell_value(&Data::Int(4), 2), CellValue::Number(4.0));
        assert_eq!(to_cell_value(&Data::String(" AC ".into()), 2), CellValue::Text(" AC ".into()));
        assert_eq!(to_cell_value(&Data::Empty, 2), CellValue::Empty);
    }

    #[test]
    fn test_missing_file() {
        let err = read_rows(Path::new("/nonexistent/sections.xlsx")).unwrap_err();
        assert!(matches!(err, EntryError::FileNotFound(_)));
    }
}
