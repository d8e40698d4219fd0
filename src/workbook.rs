//! xlsx表の読み書き
//!
//! Single-sheet, string-only tables shared by the audit log and the
//! unmatched report. xlsx cannot be appended in place, so appending means
//! re-reading the existing rows and writing the whole sheet again.

use calamine::{open_workbook_auto, Reader};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

/// Data rows below the header of the first sheet, or none when the file does
/// not exist yet
pub fn read_table(path: &Path) -> Result<Vec<Vec<String>>, String> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Ok(Vec::new());
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("cannot read sheet '{}': {}", sheet_name, e))?;

    Ok(range
        .rows()
        .skip(1)
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

/// Writes `header` and `rows` as the only sheet of `path`
pub fn write_table(
    path: &Path,
    sheet_name: &str,
    header: &[&str],
    rows: &[Vec<String>],
) -> Result<(), String> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet_name)
        .map_err(|e| format!("sheet name error: {}", e))?;

    for (col, title) in header.iter().enumerate() {
        let col = col as u16;
        worksheet
            .write_string_with_format(0, col, *title, &header_format)
            .map_err(|e| format!("header write error: {}", e))?;
        worksheet
            .set_column_width(col, column_width(title))
            .map_err(|e| format!("column width error: {}", e))?;
    }

    for (index, row) in rows.iter().enumerate() {
        let row_num = index as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_num, col as u16, value)
                .map_err(|e| format!("cell write error: {}", e))?;
        }
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
        }
    }

    workbook
        .save(path)
        .map_err(|e| format!("cannot save {}: {}", path.display(), e))
}

fn column_width(title: &str) -> f64 {
    (title.chars().count().max(10) + 4) as f64
}
