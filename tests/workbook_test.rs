//! xlsx入出力テスト

use chrono::FixedOffset;
use pavement_entry::audit::{AuditAction, AuditEntry, AuditSink, XlsxAuditLog};
use pavement_entry::report::{UnmatchedReason, UnmatchedRow, UnmatchedSink, XlsxUnmatchedReport};
use pavement_entry::{spreadsheet, workbook};
use pavement_entry_common::{CellValue, RowIdentity, SectionField, SectionRecord};
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

fn identity(section: &str) -> RowIdentity {
    RowIdentity {
        street_lot_id: "ELM".into(),
        section_id: section.into(),
        street_name: "ELM AVE".into(),
        area: "100.00".into(),
    }
}

/// 先頭シートのみ、見出し行の次から読み込む
#[test]
fn test_read_rows_from_first_sheet() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("sections.xlsx");

    let mut book = Workbook::new();
    let sheet = book.add_worksheet();
    sheet.write_string(0, 0, " Street/Lot ID ").unwrap();
    sheet.write_string(0, 1, "Section ID").unwrap();
    sheet.write_string(0, 2, "Area").unwrap();
    sheet.write_string(0, 3, "Street Name/Lot Location").unwrap();
    sheet.write_string(1, 0, "ELM").unwrap();
    sheet.write_string(1, 1, "010").unwrap();
    sheet.write_number(1, 2, 1520.5).unwrap();
    sheet.write_string(1, 3, "ELM AVE - LOT 2 - NORTH").unwrap();
    // row 3 left blank
    sheet.write_string(3, 0, "OAK").unwrap();
    sheet.write_string(3, 2, "n/a").unwrap();
    let other = book.add_worksheet();
    other.write_string(0, 0, "ignored").unwrap();
    book.save(&path).unwrap();

    let rows = spreadsheet::read_rows(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("Area"), Some(&CellValue::Number(1520.5)));
    assert_eq!(rows[0].get("Street/Lot ID"), Some(&CellValue::from("ELM")));
    assert_eq!(rows[0].sheet_row(), Some(2));
    assert_eq!(rows[1].sheet_row(), Some(4));

    let first = SectionRecord::from_row(&rows[0]);
    assert_eq!(first.get(SectionField::StreetNameLotLocation), "ELM AVE - LOT 2");
    assert_eq!(first.get(SectionField::Area), "1520.50");

    let second = SectionRecord::from_row(&rows[1]);
    assert_eq!(second.get(SectionField::StreetLotId), "OAK");
    assert_eq!(second.get(SectionField::SectionId), "");
    assert_eq!(second.get(SectionField::Area), "0.00");
}

#[test]
fn test_read_header_only_sheet() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("empty.xlsx");
    workbook::write_table(&path, "Sheet1", &["Street/Lot ID", "Area"], &[]).unwrap();

    let rows = spreadsheet::read_rows(&path).unwrap();
    assert!(rows.is_empty());
}

/// 監査ログは既存の行を残して追記される
#[test]
fn test_audit_log_appends_across_runs() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("logs").join("audit_log.xlsx");
    let offset = FixedOffset::east_opt(0).unwrap();

    let mut log = XlsxAuditLog::open(&path).unwrap();
    assert!(log.is_empty());
    log.append(AuditEntry::now(
        offset,
        AuditAction::WorkspaceSelected("City DB".into()),
        RowIdentity::default(),
    ))
    .unwrap();
    log.append(AuditEntry::now(offset, AuditAction::RowSubmitted, identity("010")))
        .unwrap();

    let mut reopened = XlsxAuditLog::open(&path).unwrap();
    assert_eq!(reopened.len(), 2);
    reopened
        .append(AuditEntry::now(
            offset,
            AuditAction::RowFailed("timed out".into()),
            identity("020"),
        ))
        .unwrap();

    let rows = workbook::read_table(&path).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][1], "Database selected: City DB");
    assert_eq!(rows[1][1], "Section added");
    assert_eq!(rows[1][3], "010");
    assert_eq!(rows[2][1], "Failed: timed out");
    assert_eq!(rows[2][0].len(), "2024-01-01 00:00:00".len());
}

/// 未照合レポートは実行開始時に見出しだけになる
#[test]
fn test_unmatched_report_reset() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("unmatched_rows.xlsx");

    let mut report = XlsxUnmatchedReport::new(&path);
    report
        .record(UnmatchedRow {
            identity: identity("010"),
            field: SectionField::SurfaceType,
            value: "Gravel".into(),
            reason: UnmatchedReason::NoOptions,
        })
        .unwrap();
    assert_eq!(workbook::read_table(&path).unwrap().len(), 1);

    let mut next_run = XlsxUnmatchedReport::new(&path);
    next_run.reset().unwrap();
    assert!(path.exists());
    assert!(workbook::read_table(&path).unwrap().is_empty());
}
