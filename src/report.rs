//! 未照合レポート
//!
//! Rows whose choice values had no good match. A row lands here either when
//! the best option scored below `matching.minScore` (that option is still
//! selected) or when the dropdown had no options at all.

use crate::error::{EntryError, Result};
use crate::workbook;
use pavement_entry_common::{RowIdentity, SectionField};
use std::fmt;
use std::path::{Path, PathBuf};

pub const UNMATCHED_HEADER: [&str; 7] = [
    "StreetLotId",
    "SectionId",
    "StreetNameLotLocation",
    "Area",
    "Field",
    "Value",
    "Reason",
];

const SHEET_NAME: &str = "Unmatched Rows";

#[derive(Debug, Clone, PartialEq)]
pub enum UnmatchedReason {
    /// best option and its score
    LowScore { selected: String, score: f64 },
    NoOptions,
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedReason::LowScore { selected, score } => {
                write!(f, "low score {:.2}, selected '{}'", score, selected)
            }
            UnmatchedReason::NoOptions => write!(f, "no options"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedRow {
    pub identity: RowIdentity,
    pub field: SectionField,
    /// value as matched, after aliasing
    pub value: String,
    pub reason: UnmatchedReason,
}

impl UnmatchedRow {
    pub fn to_cells(&self) -> Vec<String> {
        let mut cells: Vec<String> = self
            .identity
            .to_cells()
            .iter()
            .map(|s| s.to_string())
            .collect();
        cells.push(self.field.column().to_string());
        cells.push(self.value.clone());
        cells.push(self.reason.to_string());
        cells
    }
}

pub trait UnmatchedSink {
    /// Empties the report, leaving only the header
    fn reset(&mut self) -> Result<()>;

    fn record(&mut self, row: UnmatchedRow) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryUnmatchedReport {
    pub rows: Vec<UnmatchedRow>,
    pub resets: usize,
}

impl UnmatchedSink for MemoryUnmatchedReport {
    fn reset(&mut self) -> Result<()> {
        self.rows.clear();
        self.resets += 1;
        Ok(())
    }

    fn record(&mut self, row: UnmatchedRow) -> Result<()> {
        self.rows.push(row);
        Ok(())
    }
}

#[derive(Debug)]
pub struct XlsxUnmatchedReport {
    path: PathBuf,
    rows: Vec<Vec<String>>,
}

impl XlsxUnmatchedReport {
    /// Does not touch the file until [`UnmatchedSink::reset`] or a record
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            rows: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        workbook::write_table(&self.path, SHEET_NAME, &UNMATCHED_HEADER, &self.rows)
            .map_err(|e| EntryError::AuditLog(format!("unmatched report: {}", e)))
    }
}

impl UnmatchedSink for XlsxUnmatchedReport {
    fn reset(&mut self) -> Result<()> {
        self.rows.clear();
        self.save()
    }

    fn record(&mut self, row: UnmatchedRow) -> Result<()> {
        self.rows.push(row.to_cells());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_cells() {
        let row = UnmatchedRow {
            identity: RowIdentity {
                street_lot_id: "OAK".into(),
                section_id: "020".into(),
                street_name: "OAK ST".into(),
                area: "0.00".into(),
            },
            field: SectionField::SurfaceType,
            value: "Gravel".into(),
            reason: UnmatchedReason::LowScore {
                selected: "Asphalt Concrete".into(),
                score: 0.25,
            },
        };
        assert_eq!(
            row.to_cells(),
            vec![
                "OAK",
                "020",
                "OAK ST",
                "0.00",
                "Surface Type",
                "Gravel",
                "low score 0.25, selected 'Asphalt Concrete'"
            ]
        );
    }

    #[test]
    fn test_memory_reset_clears() {
        let mut report = MemoryUnmatchedReport::default();
        report
            .record(UnmatchedRow {
                identity: RowIdentity::default(),
                field: SectionField::AreaId,
                value: "X".into(),
                reason: UnmatchedReason::NoOptions,
            })
            .unwrap();
        report.reset().unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.resets, 1);
    }
}
