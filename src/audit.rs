//! 監査ログ
//!
//! One row per lifecycle event (workspace selected, row submitted, row
//! failed). The run only sees [`AuditSink`]; where entries end up is the
//! caller's choice.

use crate::error::{EntryError, Result};
use crate::workbook;
use chrono::{DateTime, FixedOffset, Utc};
use pavement_entry_common::RowIdentity;
use std::fmt;
use std::path::{Path, PathBuf};

pub const AUDIT_HEADER: [&str; 6] = [
    "Timestamp",
    "Action",
    "Street/Lot ID",
    "Section ID",
    "Street Name/Lot Location",
    "Area",
];

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SHEET_NAME: &str = "Audit Log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditAction {
    /// carries the database label that was picked
    WorkspaceSelected(String),
    RowSubmitted,
    /// carries the error message
    RowFailed(String),
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::WorkspaceSelected(name) => write!(f, "Database selected: {}", name),
            AuditAction::RowSubmitted => write!(f, "Section added"),
            AuditAction::RowFailed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub timestamp: DateTime<FixedOffset>,
    pub action: AuditAction,
    /// empty for events that are not about a row
    pub identity: RowIdentity,
}

impl AuditEntry {
    /// Entry stamped with the current time in `offset`
    pub fn now(offset: FixedOffset, action: AuditAction, identity: RowIdentity) -> Self {
        Self {
            timestamp: Utc::now().with_timezone(&offset),
            action,
            identity,
        }
    }

    pub fn to_cells(&self) -> Vec<String> {
        let mut cells = vec![
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.action.to_string(),
        ];
        cells.extend(self.identity.to_cells().iter().map(|s| s.to_string()));
        cells
    }
}

/// Append-only destination for audit entries
pub trait AuditSink {
    fn append(&mut self, entry: AuditEntry) -> Result<()>;
}

/// Keeps entries in memory
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    pub entries: Vec<AuditEntry>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&mut self, entry: AuditEntry) -> Result<()> {
        self.entries.push(entry);
        Ok(())
    }
}

/// xlsx audit log. Rows already in the file are kept and new ones go after
/// them.
#[derive(Debug)]
pub struct XlsxAuditLog {
    path: PathBuf,
    rows: Vec<Vec<String>>,
}

impl XlsxAuditLog {
    pub fn open(path: &Path) -> Result<Self> {
        let rows = workbook::read_table(path).map_err(EntryError::AuditLog)?;
        Ok(Self {
            path: path.to_path_buf(),
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl AuditSink for XlsxAuditLog {
    fn append(&mut self, entry: AuditEntry) -> Result<()> {
        self.rows.push(entry.to_cells());
        workbook::write_table(&self.path, SHEET_NAME, &AUDIT_HEADER, &self.rows)
            .map_err(EntryError::AuditLog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn identity() -> RowIdentity {
        RowIdentity {
            street_lot_id: "ELM".into(),
            section_id: "010".into(),
            street_name: "ELM AVE".into(),
            area: "1520.50".into(),
        }
    }

    #[test]
    fn test_entry_cells() {
        let offset = FixedOffset::west_opt(8 * 3600).unwrap();
        let entry = AuditEntry {
            timestamp: offset.with_ymd_and_hms(2024, 3, 5, 9, 7, 2).unwrap(),
            action: AuditAction::RowSubmitted,
            identity: identity(),
        };
        assert_eq!(
            entry.to_cells(),
            vec!["2024-03-05 09:07:02", "Section added", "ELM", "010", "ELM AVE", "1520.50"]
        );
    }

    #[test]
    fn test_now_uses_offset() {
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        let entry = AuditEntry::now(offset, AuditAction::RowSubmitted, RowIdentity::default());
        assert_eq!(entry.timestamp.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(
            AuditAction::WorkspaceSelected("City DB".into()).to_string(),
            "Database selected: City DB"
        );
        assert_eq!(AuditAction::RowFailed("boom".into()).to_string(), "Failed: boom");
    }

    #[test]
    fn test_memory_log_appends_in_order() {
        let mut log = MemoryAuditLog::new();
        let offset = FixedOffset::east_opt(0).unwrap();
        log.append(AuditEntry::now(offset, AuditAction::RowSubmitted, identity()))
            .unwrap();
        log.append(AuditEntry::now(offset, AuditAction::RowFailed("x".into()), identity()))
            .unwrap();
        assert_eq!(log.entries.len(), 2);
        assert_eq!(log.entries[1].action, AuditAction::RowFailed("x".into()));
    }
}
