//! 行データの型定義
//!
//! - Row: one spreadsheet record as read (column → raw cell)
//! - SectionField: the pavement-section columns the form knows about
//! - SectionRecord: a row normalized into typed fields with defaults

use crate::normalize::{
    normalize_cell_number, normalize_cell_string, normalize_cell_text, CellValue, DEFAULT_NUMBER,
};
use serde::{Deserialize, Serialize};

/// One spreadsheet record, columns kept in sheet order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
    /// 1-based row number in the sheet, header included
    sheet_row: Option<usize>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<CellValue>) -> Self {
        self.insert(column, value.into());
        self
    }

    pub fn at_sheet_row(mut self, sheet_row: usize) -> Self {
        self.sheet_row = Some(sheet_row);
        self
    }

    /// `None` for rows not read from a sheet
    pub fn sheet_row(&self) -> Option<usize> {
        self.sheet_row
    }

    /// Sets `column`, replacing an existing cell of the same name
    pub fn insert(&mut self, column: &str, value: CellValue) {
        match self.cells.iter_mut().find(|(name, _)| name == column) {
            Some((_, cell)) => *cell = value,
            None => self.cells.push((column.to_string(), value)),
        }
    }

    /// Cell of `column`, `None` when the sheet has no such column
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, cell)| cell.is_blank())
    }
}

/// How a column is normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// trimmed and truncated after the second `" - "`
    Location,
    /// trimmed only
    Text,
    /// two-decimal number, `"0.00"` by default
    Number,
}

/// Pavement-section fields, in the order the add-section form lays them out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionField {
    StreetLotId,
    SectionId,
    StreetNameLotLocation,
    BeginLocation,
    BeginPoint,
    EndLocation,
    EndPoint,
    NumLanes,
    FunctionalClass,
    Length,
    Width,
    Area,
    SurfaceType,
    ParkingLotType,
    SlabLength,
    SlabWidth,
    NumSlabs,
    TrafficIndex,
    Adt,
    AreaId,
    ShoulderWidth,
    FundSource,
    EffectiveDate,
    GeneralCode,
    Comments,
}

impl SectionField {
    pub const ALL: [SectionField; 25] = [
        SectionField::StreetLotId,
        SectionField::SectionId,
        SectionField::StreetNameLotLocation,
        SectionField::BeginLocation,
        SectionField::BeginPoint,
        SectionField::EndLocation,
        SectionField::EndPoint,
        SectionField::NumLanes,
        SectionField::FunctionalClass,
        SectionField::Length,
        SectionField::Width,
        SectionField::Area,
        SectionField::SurfaceType,
        SectionField::ParkingLotType,
        SectionField::SlabLength,
        SectionField::SlabWidth,
        SectionField::NumSlabs,
        SectionField::TrafficIndex,
        SectionField::Adt,
        SectionField::AreaId,
        SectionField::ShoulderWidth,
        SectionField::FundSource,
        SectionField::EffectiveDate,
        SectionField::GeneralCode,
        SectionField::Comments,
    ];

    /// Fields that identify a row in the audit log and the unmatched report
    pub const IDENTIFYING: [SectionField; 4] = [
        SectionField::StreetLotId,
        SectionField::SectionId,
        SectionField::StreetNameLotLocation,
        SectionField::Area,
    ];

    /// Spreadsheet header of the column
    pub fn column(&self) -> &'static str {
        match self {
            SectionField::StreetLotId => "Street/Lot ID",
            SectionField::SectionId => "Section ID",
            SectionField::StreetNameLotLocation => "Street Name/Lot Location",
            SectionField::BeginLocation => "Begin Location",
            SectionField::BeginPoint => "Begin Point",
            SectionField::EndLocation => "End Location",
            SectionField::EndPoint => "End Point",
            SectionField::NumLanes => "# of Lanes",
            SectionField::FunctionalClass => "Functional Class",
            SectionField::Length => "Length (ft.)",
            SectionField::Width => "Width (ft.)",
            SectionField::Area => "Area",
            SectionField::SurfaceType => "Surface Type",
            SectionField::ParkingLotType => "Parking Lot Type",
            SectionField::SlabLength => "Slab Length",
            SectionField::SlabWidth => "Slab Width",
            SectionField::NumSlabs => "# of Slabs",
            SectionField::TrafficIndex => "Traffic Index",
            SectionField::Adt => "ADT",
            SectionField::AreaId => "Area ID",
            SectionField::ShoulderWidth => "Shoulder Width",
            SectionField::FundSource => "Fund Source",
            SectionField::EffectiveDate => "Effective Date",
            SectionField::GeneralCode => "General Code",
            SectionField::Comments => "Comments",
        }
    }

    /// Key used in config files (`"surfaceType"`)
    pub fn key(&self) -> &'static str {
        match self {
            SectionField::StreetLotId => "streetLotId",
            SectionField::SectionId => "sectionId",
            SectionField::StreetNameLotLocation => "streetNameLotLocation",
            SectionField::BeginLocation => "beginLocation",
            SectionField::BeginPoint => "beginPoint",
            SectionField::EndLocation => "endLocation",
            SectionField::EndPoint => "endPoint",
            SectionField::NumLanes => "numLanes",
            SectionField::FunctionalClass => "functionalClass",
            SectionField::Length => "length",
            SectionField::Width => "width",
            SectionField::Area => "area",
            SectionField::SurfaceType => "surfaceType",
            SectionField::ParkingLotType => "parkingLotType",
            SectionField::SlabLength => "slabLength",
            SectionField::SlabWidth => "slabWidth",
            SectionField::NumSlabs => "numSlabs",
            SectionField::TrafficIndex => "trafficIndex",
            SectionField::Adt => "adt",
            SectionField::AreaId => "areaId",
            SectionField::ShoulderWidth => "shoulderWidth",
            SectionField::FundSource => "fundSource",
            SectionField::EffectiveDate => "effectiveDate",
            SectionField::GeneralCode => "generalCode",
            SectionField::Comments => "comments",
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            SectionField::StreetNameLotLocation
            | SectionField::BeginLocation
            | SectionField::EndLocation => ValueKind::Location,
            SectionField::NumLanes
            | SectionField::Length
            | SectionField::Width
            | SectionField::Area
            | SectionField::SlabLength
            | SectionField::SlabWidth
            | SectionField::NumSlabs
            | SectionField::TrafficIndex
            | SectionField::Adt
            | SectionField::ShoulderWidth => ValueKind::Number,
            _ => ValueKind::Text,
        }
    }

    /// Value used when the column is missing or blank
    pub fn default_value(&self) -> &'static str {
        match self.kind() {
            ValueKind::Number => DEFAULT_NUMBER,
            ValueKind::Location | ValueKind::Text => "",
        }
    }

    /// Normalizes one raw cell according to [`SectionField::kind`]
    pub fn normalize(&self, cell: &CellValue) -> String {
        match self.kind() {
            ValueKind::Location => normalize_cell_string(cell),
            ValueKind::Text => normalize_cell_text(cell),
            ValueKind::Number => normalize_cell_number(cell),
        }
    }
}

impl std::fmt::Display for SectionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// A row normalized into every [`SectionField`].
///
/// Missing or blank columns hold [`SectionField::default_value`]: `""` for
/// text fields and `"0.00"` for numeric ones.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRecord {
    values: Vec<(SectionField, String)>,
}

impl SectionRecord {
    pub fn from_row(row: &Row) -> Self {
        let values = SectionField::ALL
            .iter()
            .map(|field| {
                let value = match row.get(field.column()) {
                    Some(cell) => field.normalize(cell),
                    None => field.default_value().to_string(),
                };
                (*field, value)
            })
            .collect();

        Self { values }
    }

    pub fn get(&self, field: SectionField) -> &str {
        self.values
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| field.default_value())
    }

    /// Values of [`SectionField::IDENTIFYING`], in that order
    pub fn identity(&self) -> RowIdentity {
        RowIdentity {
            street_lot_id: self.get(SectionField::StreetLotId).to_string(),
            section_id: self.get(SectionField::SectionId).to_string(),
            street_name: self.get(SectionField::StreetNameLotLocation).to_string(),
            area: self.get(SectionField::Area).to_string(),
        }
    }
}

/// Identifying fields of a row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowIdentity {
    pub street_lot_id: String,
    pub section_id: String,
    pub street_name: String,
    pub area: String,
}

impl RowIdentity {
    pub fn to_cells(&self) -> [&str; 4] {
        [
            self.street_lot_id.as_str(),
            self.section_id.as_str(),
            self.street_name.as_str(),
            self.area.as_str(),
        ]
    }
}

impl std::fmt::Display for RowIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Street/Lot ID: {}, Section ID: {}, Area: {}",
            self.street_lot_id, self.section_id, self.area
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        Row::new()
            .with("Street/Lot ID", "ELM")
            .with("Section ID", " 010 ")
            .with("Street Name/Lot Location", "ELM AVE - LOT 2 - NORTH")
            .with("Area", 1520.5)
            .with("Surface Type", "AC")
            .with("Comments", "resurfaced - 2019 - partial")
    }

    #[test]
    fn test_record_normalizes_by_kind() {
        let record = SectionRecord::from_row(&sample_row());
        assert_eq!(record.get(SectionField::SectionId), "010");
        assert_eq!(record.get(SectionField::StreetNameLotLocation), "ELM AVE - LOT 2");
        assert_eq!(record.get(SectionField::Area), "1520.50");
        assert_eq!(record.get(SectionField::Comments), "resurfaced - 2019 - partial");
    }

    #[test]
    fn test_record_defaults_for_missing_columns() {
        let record = SectionRecord::from_row(&sample_row());
        assert_eq!(record.get(SectionField::Width), "0.00");
        assert_eq!(record.get(SectionField::FundSource), "");
    }

    #[test]
    fn test_identity() {
        let identity = SectionRecord::from_row(&sample_row()).identity();
        assert_eq!(identity.to_cells(), ["ELM", "010", "ELM AVE - LOT 2", "1520.50"]);
        assert!(identity.to_string().contains("Section ID: 010"));
    }

    #[test]
    fn test_row_insert_replaces() {
        let mut row = Row::new().with("Area", "1");
        row.insert("Area", CellValue::from("2"));
        assert_eq!(row.columns().count(), 1);
        assert_eq!(row.get("Area"), Some(&CellValue::from("2")));
    }

    #[test]
    fn test_field_keys_match_serde() {
        for field in SectionField::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.key()));
        }
    }
}
