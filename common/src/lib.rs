//! Pavement Entry Common Library
//!
//! Pure building blocks shared by the runner: cell normalization, the
//! section schema, edit-distance scoring and dropdown matching.

pub mod alias;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod record;
pub mod similarity;

pub use alias::AliasConfig;
pub use error::{Error, Result};
pub use matcher::{select_best, DropdownOption, MatchResult};
pub use normalize::{normalize_number, normalize_string, normalize_text, CellValue};
pub use record::{Row, RowIdentity, SectionField, SectionRecord, ValueKind};
pub use similarity::{distance, similarity};
