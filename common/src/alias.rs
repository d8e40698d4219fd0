//! エイリアス変換モジュール
//!
//! Expands abbreviations in choice fields (`AC` → `Asphalt Concrete`) before
//! fuzzy matching, so short codes typed by field crews do not lose to an
//! unrelated short option label.

use crate::error::{Error, Result};
use crate::record::SectionField;
use crate::similarity::fold;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

type FieldAliases = HashMap<SectionField, HashMap<String, String>>;

/// Per-field alias maps, keyed by [`SectionField`].
///
/// Alias keys are stored folded, so `"ac"` and `"AC"` are the same key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "FieldAliases", into = "FieldAliases")]
pub struct AliasConfig {
    fields: FieldAliases,
}

impl From<FieldAliases> for AliasConfig {
    fn from(fields: FieldAliases) -> Self {
        let mut config = Self::default();
        for (field, aliases) in fields {
            for (alias, replacement) in aliases {
                config.insert(field, &alias, &replacement);
            }
        }
        config
    }
}

impl From<AliasConfig> for FieldAliases {
    fn from(config: AliasConfig) -> Self {
        config.fields
    }
}

impl AliasConfig {
    /// 組み込みプリセットを取得
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "streetsaver" | "default" => Some(Self::streetsaver_preset()),
            "none" => Some(Self::default()),
            _ => None,
        }
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(Error::Config("alias table must be a JSON object".into()));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Abbreviations used across StreetSaver databases
    fn streetsaver_preset() -> Self {
        let mut config = Self::default();

        // Surface Type
        config.insert(SectionField::SurfaceType, "AC", "Asphalt Concrete");
        config.insert(SectionField::SurfaceType, "PCC", "Portland Cement Concrete");
        config.insert(SectionField::SurfaceType, "AC/AC", "AC over AC");
        config.insert(SectionField::SurfaceType, "AC/PCC", "AC over PCC");
        config.insert(SectionField::SurfaceType, "ST", "Surface Treatment");

        // Functional Class
        config.insert(SectionField::FunctionalClass, "A", "Arterial");
        config.insert(SectionField::FunctionalClass, "ART", "Arterial");
        config.insert(SectionField::FunctionalClass, "C", "Collector");
        config.insert(SectionField::FunctionalClass, "COL", "Collector");
        config.insert(SectionField::FunctionalClass, "R", "Residential/Local");
        config.insert(SectionField::FunctionalClass, "RES", "Residential/Local");
        config.insert(SectionField::FunctionalClass, "LOCAL", "Residential/Local");

        // Parking Lot Type
        config.insert(SectionField::ParkingLotType, "PL", "Parking Lot");

        config
    }

    pub fn insert(&mut self, field: SectionField, alias: &str, replacement: &str) {
        self.fields
            .entry(field)
            .or_default()
            .insert(fold(alias), replacement.to_string());
    }

    /// Replacement for `value` in `field`, or `value` itself.
    ///
    /// Keys compare case-insensitively on the whole value; partial matches are
    /// not expanded (`"AC"` must not rewrite `"PACIFIC AVE"`).
    pub fn resolve<'a>(&'a self, field: SectionField, value: &'a str) -> &'a str {
        if value.is_empty() {
            return value;
        }

        self.fields
            .get(&field)
            .and_then(|aliases| aliases.get(&fold(value)))
            .map(String::as_str)
            .unwrap_or(value)
    }

    /// 設定をマージ（後から追加した設定が優先）
    pub fn merge(&mut self, other: &AliasConfig) {
        // keys on both sides are already folded
        for (field, aliases) in &other.fields {
            self.fields
                .entry(*field)
                .or_default()
                .extend(aliases.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(HashMap::is_empty)
    }
}
