//! ドロップダウン照合
//!
//! Resolves a spreadsheet value to the closest option of a server-rendered
//! `<select>`. Options are passed in exactly as read from the page; this
//! module never caches them.
//!
//! Scoring uses the edit-distance similarity of [`crate::similarity`] on
//! folded strings. Bigram overlap ranks options differently and is not used.

use crate::error::{Error, Result};
use crate::similarity::folded_similarity;
use serde::{Deserialize, Serialize};

/// A `(value, label)` pair of a dropdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub value: String,
    pub label: String,
}

impl DropdownOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// 照合結果
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub option: DropdownOption,
    /// similarity of the option label to the target, in `[0, 1]`
    pub score: f64,
    /// position of the option in the list it was picked from
    pub index: usize,
}

/// Picks the option whose label is most similar to `target`.
///
/// Options are scanned in order and a later option only replaces the current
/// pick when it scores strictly higher, so exact ties go to the earliest
/// listed option.
///
/// # Errors
/// [`Error::NoCandidates`] when `options` is empty.
pub fn select_best(target: &str, options: &[DropdownOption]) -> Result<MatchResult> {
    let mut best: Option<MatchResult> = None;

    for (index, option) in options.iter().enumerate() {
        let score = folded_similarity(target, &option.label);
        let better = match &best {
            Some(current) => score > current.score,
            None => true,
        };
        if better {
            best = Some(MatchResult {
                option: option.clone(),
                score,
                index,
            });
        }
    }

    best.ok_or_else(|| Error::NoCandidates {
        target: target.to_string(),
    })
}
