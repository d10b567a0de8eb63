use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::model::category::Category;
use crate::model::ids::MaterialId;
use crate::pace::{PaceInfo, pace_info};

/// Calendar format accepted for target dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MaterialError {
    #[error("material name cannot be empty")]
    EmptyName,

    #[error("total units must be a positive integer, got {raw:?}")]
    InvalidTotalUnits { raw: String },

    #[error("target date must be a YYYY-MM-DD calendar date, got {raw:?}")]
    InvalidTargetDate { raw: String },

    #[error("completed units {completed} exceed total units {total}")]
    CompletedExceedsTotal { completed: u32, total: u32 },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Raw input for a new material, as typed by the user.
///
/// Numbers and dates stay textual until [`MaterialDraft::validate`] so that
/// malformed input is reported as a validation failure rather than a parse
/// panic at the edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialDraft {
    pub name: String,
    pub total_units: String,
    pub category: Option<String>,
    pub target_date: Option<String>,
}

impl MaterialDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, total_units: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total_units: total_units.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_target_date(mut self, target_date: impl Into<String>) -> Self {
        self.target_date = Some(target_date.into());
        self
    }

    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `MaterialError::EmptyName` for a blank name,
    /// `MaterialError::InvalidTotalUnits` unless the unit count is a positive
    /// integer, and `MaterialError::InvalidTargetDate` if a non-blank target
    /// date is not a calendar date.
    pub fn validate(self) -> Result<ValidatedMaterial, MaterialError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(MaterialError::EmptyName);
        }

        let total_units = parse_total_units(&self.total_units)?;
        let target_date = parse_target_date(self.target_date.as_deref())?;

        Ok(ValidatedMaterial {
            name: name.to_owned(),
            total_units,
            category: Category::from_input(self.category.as_deref()),
            target_date,
        })
    }
}

fn parse_total_units(raw: &str) -> Result<u32, MaterialError> {
    let trimmed = raw.trim();
    let invalid = || MaterialError::InvalidTotalUnits {
        raw: raw.to_string(),
    };
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match trimmed.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid()),
    }
}

/// Parse an optional `YYYY-MM-DD` date; blank input means no deadline.
///
/// # Errors
///
/// Returns `MaterialError::InvalidTargetDate` for anything that is not a
/// real calendar date.
pub fn parse_target_date(raw: Option<&str>) -> Result<Option<NaiveDate>, MaterialError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Some)
            .map_err(|_| MaterialError::InvalidTargetDate { raw: s.to_string() }),
    }
}

/// A draft that passed validation but has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMaterial {
    pub name: String,
    pub total_units: u32,
    pub category: Category,
    pub target_date: Option<NaiveDate>,
}

impl ValidatedMaterial {
    #[must_use]
    pub fn assign_id(self, id: MaterialId) -> StudyMaterial {
        StudyMaterial {
            id,
            name: self.name,
            total_units: self.total_units,
            completed_units: 0,
            target_date: self.target_date,
            category: self.category,
        }
    }
}

//
// ─── MATERIAL ──────────────────────────────────────────────────────────────────
//

/// A textbook or course split into a fixed number of units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyMaterial {
    id: MaterialId,
    name: String,
    total_units: u32,
    completed_units: u32,
    target_date: Option<NaiveDate>,
    category: Category,
}

impl StudyMaterial {
    /// Rebuild a material from stored fields, re-checking invariants.
    ///
    /// # Errors
    ///
    /// Returns `MaterialError` if the stored row violates a record invariant.
    pub fn from_persisted(
        id: MaterialId,
        name: String,
        total_units: u32,
        completed_units: u32,
        target_date: Option<NaiveDate>,
        category: Category,
    ) -> Result<Self, MaterialError> {
        if name.trim().is_empty() {
            return Err(MaterialError::EmptyName);
        }
        if total_units == 0 {
            return Err(MaterialError::InvalidTotalUnits {
                raw: total_units.to_string(),
            });
        }
        if completed_units > total_units {
            return Err(MaterialError::CompletedExceedsTotal {
                completed: completed_units,
                total: total_units,
            });
        }
        Ok(Self {
            id,
            name,
            total_units,
            completed_units,
            target_date,
            category,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> MaterialId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn total_units(&self) -> u32 {
        self.total_units
    }

    #[must_use]
    pub fn completed_units(&self) -> u32 {
        self.completed_units
    }

    #[must_use]
    pub fn target_date(&self) -> Option<NaiveDate> {
        self.target_date
    }

    #[must_use]
    pub fn category(&self) -> &Category {
        &self.category
    }

    #[must_use]
    pub fn remaining_units(&self) -> u32 {
        self.total_units - self.completed_units
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_units >= self.total_units
    }

    /// Replace the completed-unit counter.
    ///
    /// # Errors
    ///
    /// Returns `MaterialError::CompletedExceedsTotal` and leaves the counter
    /// untouched when `completed` is larger than the total.
    pub fn set_completed_units(&mut self, completed: u32) -> Result<(), MaterialError> {
        if completed > self.total_units {
            return Err(MaterialError::CompletedExceedsTotal {
                completed,
                total: self.total_units,
            });
        }
        self.completed_units = completed;
        Ok(())
    }

    /// Pacing advice for this material as of `today`.
    #[must_use]
    pub fn pace_on(&self, today: NaiveDate) -> PaceInfo {
        pace_info(
            self.total_units,
            self.completed_units,
            self.target_date,
            today,
        )
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
