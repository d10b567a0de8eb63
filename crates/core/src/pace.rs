//! Pacing advice: how many units a day it takes to hit the target date.
//!
//! Always computed on read from the current date, never stored.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Outcome of a pacing calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaceInfo {
    /// No target date was set.
    NoDeadline,
    /// Every unit is done, whatever the date.
    Complete,
    /// The target date is in the past and units remain.
    Overdue,
    /// The target date is today.
    FinishToday { remaining_units: u32 },
    /// Units left to spread over the days until the target date.
    OnPace { remaining_days: i64, pace: f64 },
}

impl PaceInfo {
    /// Human-readable advice, as shown next to a material.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PaceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaceInfo::NoDeadline => write!(f, "no deadline set"),
            PaceInfo::Complete => write!(f, "complete!"),
            PaceInfo::Overdue => write!(f, "deadline passed!"),
            PaceInfo::FinishToday { remaining_units } => {
                write!(f, "finish the remaining {remaining_units} today!")
            }
            PaceInfo::OnPace {
                remaining_days,
                pace,
            } => {
                let days = if *remaining_days == 1 { "day" } else { "days" };
                write!(
                    f,
                    "{remaining_days} {days} left (about {pace:.1} units per day)"
                )
            }
        }
    }
}

/// Compute pacing advice for a material.
///
/// Completion wins over every date check, so a finished material never reads
/// as overdue.
#[must_use]
pub fn pace_info(
    total_units: u32,
    completed_units: u32,
    target_date: Option<NaiveDate>,
    today: NaiveDate,
) -> PaceInfo {
    let Some(target_date) = target_date else {
        return PaceInfo::NoDeadline;
    };

    let remaining_units = i64::from(total_units) - i64::from(completed_units);
    if remaining_units <= 0 {
        return PaceInfo::Complete;
    }
    // remaining_units is in (0, u32::MAX] here.
    let remaining = u32::try_from(remaining_units).unwrap_or(u32::MAX);

    let remaining_days = (target_date - today).num_days();
    match remaining_days {
        d if d < 0 => PaceInfo::Overdue,
        0 => PaceInfo::FinishToday {
            remaining_units: remaining,
        },
        d => {
            #[allow(clippy::cast_precision_loss)]
            let pace = f64::from(remaining) / d as f64;
            PaceInfo::OnPace {
                remaining_days: d,
                pace,
            }
        }
    }
}
