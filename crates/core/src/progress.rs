//! Parsing of user-entered progress.
//!
//! Progress is stored as a plain counter. Users can type either the counter
//! itself ("12") or the list of unit numbers they have finished
//! ("1, 2 5,7"), which resolves to the size of the de-duplicated set.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("progress must be a whole number, got {raw:?}")]
    NotANumber { raw: String },

    #[error("progress {raw} is larger than the {total} units available")]
    OutOfRange { raw: String, total: u32 },

    #[error("no valid unit numbers in {raw:?}")]
    NoValidUnits { raw: String },

    #[error("{token:?} is not a unit number")]
    MalformedToken { token: String },

    #[error("unit {unit} is outside 1..={total}")]
    UnitOutOfRange { unit: String, total: u32 },
}

/// Parse a counter update typed by the user.
///
/// # Errors
///
/// Returns `ProgressError::NotANumber` unless the trimmed input is made only of
/// ASCII digits, and `ProgressError::OutOfRange` when the value exceeds
/// `total_units`.
pub fn parse_progress_value(input: &str, total_units: u32) -> Result<u32, ProgressError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProgressError::NotANumber {
            raw: input.to_string(),
        });
    }
    let out_of_range = || ProgressError::OutOfRange {
        raw: trimmed.to_string(),
        total: total_units,
    };
    let value = trimmed.parse::<u32>().map_err(|_| out_of_range())?;
    if value > total_units {
        return Err(out_of_range());
    }
    Ok(value)
}

/// How unit-list input treats tokens that are not valid unit numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPolicy {
    /// Drop bad tokens and keep the rest; fail only when nothing is left.
    #[default]
    Lenient,
    /// Reject the whole input on the first bad token.
    Strict,
}

impl FromStr for TokenPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown token policy: {other}")),
        }
    }
}

impl fmt::Display for TokenPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenPolicy::Lenient => write!(f, "lenient"),
            TokenPolicy::Strict => write!(f, "strict"),
        }
    }
}

/// Sorted, de-duplicated set of completed unit numbers in `1..=total_units`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnitSet(BTreeSet<u32>);

impl UnitSet {
    /// Parse free-form text of unit numbers separated by commas or whitespace.
    ///
    /// # Errors
    ///
    /// Under `TokenPolicy::Strict`, returns `MalformedToken` or
    /// `UnitOutOfRange` for the first bad token. Under either policy, returns
    /// `NoValidUnits` if no unit number survives.
    pub fn parse(input: &str, total_units: u32, policy: TokenPolicy) -> Result<Self, ProgressError> {
        let mut units = BTreeSet::new();
        for token in input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let parsed = if token.bytes().all(|b| b.is_ascii_digit()) {
                token.parse::<u32>().ok()
            } else {
                None
            };

            match parsed {
                Some(unit) if (1..=total_units).contains(&unit) => {
                    units.insert(unit);
                }
                Some(_) if policy == TokenPolicy::Strict => {
                    return Err(ProgressError::UnitOutOfRange {
                        unit: token.to_string(),
                        total: total_units,
                    });
                }
                None if policy == TokenPolicy::Strict => {
                    return Err(ProgressError::MalformedToken {
                        token: token.to_string(),
                    });
                }
                _ => {}
            }
        }

        if units.is_empty() {
            return Err(ProgressError::NoValidUnits {
                raw: input.to_string(),
            });
        }
        Ok(Self(units))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of completed units, the value stored on the material.
    #[must_use]
    pub fn completed_units(&self) -> u32 {
        // Every member is a distinct u32 so the count always fits.
        u32::try_from(self.0.len()).unwrap_or(u32::MAX)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for UnitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for unit in &self.0 {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{unit}")?;
            first = false;
        }
        Ok(())
    }
}
