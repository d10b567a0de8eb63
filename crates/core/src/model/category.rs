use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label used when a material is added without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Filter token that selects every category.
pub const ALL_CATEGORIES: &str = "all";

/// Validated category label (trimmed, non-empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    /// Create a validated category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::Empty` if the label is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, CategoryError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CategoryError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Normalize optional user input, falling back to [`UNCATEGORIZED`] for
    /// missing or blank labels.
    #[must_use]
    pub fn from_input(value: Option<&str>) -> Self {
        value
            .and_then(|v| Self::new(v).ok())
            .unwrap_or_else(Self::uncategorized)
    }

    #[must_use]
    pub fn uncategorized() -> Self {
        Self(UNCATEGORIZED.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::uncategorized()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Category {
    type Error = CategoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.0
    }
}

/// Which materials a listing should include.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Exact, case-sensitive match on the category label.
    Only(Category),
}

impl CategoryFilter {
    #[must_use]
    pub fn matches(&self, category: &Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => wanted == category,
        }
    }

    #[must_use]
    pub fn category(&self) -> Option<&Category> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(c) => Some(c),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = CategoryError;

    /// `"all"` (exactly) selects everything; any other non-blank value is a
    /// category label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == ALL_CATEGORIES {
            return Ok(Self::All);
        }
        Category::new(s).map(Self::Only)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "{ALL_CATEGORIES}"),
            CategoryFilter::Only(c) => write!(f, "{c}"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("category cannot be empty")]
    Empty,
}
