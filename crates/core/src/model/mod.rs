mod category;
mod ids;
mod material;

pub use category::{ALL_CATEGORIES, Category, CategoryError, CategoryFilter, UNCATEGORIZED};
pub use ids::{MaterialId, ParseIdError};
pub use material::{
    DATE_FORMAT, MaterialDraft, MaterialError, StudyMaterial, ValidatedMaterial, parse_target_date,
};
