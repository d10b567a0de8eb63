//! Plain-text rendering of service results.

use std::fmt::Write as _;

use services::{MaterialListing, MaterialView};
use studypace_core::model::Category;

/// One line per material: id, name, category, progress, deadline, advice.
#[must_use]
pub fn material_line(view: &MaterialView) -> String {
    let m = &view.material;
    let due = m
        .target_date()
        .map_or_else(|| "no date".to_string(), |d| format!("due {d}"));
    format!(
        "[{}] {} ({})  {}/{}  {}  -> {}",
        m.id(),
        m.name(),
        m.category(),
        m.completed_units(),
        m.total_units(),
        due,
        view.advice
    )
}

#[must_use]
pub fn listing(listing: &MaterialListing) -> String {
    let mut out = String::new();
    if listing.materials.is_empty() {
        let _ = writeln!(out, "no study materials ({})", listing.filter);
    }
    for view in &listing.materials {
        let _ = writeln!(out, "{}", material_line(view));
    }
    let _ = writeln!(out, "categories: {}", categories(&listing.categories));
    out
}

#[must_use]
pub fn categories(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "(none)".to_string();
    }
    categories
        .iter()
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
