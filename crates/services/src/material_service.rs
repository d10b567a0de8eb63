use std::sync::Arc;

use serde::Serialize;
use storage::repository::{MaterialRepository, NewMaterialRecord, StorageError};
use studypace_core::PaceInfo;
use studypace_core::model::{Category, CategoryFilter, MaterialDraft, MaterialId, StudyMaterial};
use studypace_core::progress::{ProgressError, TokenPolicy, UnitSet, parse_progress_value};

use crate::Clock;
use crate::error::MaterialServiceError;

/// A material together with its pacing advice for today.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialView {
    #[serde(flatten)]
    pub material: StudyMaterial,
    pub pace: PaceInfo,
    pub advice: String,
}

impl MaterialView {
    fn new(material: StudyMaterial, clock: &Clock) -> Self {
        let pace = material.pace_on(clock.today());
        let advice = pace.message();
        Self {
            material,
            pace,
            advice,
        }
    }
}

/// Listing page: the filtered materials plus every category in use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialListing {
    pub filter: String,
    pub materials: Vec<MaterialView>,
    pub categories: Vec<Category>,
}

/// Result of a progress update that reached an existing material.
///
/// Rejected input is not an error: the material is left unchanged and the
/// caller shows the reason as a warning.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressOutcome {
    Updated(MaterialView),
    Rejected(ProgressError),
}

impl ProgressOutcome {
    #[must_use]
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated(_))
    }

    /// Warning text for rejected input.
    #[must_use]
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Updated(_) => None,
            Self::Rejected(reason) => Some(reason.to_string()),
        }
    }
}

/// Orchestrates study material validation, persistence and pacing.
#[derive(Clone)]
pub struct MaterialService {
    clock: Clock,
    materials: Arc<dyn MaterialRepository>,
    token_policy: TokenPolicy,
}

impl MaterialService {
    #[must_use]
    pub fn new(clock: Clock, materials: Arc<dyn MaterialRepository>) -> Self {
        Self {
            clock,
            materials,
            token_policy: TokenPolicy::default(),
        }
    }

    /// Choose how unit-list input treats malformed tokens.
    #[must_use]
    pub fn with_token_policy(mut self, token_policy: TokenPolicy) -> Self {
        self.token_policy = token_policy;
        self
    }

    /// Validate a draft and persist it as a new material with no progress.
    ///
    /// # Errors
    ///
    /// Returns `MaterialServiceError::Validation` if the draft is invalid; no
    /// record is created in that case.
    /// Returns `MaterialServiceError::Storage` if persistence fails.
    pub async fn add_material(
        &self,
        draft: MaterialDraft,
    ) -> Result<MaterialId, MaterialServiceError> {
        let material = draft.validate()?;
        let id = self
            .materials
            .insert_new_material(NewMaterialRecord::from_validated(&material))
            .await?;
        tracing::info!(
            material_id = %id,
            material_name = %material.name,
            total_units = material.total_units,
            category = %material.category,
            "added study material"
        );
        Ok(id)
    }

    /// Fetch a material with its pacing advice.
    ///
    /// # Errors
    ///
    /// Returns `MaterialServiceError::NotFound` if the material does not exist.
    /// Returns `MaterialServiceError::Storage` if repository access fails.
    pub async fn get_material(&self, id: MaterialId) -> Result<MaterialView, MaterialServiceError> {
        let material = self.load(id).await?;
        Ok(MaterialView::new(material, &self.clock))
    }

    /// List materials for a category filter, alongside every category in use.
    ///
    /// A missing or blank filter, or the `"all"` sentinel, lists everything.
    ///
    /// # Errors
    ///
    /// Returns `MaterialServiceError::Storage` if repository access fails.
    pub async fn list_materials(
        &self,
        filter: Option<&str>,
    ) -> Result<MaterialListing, MaterialServiceError> {
        let filter = match filter.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse::<CategoryFilter>()?,
            None => CategoryFilter::All,
        };
        self.list_filtered(&filter).await
    }

    /// List materials matching an already parsed filter.
    ///
    /// # Errors
    ///
    /// Returns `MaterialServiceError::Storage` if repository access fails.
    pub async fn list_filtered(
        &self,
        filter: &CategoryFilter,
    ) -> Result<MaterialListing, MaterialServiceError> {
        let materials = self.materials.list_materials(filter.category()).await?;
        let categories = self.materials.distinct_categories().await?;
        tracing::debug!(%filter, count = materials.len(), "listed study materials");

        Ok(MaterialListing {
            filter: filter.to_string(),
            materials: materials
                .into_iter()
                .map(|m| MaterialView::new(m, &self.clock))
                .collect(),
            categories,
        })
    }

    /// Every category currently in use, sorted.
    ///
    /// # Errors
    ///
    /// Returns `MaterialServiceError::Storage` if repository access fails.
    pub async fn categories(&self) -> Result<Vec<Category>, MaterialServiceError> {
        Ok(self.materials.distinct_categories().await?)
    }

    /// Replace the completed-unit counter from user input such as `"12"`.
    ///
    /// # Errors
    ///
    /// Returns `MaterialServiceError::NotFound` if the material does not exist.
    /// Returns `MaterialServiceError::Storage` if persistence fails.
    pub async fn update_progress(
        &self,
        id: MaterialId,
        input: &str,
    ) -> Result<ProgressOutcome, MaterialServiceError> {
        let material = self.load(id).await?;
        match parse_progress_value(input, material.total_units()) {
            Ok(completed) => self.store_progress(material, completed).await,
            Err(reason) => Ok(reject(id, reason)),
        }
    }

    /// Replace the completed-unit counter from a list of finished unit
    /// numbers such as `"1, 2, 5"`; progress becomes the size of the set.
    ///
    /// # Errors
    ///
    /// Returns `MaterialServiceError::NotFound` if the material does not exist.
    /// Returns `MaterialServiceError::Storage` if persistence fails.
    pub async fn record_units(
        &self,
        id: MaterialId,
        input: &str,
    ) -> Result<ProgressOutcome, MaterialServiceError> {
        let material = self.load(id).await?;
        match UnitSet::parse(input, material.total_units(), self.token_policy) {
            Ok(units) => {
                tracing::debug!(material_id = %id, %units, "parsed unit list");
                self.store_progress(material, units.completed_units()).await
            }
            Err(reason) => Ok(reject(id, reason)),
        }
    }

    /// Delete a material.
    ///
    /// # Errors
    ///
    /// Returns `MaterialServiceError::NotFound` if the material does not exist.
    /// Returns `MaterialServiceError::Storage` if repository access fails.
    pub async fn delete_material(&self, id: MaterialId) -> Result<(), MaterialServiceError> {
        self.materials
            .delete_material(id)
            .await
            .map_err(not_found(id))?;
        tracing::info!(material_id = %id, "deleted study material");
        Ok(())
    }

    async fn load(&self, id: MaterialId) -> Result<StudyMaterial, MaterialServiceError> {
        self.materials
            .get_material(id)
            .await?
            .ok_or(MaterialServiceError::NotFound(id))
    }

    async fn store_progress(
        &self,
        mut material: StudyMaterial,
        completed: u32,
    ) -> Result<ProgressOutcome, MaterialServiceError> {
        material.set_completed_units(completed)?;
        self.materials
            .set_completed_units(material.id(), completed)
            .await
            .map_err(not_found(material.id()))?;
        tracing::info!(
            material_id = %material.id(),
            completed_units = completed,
            total_units = material.total_units(),
            "updated progress"
        );
        Ok(ProgressOutcome::Updated(MaterialView::new(material, &self.clock)))
    }
}

fn reject(id: MaterialId, reason: ProgressError) -> ProgressOutcome {
    tracing::warn!(material_id = %id, %reason, "rejected progress input");
    ProgressOutcome::Rejected(reason)
}

fn not_found(id: MaterialId) -> impl FnOnce(StorageError) -> MaterialServiceError {
    move |e| match e {
        StorageError::NotFound => MaterialServiceError::NotFound(id),
        other => MaterialServiceError::Storage(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Days;
    use storage::repository::Storage;
    use studypace_core::model::UNCATEGORIZED;
    use studypace_core::time::{fixed_clock, fixed_today};

    use crate::AppServices;

    fn service_at(clock: Clock) -> Arc<MaterialService> {
        AppServices::from_storage(&Storage::in_memory(), clock, TokenPolicy::default()).materials()
    }

    fn service() -> Arc<MaterialService> {
        service_at(fixed_clock())
    }

    fn in_days(n: u64) -> String {
        fixed_today()
            .checked_add_days(Days::new(n))
            .unwrap()
            .format("%Y-%m-%d")
            .to_string()
    }

    #[tokio::test]
    async fn add_then_get_round_trips_with_normalized_category() {
        let service = service();
        let id = service
            .add_material(MaterialDraft::new("Algebra", "20").with_category(""))
            .await
            .unwrap();

        let view = service.get_material(id).await.unwrap();
        assert_eq!(view.material.name(), "Algebra");
        assert_eq!(view.material.total_units(), 20);
        assert_eq!(view.material.completed_units(), 0);
        assert_eq!(view.material.category().as_str(), UNCATEGORIZED);
        assert_eq!(view.material.target_date(), None);
        assert_eq!(view.pace, PaceInfo::NoDeadline);
        assert_eq!(view.advice, "no deadline set");
    }

    #[tokio::test]
    async fn name_is_stored_trimmed() {
        let service = service();
        let id = service
            .add_material(MaterialDraft::new("  Physics  ", "10"))
            .await
            .unwrap();
        assert_eq!(service.get_material(id).await.unwrap().material.name(), "Physics");
    }

    #[tokio::test]
    async fn invalid_draft_creates_nothing() {
        let service = service();
        let err = service
            .add_material(MaterialDraft::new("Algebra", "zero"))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = service
            .add_material(MaterialDraft::new("Algebra", "4").with_target_date("tomorrow"))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let listing = service.list_materials(None).await.unwrap();
        assert!(listing.materials.is_empty());
        assert!(listing.categories.is_empty());
    }

    #[tokio::test]
    async fn pace_reflects_progress_and_target_date() {
        let service = service();
        let id = service
            .add_material(MaterialDraft::new("Biology", "10").with_target_date(in_days(3)))
            .await
            .unwrap();

        let outcome = service.update_progress(id, "4").await.unwrap();
        let ProgressOutcome::Updated(view) = outcome else {
            panic!("expected update, got {outcome:?}");
        };
        assert_eq!(
            view.pace,
            PaceInfo::OnPace {
                remaining_days: 3,
                pace: 2.0
            }
        );
        assert!(view.advice.contains('3'));
        assert!(view.advice.contains("2.0"));
    }

    #[tokio::test]
    async fn out_of_range_progress_is_a_warning_and_keeps_state() {
        let service = service();
        let id = service
            .add_material(MaterialDraft::new("Physics", "10"))
            .await
            .unwrap();
        service.update_progress(id, "6").await.unwrap();

        let outcome = service.update_progress(id, "15").await.unwrap();
        assert_eq!(
            outcome,
            ProgressOutcome::Rejected(ProgressError::OutOfRange {
                raw: "15".into(),
                total: 10
            })
        );
        assert!(outcome.warning().unwrap().contains("15"));

        let outcome = service.update_progress(id, "six").await.unwrap();
        assert!(!outcome.is_updated());

        let view = service.get_material(id).await.unwrap();
        assert_eq!(view.material.completed_units(), 6);
    }

    #[tokio::test]
    async fn repeated_update_is_idempotent() {
        let service = service();
        let id = service
            .add_material(MaterialDraft::new("Physics", "10"))
            .await
            .unwrap();
        service.update_progress(id, "3").await.unwrap();
        let once = service.get_material(id).await.unwrap();
        service.update_progress(id, "3").await.unwrap();
        let twice = service.get_material(id).await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn completed_material_is_complete_even_when_overdue() {
        let service = service_at(Clock::fixed(
            fixed_today().checked_add_days(Days::new(30)).unwrap(),
        ));
        let id = service
            .add_material(MaterialDraft::new("Statistics", "5").with_target_date(in_days(1)))
            .await
            .unwrap();

        assert_eq!(service.get_material(id).await.unwrap().pace, PaceInfo::Overdue);
        service.update_progress(id, "5").await.unwrap();
        assert_eq!(service.get_material(id).await.unwrap().pace, PaceInfo::Complete);
    }

    #[tokio::test]
    async fn record_units_follows_token_policy() {
        let lenient = service();
        let id = lenient
            .add_material(MaterialDraft::new("Geometry", "10").with_target_date(in_days(0)))
            .await
            .unwrap();

        let outcome = lenient.record_units(id, "1, 2, x, 2, 11").await.unwrap();
        let ProgressOutcome::Updated(view) = outcome else {
            panic!("expected update, got {outcome:?}");
        };
        assert_eq!(view.material.completed_units(), 2);
        assert_eq!(view.pace, PaceInfo::FinishToday { remaining_units: 8 });

        let strict = MaterialService::clone(&lenient).with_token_policy(TokenPolicy::Strict);
        let outcome = strict.record_units(id, "1, 2, 3, x").await.unwrap();
        assert_eq!(
            outcome,
            ProgressOutcome::Rejected(ProgressError::MalformedToken { token: "x".into() })
        );
        assert_eq!(strict.get_material(id).await.unwrap().material.completed_units(), 2);

        let outcome = lenient.record_units(id, "none").await.unwrap();
        assert!(matches!(
            outcome,
            ProgressOutcome::Rejected(ProgressError::NoValidUnits { .. })
        ));
    }

    #[tokio::test]
    async fn missing_material_is_not_found() {
        let service = service();
        let id = service
            .add_material(MaterialDraft::new("Kept", "3"))
            .await
            .unwrap();
        let missing = MaterialId::new(404);

        assert!(service.delete_material(missing).await.unwrap_err().is_not_found());
        assert!(service.update_progress(missing, "1").await.unwrap_err().is_not_found());
        assert!(service.record_units(missing, "1").await.unwrap_err().is_not_found());
        assert!(service.get_material(missing).await.unwrap_err().is_not_found());

        let listing = service.list_materials(Some("all")).await.unwrap();
        assert_eq!(listing.materials.len(), 1);
        assert_eq!(listing.materials[0].material.id(), id);
    }

    #[tokio::test]
    async fn listing_filters_by_category_and_reports_all_categories() {
        let service = service();
        for (name, category, target) in [
            ("Calculus", "Math", None),
            ("Topology", "Math", Some(in_days(10))),
            ("Baroque", "Music", Some(in_days(2))),
        ] {
            let mut draft = MaterialDraft::new(name, "8").with_category(category);
            if let Some(t) = target {
                draft = draft.with_target_date(t);
            }
            service.add_material(draft).await.unwrap();
        }

        let all = service.list_materials(Some("all")).await.unwrap();
        let names: Vec<_> = all.materials.iter().map(|v| v.material.name()).collect();
        assert_eq!(names, vec!["Baroque", "Topology", "Calculus"]);
        assert_eq!(all.filter, "all");

        let math = service.list_materials(Some("Math")).await.unwrap();
        let names: Vec<_> = math.materials.iter().map(|v| v.material.name()).collect();
        assert_eq!(names, vec!["Topology", "Calculus"]);
        let categories: Vec<_> = math.categories.iter().map(Category::as_str).collect();
        assert_eq!(categories, vec!["Math", "Music"]);

        assert!(service.list_materials(Some("math")).await.unwrap().materials.is_empty());
        assert_eq!(service.list_materials(Some("  ")).await.unwrap().materials.len(), 3);
    }

    #[tokio::test]
    async fn view_serializes_flat_material_with_pace() {
        let service = service();
        let id = service
            .add_material(MaterialDraft::new("Latin", "4").with_category("Languages"))
            .await
            .unwrap();
        let json = serde_json::to_value(service.get_material(id).await.unwrap()).unwrap();
        assert_eq!(json["name"], "Latin");
        assert_eq!(json["category"], "Languages");
        assert_eq!(json["pace"]["status"], "no_deadline");
        assert_eq!(json["advice"], "no deadline set");
    }
}
