use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use studypace_core::model::{Category, MaterialId, StudyMaterial, ValidatedMaterial};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert shape for a material that has not been assigned an id yet.
#[derive(Debug, Clone)]
pub struct NewMaterialRecord {
    pub name: String,
    pub total_units: u32,
    pub completed_units: u32,
    pub target_date: Option<NaiveDate>,
    pub category: Category,
}

impl NewMaterialRecord {
    #[must_use]
    pub fn from_validated(material: &ValidatedMaterial) -> Self {
        Self {
            name: material.name.clone(),
            total_units: material.total_units,
            completed_units: 0,
            target_date: material.target_date,
            category: material.category.clone(),
        }
    }
}

/// Repository contract for study materials.
///
/// Listings are ordered by target date ascending, undated materials last,
/// ties broken by id.
#[async_trait]
pub trait MaterialRepository: Send + Sync {
    /// Insert a new material and return its store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the material cannot be stored.
    async fn insert_new_material(
        &self,
        material: NewMaterialRecord,
    ) -> Result<MaterialId, StorageError>;

    /// Fetch a material by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn get_material(&self, id: MaterialId) -> Result<Option<StudyMaterial>, StorageError>;

    /// List materials, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_materials(
        &self,
        category: Option<&Category>,
    ) -> Result<Vec<StudyMaterial>, StorageError>;

    /// Replace the completed-unit counter of a material.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the material is missing.
    async fn set_completed_units(
        &self,
        id: MaterialId,
        completed_units: u32,
    ) -> Result<(), StorageError>;

    /// Delete a material.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the material is missing.
    async fn delete_material(&self, id: MaterialId) -> Result<(), StorageError>;

    /// Every category currently in use, sorted and de-duplicated.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn distinct_categories(&self) -> Result<Vec<Category>, StorageError>;
}

/// Sort materials into listing order.
pub fn sort_for_listing(materials: &mut [StudyMaterial]) {
    materials.sort_by_key(|m| (m.target_date().is_none(), m.target_date(), m.id()));
}

#[derive(Default)]
struct InMemoryState {
    next_id: u64,
    materials: BTreeMap<MaterialId, StudyMaterial>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl MaterialRepository for InMemoryRepository {
    async fn insert_new_material(
        &self,
        material: NewMaterialRecord,
    ) -> Result<MaterialId, StorageError> {
        let mut guard = self.lock()?;
        guard.next_id += 1;
        let id = MaterialId::new(guard.next_id);
        let stored = StudyMaterial::from_persisted(
            id,
            material.name,
            material.total_units,
            material.completed_units,
            material.target_date,
            material.category,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.materials.insert(id, stored);
        Ok(id)
    }

    async fn get_material(&self, id: MaterialId) -> Result<Option<StudyMaterial>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.materials.get(&id).cloned())
    }

    async fn list_materials(
        &self,
        category: Option<&Category>,
    ) -> Result<Vec<StudyMaterial>, StorageError> {
        let guard = self.lock()?;
        let mut found: Vec<StudyMaterial> = guard
            .materials
            .values()
            .filter(|m| category.is_none_or(|c| m.category() == c))
            .cloned()
            .collect();
        sort_for_listing(&mut found);
        Ok(found)
    }

    async fn set_completed_units(
        &self,
        id: MaterialId,
        completed_units: u32,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let material = guard.materials.get_mut(&id).ok_or(StorageError::NotFound)?;
        material
            .set_completed_units(completed_units)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn delete_material(&self, id: MaterialId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard
            .materials
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn distinct_categories(&self) -> Result<Vec<Category>, StorageError> {
        let guard = self.lock()?;
        let categories: BTreeSet<Category> = guard
            .materials
            .values()
            .map(|m| m.category().clone())
            .collect();
        Ok(categories.into_iter().collect())
    }
}

/// Bundles repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub materials: Arc<dyn MaterialRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let materials: Arc<dyn MaterialRepository> = Arc::new(InMemoryRepository::new());
        Self { materials }
    }
}
