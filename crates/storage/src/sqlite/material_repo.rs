use studypace_core::model::{Category, MaterialId, StudyMaterial};

use super::SqliteRepository;
use super::mapping::{map_material_row, material_id_from_i64, material_id_to_i64};
use crate::repository::{MaterialRepository, NewMaterialRecord, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl MaterialRepository for SqliteRepository {
    async fn insert_new_material(
        &self,
        material: NewMaterialRecord,
    ) -> Result<MaterialId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO materials (name, total_units, completed_units, target_date, category)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(material.name)
        .bind(i64::from(material.total_units))
        .bind(i64::from(material.completed_units))
        .bind(material.target_date)
        .bind(String::from(material.category))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        material_id_from_i64(res.last_insert_rowid())
    }

    async fn get_material(&self, id: MaterialId) -> Result<Option<StudyMaterial>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, total_units, completed_units, target_date, category
            FROM materials WHERE id = ?1
            ",
        )
        .bind(material_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_material_row).transpose()
    }

    async fn list_materials(
        &self,
        category: Option<&Category>,
    ) -> Result<Vec<StudyMaterial>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, total_units, completed_units, target_date, category
            FROM materials
            WHERE ?1 IS NULL OR category = ?1
            ORDER BY target_date IS NULL, target_date ASC, id ASC
            ",
        )
        .bind(category.map(Category::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut materials = Vec::with_capacity(rows.len());
        for row in rows {
            materials.push(map_material_row(&row)?);
        }
        Ok(materials)
    }

    async fn set_completed_units(
        &self,
        id: MaterialId,
        completed_units: u32,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE materials SET completed_units = ?1 WHERE id = ?2")
            .bind(i64::from(completed_units))
            .bind(material_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_material(&self, id: MaterialId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM materials WHERE id = ?1")
            .bind(material_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn distinct_categories(&self) -> Result<Vec<Category>, StorageError> {
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM materials ORDER BY category ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(conn)?;

        rows.into_iter()
            .map(|c| Category::new(c).map_err(|e| StorageError::Serialization(e.to_string())))
            .collect()
    }
}
