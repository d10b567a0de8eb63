use chrono::NaiveDate;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use studypace_core::model::{Category, MaterialId, StudyMaterial};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn material_id_from_i64(v: i64) -> Result<MaterialId, StorageError> {
    Ok(MaterialId::new(i64_to_u64("material_id", v)?))
}

pub(crate) fn material_id_to_i64(id: MaterialId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("id overflow".into()))
}

pub(crate) fn map_material_row(row: &SqliteRow) -> Result<StudyMaterial, StorageError> {
    let id = material_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let total_units = i64_to_u32("total_units", row.try_get("total_units").map_err(ser)?)?;
    let completed_units =
        i64_to_u32("completed_units", row.try_get("completed_units").map_err(ser)?)?;
    let target_date: Option<NaiveDate> = row.try_get("target_date").map_err(ser)?;
    let category = Category::new(row.try_get::<String, _>("category").map_err(ser)?).map_err(ser)?;

    StudyMaterial::from_persisted(
        id,
        row.try_get::<String, _>("name").map_err(ser)?,
        total_units,
        completed_units,
        target_date,
        category,
    )
    .map_err(ser)
}
