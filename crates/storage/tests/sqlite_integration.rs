use storage::repository::{MaterialRepository, NewMaterialRecord, StorageError};
use storage::sqlite::SqliteRepository;
use studypace_core::model::{Category, MaterialDraft, MaterialId, StudyMaterial};

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn record(draft: MaterialDraft) -> NewMaterialRecord {
    NewMaterialRecord::from_validated(&draft.validate().expect("valid draft"))
}

#[tokio::test]
async fn sqlite_roundtrip_persists_all_fields() {
    let repo = connect("memdb_roundtrip").await;

    let id = repo
        .insert_new_material(record(
            MaterialDraft::new("Linear Algebra", "12")
                .with_category("Math")
                .with_target_date("2024-03-01"),
        ))
        .await
        .unwrap();

    let fetched = repo.get_material(id).await.unwrap().expect("material");
    assert_eq!(fetched.id(), id);
    assert_eq!(fetched.name(), "Linear Algebra");
    assert_eq!(fetched.total_units(), 12);
    assert_eq!(fetched.completed_units(), 0);
    assert_eq!(fetched.category().as_str(), "Math");
    assert_eq!(
        fetched.target_date(),
        chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
    );

    assert!(repo.get_material(MaterialId::new(999)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_orders_by_target_date_with_undated_last() {
    let repo = connect("memdb_ordering").await;

    let undated = repo
        .insert_new_material(record(MaterialDraft::new("Undated", "5").with_category("Math")))
        .await
        .unwrap();
    let late = repo
        .insert_new_material(record(
            MaterialDraft::new("Late", "5")
                .with_category("Math")
                .with_target_date("2024-12-01"),
        ))
        .await
        .unwrap();
    let early = repo
        .insert_new_material(record(
            MaterialDraft::new("Early", "5")
                .with_category("History")
                .with_target_date("2024-02-01"),
        ))
        .await
        .unwrap();
    let also_undated = repo
        .insert_new_material(record(MaterialDraft::new("Also undated", "5")))
        .await
        .unwrap();

    let all: Vec<_> = repo
        .list_materials(None)
        .await
        .unwrap()
        .iter()
        .map(StudyMaterial::id)
        .collect();
    assert_eq!(all, vec![early, late, undated, also_undated]);

    let math = Category::new("Math").unwrap();
    let only_math: Vec<_> = repo
        .list_materials(Some(&math))
        .await
        .unwrap()
        .iter()
        .map(StudyMaterial::id)
        .collect();
    assert_eq!(only_math, vec![late, undated]);

    let lower = Category::new("math").unwrap();
    assert!(repo.list_materials(Some(&lower)).await.unwrap().is_empty());

    let categories: Vec<String> = repo
        .distinct_categories()
        .await
        .unwrap()
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(categories, vec!["History", "Math", "Uncategorized"]);
}

#[tokio::test]
async fn sqlite_updates_and_deletes() {
    let repo = connect("memdb_mutations").await;

    let id = repo
        .insert_new_material(record(MaterialDraft::new("Chemistry", "10")))
        .await
        .unwrap();

    repo.set_completed_units(id, 4).await.unwrap();
    repo.set_completed_units(id, 4).await.unwrap();
    let fetched = repo.get_material(id).await.unwrap().unwrap();
    assert_eq!(fetched.completed_units(), 4);

    // The schema refuses progress past the total.
    assert!(repo.set_completed_units(id, 11).await.is_err());
    let fetched = repo.get_material(id).await.unwrap().unwrap();
    assert_eq!(fetched.completed_units(), 4);

    let missing = MaterialId::new(4242);
    assert!(matches!(
        repo.set_completed_units(missing, 1).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.delete_material(missing).await,
        Err(StorageError::NotFound)
    ));

    repo.delete_material(id).await.unwrap();
    assert!(repo.get_material(id).await.unwrap().is_none());
    assert!(matches!(
        repo.delete_material(id).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}
