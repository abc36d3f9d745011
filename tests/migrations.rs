use sqlx::{Row, SqlitePool};
use website::{
    codegen::Dialect,
    config::Config,
    database::Database,
    migrations::{MigrationExecutor, MigrationKey},
    AppError,
};

async fn setup() -> (SqlitePool, MigrationExecutor) {
    let db = Database::in_memory().await.unwrap();
    let executor =
        MigrationExecutor::with_default_migrations(db.pool.clone(), Config::default().auth).unwrap();
    (db.pool, executor)
}

async fn table_names(pool: &SqlitePool) -> Vec<String> {
    sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
        .fetch_all(pool)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.get::<String, _>("name"))
        .collect()
}

#[tokio::test]
async fn test_migrate_creates_page_table_with_expected_columns() {
    let (pool, executor) = setup().await;

    let applied = executor.migrate().await.unwrap();
    assert_eq!(
        applied,
        vec![
            MigrationKey::new("auth", "0001_initial"),
            MigrationKey::new("website", "0001_initial"),
        ]
    );

    let columns: Vec<(String, String, bool, bool)> = sqlx::query("PRAGMA table_info('website_page')")
        .fetch_all(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|row| {
            (
                row.get::<String, _>("name"),
                // SQLite may report declared types in either case
                row.get::<String, _>("type").to_lowercase(),
                row.get::<i64, _>("notnull") == 1,
                row.get::<i64, _>("pk") == 1,
            )
        })
        .collect();

    let expected = vec![
        ("id", "integer", true, true),
        ("title", "varchar(1000)", true, false),
        ("body", "text", true, false),
        ("created", "datetime", true, false),
        ("updated", "datetime", false, false),
        ("modified", "datetime", false, false),
        ("creator_id", "bigint", true, false),
    ];
    let expected: Vec<(String, String, bool, bool)> = expected
        .into_iter()
        .map(|(name, ty, not_null, pk)| (name.to_string(), ty.to_string(), not_null, pk))
        .collect();
    assert_eq!(columns, expected);
}

#[tokio::test]
async fn test_creator_foreign_key_cascades_and_is_indexed() {
    let (pool, executor) = setup().await;
    executor.migrate().await.unwrap();

    let fk = sqlx::query("PRAGMA foreign_key_list('website_page')")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(fk.get::<String, _>("table"), "auth_user");
    assert_eq!(fk.get::<String, _>("from"), "creator_id");
    assert_eq!(fk.get::<String, _>("to"), "id");
    assert_eq!(fk.get::<String, _>("on_delete"), "CASCADE");

    let indexes: Vec<String> = sqlx::query("PRAGMA index_list('website_page')")
        .fetch_all(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.get::<String, _>("name"))
        .collect();
    assert!(indexes.contains(&"website_page_creator_id_idx".to_string()));
}

#[tokio::test]
async fn test_migrate_is_idempotent() {
    let (_pool, executor) = setup().await;

    assert_eq!(executor.migrate().await.unwrap().len(), 2);
    assert!(executor.migrate().await.unwrap().is_empty());

    let status = executor.show().await.unwrap();
    assert_eq!(status.len(), 2);
    assert!(status.iter().all(|s| s.applied));
}

#[tokio::test]
async fn test_unapplying_user_app_also_unapplies_pages() {
    let (pool, executor) = setup().await;
    executor.migrate().await.unwrap();
    assert_eq!(
        table_names(&pool).await,
        vec!["auth_user", "schema_migrations", "website_page"]
    );

    let reversed = executor.unapply_app("auth").await.unwrap();
    assert_eq!(
        reversed,
        vec![
            MigrationKey::new("website", "0001_initial"),
            MigrationKey::new("auth", "0001_initial"),
        ]
    );
    assert_eq!(table_names(&pool).await, vec!["schema_migrations"]);
    assert!(executor.show().await.unwrap().iter().all(|s| !s.applied));

    // Re-applying after a full rollback works
    assert_eq!(executor.migrate().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unapplying_pages_keeps_users() {
    let (pool, executor) = setup().await;
    executor.migrate().await.unwrap();

    let reversed = executor.unapply_app("website").await.unwrap();
    assert_eq!(reversed, vec![MigrationKey::new("website", "0001_initial")]);
    assert_eq!(table_names(&pool).await, vec!["auth_user", "schema_migrations"]);
}

#[tokio::test]
async fn test_unapply_unknown_app_fails() {
    let (_pool, executor) = setup().await;
    let result = executor.unapply_app("blog").await;
    assert!(matches!(result, Err(AppError::MigrationError(_))));
}

#[tokio::test]
async fn test_inconsistent_history_is_rejected() {
    let (pool, executor) = setup().await;
    executor.ensure_recorder_table().await.unwrap();
    sqlx::query("INSERT INTO schema_migrations (app, name, applied) VALUES ('website', '0001_initial', '2024-01-06T18:53:00+00:00')")
        .execute(&pool)
        .await
        .unwrap();

    let err = executor.migrate().await.unwrap_err();
    assert!(err.to_string().contains("website.0001_initial"));
}

#[tokio::test]
async fn test_sqlmigrate_renders_without_applying() {
    let (pool, executor) = setup().await;

    let sqlite = executor.sql_for("website", "0001_initial", Dialect::Sqlite).unwrap();
    assert_eq!(sqlite.len(), 2);
    assert!(sqlite[0].starts_with("CREATE TABLE \"website_page\""));
    assert!(sqlite[0].contains("REFERENCES \"auth_user\" (\"id\") ON DELETE CASCADE"));

    let postgres = executor.sql_for("website", "0001_initial", Dialect::Postgres).unwrap();
    assert!(postgres[0].contains("GENERATED BY DEFAULT AS IDENTITY"));

    assert!(matches!(
        executor.sql_for("website", "0002_missing", Dialect::Sqlite),
        Err(AppError::NotFound(_))
    ));
    assert!(table_names(&pool).await.is_empty());
}

#[tokio::test]
async fn test_applied_migrations_persist_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.database.url = format!("sqlite:{}", dir.path().join("website.db").display());

    {
        let db = Database::connect(&config.database).await.unwrap();
        let executor =
            MigrationExecutor::with_default_migrations(db.pool.clone(), config.auth.clone()).unwrap();
        executor.migrate().await.unwrap();
        db.pool.close().await;
    }

    let db = Database::connect(&config.database).await.unwrap();
    let executor = MigrationExecutor::with_default_migrations(db.pool, config.auth).unwrap();
    assert!(executor.migrate().await.unwrap().is_empty());
    assert!(executor.show().await.unwrap().iter().all(|s| s.applied));
}
