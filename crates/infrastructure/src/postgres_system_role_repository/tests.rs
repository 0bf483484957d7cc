use atlasgate_application::{AddSystemRoleInput, SystemRoleRepository};
use atlasgate_core::AppError;
use atlasgate_domain::PermissionKind;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresSystemRoleRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres system role tests: {error}");
    }

    Some(pool)
}

fn unique_suffix() -> String {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .to_string()
}

async fn seed_dataset(pool: &PgPool, database_name: &str, table_name: &str) -> i64 {
    let database_id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO database_connections (database_name, sqlalchemy_uri)
            VALUES ($1, 'postgresql://reader@db/source')
            RETURNING id
            "#,
    )
    .bind(database_name)
    .fetch_one(pool)
    .await;
    assert!(database_id.is_ok());

    let dataset_id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO datasets (database_id, table_name)
            VALUES ($1, $2)
            RETURNING id
            "#,
    )
    .bind(database_id.unwrap_or_default())
    .bind(table_name)
    .fetch_one(pool)
    .await;
    assert!(dataset_id.is_ok());

    dataset_id.unwrap_or_default()
}

async fn count(pool: &PgPool, query: &str, value: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(query)
        .bind(value)
        .fetch_one(pool)
        .await
        .unwrap_or(-1)
}

#[tokio::test]
async fn provisioning_grants_database_and_dataset_access() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let suffix = unique_suffix();
    let source_database = format!("source-{suffix}");
    let dataset_id = seed_dataset(&pool, source_database.as_str(), "birth_names").await;
    let repository = PostgresSystemRoleRepository::new(pool.clone());

    let input = AddSystemRoleInput {
        role: format!("system-{suffix}"),
        database: format!("warehouse-{suffix}"),
        sqlalchemy_uri: "postgresql://reader@db/warehouse".to_owned(),
        datasets: vec![dataset_id],
    };

    let first = repository.provision_system_role(input.clone()).await;
    assert!(first.is_ok());
    let first = first.unwrap_or_else(|_| unreachable!());

    assert_eq!(first.grants.len(), 2);
    assert_eq!(first.grants[0].kind(), PermissionKind::DatabaseAccess);
    assert_eq!(
        first.grants[0].resource(),
        format!("[warehouse-{suffix}].(id:{})", first.database_id)
    );
    assert_eq!(
        first.grants[1].resource(),
        format!("[{source_database}].[birth_names](id:{dataset_id})")
    );

    let second = repository.provision_system_role(input).await;
    assert!(second.is_ok());
    assert_eq!(
        second.map(|provisioned| provisioned.database_id).ok(),
        Some(first.database_id)
    );

    let grant_count = count(
        &pool,
        r#"
            SELECT COUNT(*)
            FROM role_grants
            INNER JOIN roles ON roles.id = role_grants.role_id
            WHERE roles.name = $1
            "#,
        first.role.name(),
    )
    .await;
    assert_eq!(grant_count, 2);
}

#[tokio::test]
async fn unknown_dataset_rolls_back_every_write() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let suffix = unique_suffix();
    let repository = PostgresSystemRoleRepository::new(pool.clone());
    let role_name = format!("system-{suffix}");
    let database_name = format!("warehouse-{suffix}");

    let result = repository
        .provision_system_role(AddSystemRoleInput {
            role: role_name.clone(),
            database: database_name.clone(),
            sqlalchemy_uri: "postgresql://reader@db/warehouse".to_owned(),
            datasets: vec![i64::MAX],
        })
        .await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM roles WHERE name = $1", role_name.as_str()).await,
        0
    );
    assert_eq!(
        count(
            &pool,
            "SELECT COUNT(*) FROM database_connections WHERE database_name = $1",
            database_name.as_str()
        )
        .await,
        0
    );
    assert_eq!(
        count(
            &pool,
            "SELECT COUNT(*) FROM permission_grants WHERE resource LIKE $1 || '%'",
            format!("[{database_name}]").as_str()
        )
        .await,
        0
    );
}
