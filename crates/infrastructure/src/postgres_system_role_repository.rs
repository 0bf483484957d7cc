//! PostgreSQL-backed system-role provisioning.

use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool};

use atlasgate_application::{AddSystemRoleInput, ProvisionedSystemRole, SystemRoleRepository};
use atlasgate_core::{AppError, AppResult};
use atlasgate_domain::{
    PermissionGrant, PermissionKind, Role, database_permission_name, dataset_permission_name,
};

/// PostgreSQL implementation of the system-role repository port.
#[derive(Clone)]
pub struct PostgresSystemRoleRepository {
    pool: PgPool,
}

impl PostgresSystemRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DatasetRow {
    id: i64,
    table_name: String,
    database_name: String,
}

async fn find_or_create_grant(
    connection: &mut PgConnection,
    grant: &PermissionGrant,
) -> AppResult<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO permission_grants (permission, resource)
        VALUES ($1, $2)
        ON CONFLICT (permission, resource) DO UPDATE SET resource = EXCLUDED.resource
        RETURNING id
        "#,
    )
    .bind(grant.kind().as_str())
    .bind(grant.resource())
    .fetch_one(&mut *connection)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to persist {} grant on '{}': {error}",
            grant.kind().as_str(),
            grant.resource()
        ))
    })
}

async fn attach_grant(connection: &mut PgConnection, role_id: i64, grant_id: i64) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO role_grants (role_id, grant_id)
        VALUES ($1, $2)
        ON CONFLICT (role_id, grant_id) DO NOTHING
        "#,
    )
    .bind(role_id)
    .bind(grant_id)
    .execute(&mut *connection)
    .await
    .map_err(|error| AppError::Internal(format!("failed to attach role grant: {error}")))?;

    Ok(())
}

#[async_trait]
impl SystemRoleRepository for PostgresSystemRoleRepository {
    async fn provision_system_role(
        &self,
        input: AddSystemRoleInput,
    ) -> AppResult<ProvisionedSystemRole> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let database_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO database_connections (database_name, sqlalchemy_uri)
            VALUES ($1, $2)
            ON CONFLICT (database_name) DO UPDATE SET sqlalchemy_uri = EXCLUDED.sqlalchemy_uri
            RETURNING id
            "#,
        )
        .bind(input.database.as_str())
        .bind(input.sqlalchemy_uri.as_str())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to resolve database '{}': {error}",
                input.database
            ))
        })?;

        let (role_id, role_name) = sqlx::query_as::<_, (i64, String)>(
            r#"
            INSERT INTO roles (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(input.role.as_str())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve role '{}': {error}", input.role))
        })?;

        let database_grant = PermissionGrant::new(
            PermissionKind::DatabaseAccess,
            database_permission_name(input.database.as_str(), database_id),
        );
        let grant_id = find_or_create_grant(&mut transaction, &database_grant).await?;
        attach_grant(&mut transaction, role_id, grant_id).await?;

        let mut grants = vec![database_grant];
        for dataset_id in &input.datasets {
            let dataset = sqlx::query_as::<_, DatasetRow>(
                r#"
                SELECT datasets.id, datasets.table_name, database_connections.database_name
                FROM datasets
                INNER JOIN database_connections
                    ON database_connections.id = datasets.database_id
                WHERE datasets.id = $1
                "#,
            )
            .bind(dataset_id)
            .fetch_optional(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to find dataset {dataset_id}: {error}"))
            })?
            .ok_or_else(|| AppError::Internal(format!("dataset {dataset_id} does not exist")))?;

            let dataset_grant = PermissionGrant::new(
                PermissionKind::DatasourceAccess,
                dataset_permission_name(
                    dataset.database_name.as_str(),
                    dataset.table_name.as_str(),
                    dataset.id,
                ),
            );
            let grant_id = find_or_create_grant(&mut transaction, &dataset_grant).await?;
            attach_grant(&mut transaction, role_id, grant_id).await?;
            grants.push(dataset_grant);
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(ProvisionedSystemRole {
            role: Role::new(role_id, role_name),
            database_id,
            grants,
        })
    }
}

#[cfg(test)]
mod tests;
