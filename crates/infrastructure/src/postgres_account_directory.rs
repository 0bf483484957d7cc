//! PostgreSQL-backed account directory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use atlasgate_application::{AccountDirectory, NewUserAccount, UserAccount};
use atlasgate_core::{AppError, AppResult};
use atlasgate_domain::Role;

/// PostgreSQL implementation of the account directory port.
#[derive(Clone)]
pub struct PostgresAccountDirectory {
    pool: PgPool,
}

impl PostgresAccountDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_user_roles(&self, user_id: i64) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT roles.id, roles.name
            FROM user_roles
            INNER JOIN roles ON roles.id = user_roles.role_id
            WHERE user_roles.user_id = $1
            ORDER BY user_roles.position, roles.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list user roles: {error}")))?;

        Ok(rows.into_iter().map(Role::from).collect())
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: i64,
    name: String,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role::new(row.id, row.name)
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    login_count: i32,
    last_login: Option<DateTime<Utc>>,
}

impl UserRow {
    fn into_account(self, roles: Vec<Role>) -> UserAccount {
        UserAccount {
            id: self.id,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            roles,
            login_count: self.login_count,
            last_login: self.last_login,
        }
    }
}

#[async_trait]
impl AccountDirectory for PostgresAccountDirectory {
    async fn find_role(&self, name: &str) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM roles
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role '{name}': {error}")))?;

        Ok(row.map(Role::from))
    }

    async fn add_role(&self, name: &str) -> AppResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            INSERT INTO roles (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to add role '{name}': {error}")))?;

        Ok(Role::from(row))
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, first_name, last_name, email, login_count, last_login
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by email: {error}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let roles = self.list_user_roles(row.id).await?;
        Ok(Some(row.into_account(roles)))
    }

    async fn add_user(&self, input: NewUserAccount) -> AppResult<UserAccount> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, first_name, last_name, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, first_name, last_name, email, login_count, last_login
            "#,
        )
        .bind(input.username.as_str())
        .bind(input.first_name.as_str())
        .bind(input.last_name.as_str())
        .bind(input.email.as_str())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!(
                    "user '{}' already exists",
                    input.username
                ));
            }

            AppError::Internal(format!("failed to add user: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id, position)
            VALUES ($1, $2, 0)
            "#,
        )
        .bind(row.id)
        .bind(input.role.id())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to assign initial role: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(row.into_account(vec![input.role]))
    }

    async fn save_user_roles(&self, user_id: i64, roles: &[Role]) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        sqlx::query(
            r#"
            DELETE FROM user_roles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear user roles: {error}")))?;

        for (position, role) in roles.iter().enumerate() {
            let position = i32::try_from(position).map_err(|error| {
                AppError::Internal(format!("role position out of range: {error}"))
            })?;

            sqlx::query(
                r#"
                INSERT INTO user_roles (user_id, role_id, position)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, role_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(role.id())
            .bind(position)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to save role '{}': {error}", role.name()))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn record_login(&self, user_id: i64) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET login_count = login_count + 1,
                last_login = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to record login: {error}")))?;

        Ok(())
    }
}
