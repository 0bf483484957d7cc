use async_trait::async_trait;
use chrono::{DateTime, Utc};

use atlasgate_core::AppResult;
use atlasgate_domain::Role;

/// Local user account projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// Stable account identifier.
    pub id: i64,
    /// Unique login name. External logins use the asserted email.
    pub username: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Account email, matched case-insensitively.
    pub email: String,
    /// Assigned roles in assignment order.
    pub roles: Vec<Role>,
    /// Number of successful logins.
    pub login_count: i32,
    /// Timestamp of the most recent successful login.
    pub last_login: Option<DateTime<Utc>>,
}

impl UserAccount {
    /// Returns whether the account holds a role with the given name.
    #[must_use]
    pub fn has_role(&self, role_name: &str) -> bool {
        self.roles.iter().any(|role| role.name() == role_name)
    }
}

/// Input payload for creating a local account on first external login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserAccount {
    /// Unique login name.
    pub username: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Account email.
    pub email: String,
    /// Initial role.
    pub role: Role,
}

/// Account directory port standing in for the host security manager.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Finds a role by exact name.
    async fn find_role(&self, name: &str) -> AppResult<Option<Role>>;

    /// Returns the role with the given name, creating it when absent.
    async fn add_role(&self, name: &str) -> AppResult<Role>;

    /// Finds an account by email.
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserAccount>>;

    /// Creates an account holding a single initial role.
    async fn add_user(&self, input: NewUserAccount) -> AppResult<UserAccount>;

    /// Replaces the account's role set.
    async fn save_user_roles(&self, user_id: i64, roles: &[Role]) -> AppResult<()>;

    /// Bumps login statistics after a successful login.
    async fn record_login(&self, user_id: i64) -> AppResult<()>;
}
