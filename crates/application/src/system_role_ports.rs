use async_trait::async_trait;

use atlasgate_core::AppResult;
use atlasgate_domain::{PermissionGrant, Role};

/// Input payload for provisioning a system role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddSystemRoleInput {
    /// Role name, created when absent.
    pub role: String,
    /// Database connection name, created when absent.
    pub database: String,
    /// Connection URI used when the database record is created.
    pub sqlalchemy_uri: String,
    /// Dataset identifiers the role gains access to.
    pub datasets: Vec<i64>,
}

/// Result of a committed provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedSystemRole {
    /// The created or reused role.
    pub role: Role,
    /// Identifier of the created or reused database record.
    pub database_id: i64,
    /// Grants attached by this run, database grant first.
    pub grants: Vec<PermissionGrant>,
}

/// Repository port for system-role provisioning.
#[async_trait]
pub trait SystemRoleRepository: Send + Sync {
    /// Finds or creates the database record, its access grant and the role,
    /// then grants the role access to the database and every dataset.
    ///
    /// All writes happen in one unit; an unknown dataset leaves nothing behind.
    async fn provision_system_role(
        &self,
        input: AddSystemRoleInput,
    ) -> AppResult<ProvisionedSystemRole>;
}
