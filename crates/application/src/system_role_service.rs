use std::sync::Arc;

use atlasgate_core::{AppResult, NonEmptyString, UserIdentity};
use atlasgate_domain::AuditAction;

use crate::{
    AddSystemRoleInput, AuditEvent, AuditRepository, AuthorizationService, ProvisionedSystemRole,
    SystemRoleRepository,
};

/// Application service for system-role provisioning.
#[derive(Clone)]
pub struct SystemRoleService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn SystemRoleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl SystemRoleService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn SystemRoleRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            audit_repository,
        }
    }

    /// Provisions a system role with database and dataset access and emits an
    /// audit event.
    pub async fn provision_system_role(
        &self,
        actor: &UserIdentity,
        input: AddSystemRoleInput,
    ) -> AppResult<ProvisionedSystemRole> {
        self.authorization_service.require_elevated(actor).await?;

        NonEmptyString::new(input.role.as_str())?;
        NonEmptyString::new(input.database.as_str())?;
        NonEmptyString::new(input.sqlalchemy_uri.as_str())?;

        let dataset_count = input.datasets.len();
        let provisioned = self.repository.provision_system_role(input).await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.email().to_owned(),
                action: AuditAction::SecuritySystemRoleProvisioned,
                resource_type: "system_role".to_owned(),
                resource_id: provisioned.role.name().to_owned(),
                detail: Some(format!(
                    "granted role '{}' access to database {} and {dataset_count} dataset(s)",
                    provisioned.role.name(),
                    provisioned.database_id
                )),
            })
            .await?;

        Ok(provisioned)
    }
}
