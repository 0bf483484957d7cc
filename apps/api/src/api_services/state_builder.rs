use std::sync::Arc;

use atlasgate_application::{
    AccountDirectory, AuthorizationService, SsoLoginService, SystemRoleService,
};
use atlasgate_core::AppError;
use atlasgate_domain::{BASELINE_ROLE_NAME, ELEVATED_ROLE_NAME};
use atlasgate_infrastructure::{
    OidcIdentityProvider, PostgresAccountDirectory, PostgresAuditRepository,
    PostgresSystemRoleRepository,
};
use sqlx::PgPool;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub async fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let account_directory = Arc::new(PostgresAccountDirectory::new(pool.clone()));
    ensure_builtin_roles(account_directory.as_ref()).await?;

    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));
    let identity_provider = Arc::new(OidcIdentityProvider::new(config.oidc.clone())?);
    let authorization_service = AuthorizationService::new(account_directory.clone());

    Ok(AppState {
        sso_login_service: SsoLoginService::new(
            identity_provider,
            account_directory,
            audit_repository.clone(),
        ),
        system_role_service: SystemRoleService::new(
            authorization_service.clone(),
            Arc::new(PostgresSystemRoleRepository::new(pool)),
            audit_repository,
        ),
        authorization_service,
        app_url: config.app_url.clone(),
    })
}

/// Creates the two privilege roles when they are missing.
pub async fn ensure_builtin_roles(account_directory: &dyn AccountDirectory) -> Result<(), AppError> {
    for name in [BASELINE_ROLE_NAME, ELEVATED_ROLE_NAME] {
        let role = account_directory.add_role(name).await?;
        info!(role = role.name(), role_id = role.id(), "built-in role ready");
    }

    Ok(())
}
