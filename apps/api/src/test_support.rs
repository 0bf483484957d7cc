use std::sync::Arc;

use async_trait::async_trait;
use atlasgate_application::{
    AccountDirectory, AuthorizationRequest, AuthorizationService, IdentityProvider,
    NewUserAccount, SsoLoginService, SystemRoleService,
};
use atlasgate_core::{AppError, AppResult, UserIdentity};
use atlasgate_infrastructure::{InMemorySecurityRepository, NoopAuditRepository};
use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;
use tower_sessions::{MemoryStore, Session};

use crate::api_services::ensure_builtin_roles;
use crate::state::AppState;

pub struct FakeIdentityProvider {
    pub document: Value,
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn authorization_request(&self) -> AppResult<AuthorizationRequest> {
        Ok(AuthorizationRequest {
            url: "https://idp.example/connect/authorize?state=state-1".to_owned(),
            state: "state-1".to_owned(),
        })
    }

    async fn fetch_user_info(&self, code: &str) -> AppResult<Value> {
        if code == "bad-code" {
            return Err(AppError::Internal("token exchange failed".to_owned()));
        }
        Ok(self.document.clone())
    }

    async fn end_session_url(&self, return_url: &str) -> AppResult<String> {
        Ok(format!(
            "https://idp.example/connect/endsession?ReturnUrl={return_url}"
        ))
    }
}

pub async fn build_state(document: Value) -> (AppState, Arc<InMemorySecurityRepository>) {
    let repository = Arc::new(InMemorySecurityRepository::new());
    assert!(ensure_builtin_roles(repository.as_ref()).await.is_ok());

    let audit_repository = Arc::new(NoopAuditRepository);
    let authorization_service = AuthorizationService::new(repository.clone());

    let state = AppState {
        sso_login_service: SsoLoginService::new(
            Arc::new(FakeIdentityProvider { document }),
            repository.clone(),
            audit_repository.clone(),
        ),
        system_role_service: SystemRoleService::new(
            authorization_service.clone(),
            repository.clone(),
            audit_repository,
        ),
        authorization_service,
        app_url: "https://atlas.example/".to_owned(),
    };

    (state, repository)
}

/// Creates an account holding the named privilege role and returns its identity.
pub async fn seed_user(
    repository: &InMemorySecurityRepository,
    email: &str,
    role_name: &str,
) -> UserIdentity {
    let role = repository.add_role(role_name).await;
    assert!(role.is_ok());

    let account = repository
        .add_user(NewUserAccount {
            username: email.to_owned(),
            first_name: "Test".to_owned(),
            last_name: "Test".to_owned(),
            email: email.to_owned(),
            role: role.unwrap_or_else(|_| unreachable!()),
        })
        .await;
    assert!(account.is_ok());

    let account = account.unwrap_or_else(|_| unreachable!());
    UserIdentity::new(account.id, "sub-1", "Test", account.email)
}

pub fn memory_session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(body_text(response).await.as_str()).unwrap_or(Value::Null)
}
