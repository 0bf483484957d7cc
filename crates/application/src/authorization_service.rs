use std::sync::Arc;

use atlasgate_core::{AppError, AppResult, UserIdentity};
use atlasgate_domain::ELEVATED_ROLE_NAME;

use crate::{AccountDirectory, UserAccount};

/// Application service for role-based access checks.
#[derive(Clone)]
pub struct AuthorizationService {
    account_directory: Arc<dyn AccountDirectory>,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(account_directory: Arc<dyn AccountDirectory>) -> Self {
        Self { account_directory }
    }

    /// Requires the actor's current account to hold the elevated role.
    ///
    /// Roles are read from the directory rather than the session so that a
    /// demotion on a later login takes effect immediately.
    pub async fn require_elevated(&self, actor: &UserIdentity) -> AppResult<UserAccount> {
        let account = self
            .account_directory
            .find_user_by_email(actor.email())
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized(format!("account '{}' no longer exists", actor.email()))
            })?;

        if !account.has_role(ELEVATED_ROLE_NAME) {
            return Err(AppError::Forbidden(format!(
                "subject '{}' requires the '{ELEVATED_ROLE_NAME}' role",
                actor.email()
            )));
        }

        Ok(account)
    }
}
