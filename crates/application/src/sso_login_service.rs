use std::sync::Arc;

use atlasgate_core::{AppError, AppResult, UserIdentity};
use atlasgate_domain::{
    AuditAction, BASELINE_ROLE_NAME, ELEVATED_ROLE_NAME, IdentityClaims, RoleCatalog,
    reconcile_roles,
};

use crate::{
    AccountDirectory, AuditEvent, AuditRepository, AuthorizationRequest, IdentityProvider,
    NewUserAccount, UserAccount,
};

/// Parameters of the provider redirect back to the application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginCallback {
    /// Authorization code from the query string.
    pub code: Option<String>,
    /// `state` echoed by the provider.
    pub state: Option<String>,
    /// `state` stored in the session when the login began.
    pub expected_state: Option<String>,
    /// `error` parameter set by the provider on a denied authorization.
    pub provider_error: Option<String>,
}

/// Successful login result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Identity to persist in the session.
    pub identity: UserIdentity,
    /// Whether the local account was created by this login.
    pub created_account: bool,
    /// Failure to record the success audit event. The login still stands
    /// because the account changes are already persisted.
    pub audit_error: Option<String>,
}

/// Reasons an external login is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginFailure {
    /// The provider or its claims did not authorize access.
    #[error("login refused: {reason}")]
    Unauthorized {
        /// Claimed display name, when the claims were readable.
        username: Option<String>,
        /// Refusal reason for logs.
        reason: String,
    },
    /// The provider or the account directory failed.
    #[error("upstream failure: {0}")]
    UpstreamError(String),
    /// The user-info document could not be interpreted.
    #[error("malformed claims: {0}")]
    ClaimsMalformed(String),
}

impl LoginFailure {
    /// Returns the claimed display name to show on the refusal page.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { username, .. } => username.as_deref(),
            Self::UpstreamError(_) | Self::ClaimsMalformed(_) => None,
        }
    }

    /// Returns a stable label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::UpstreamError(_) => "upstream_error",
            Self::ClaimsMalformed(_) => "claims_malformed",
        }
    }

    fn unauthorized(username: Option<&str>, reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            username: username.map(ToOwned::to_owned),
            reason: reason.into(),
        }
    }
}

impl From<AppError> for LoginFailure {
    fn from(error: AppError) -> Self {
        Self::UpstreamError(error.to_string())
    }
}

/// Application service mapping external identities onto local accounts.
#[derive(Clone)]
pub struct SsoLoginService {
    identity_provider: Arc<dyn IdentityProvider>,
    account_directory: Arc<dyn AccountDirectory>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl SsoLoginService {
    /// Creates a new login service from required dependencies.
    #[must_use]
    pub fn new(
        identity_provider: Arc<dyn IdentityProvider>,
        account_directory: Arc<dyn AccountDirectory>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            identity_provider,
            account_directory,
            audit_repository,
        }
    }

    /// Starts an authorization-code login.
    pub async fn begin_login(&self) -> AppResult<AuthorizationRequest> {
        self.identity_provider.authorization_request().await
    }

    /// Completes a login from the provider callback.
    ///
    /// On success the account exists, holds exactly one privilege role and
    /// only the asserted system roles that resolved.
    pub async fn complete_login(
        &self,
        callback: LoginCallback,
    ) -> Result<LoginOutcome, LoginFailure> {
        match self.authenticate(callback).await {
            Ok((mut outcome, claims)) => {
                let audited = self
                    .audit_repository
                    .append_event(AuditEvent {
                        subject: outcome.identity.email().to_owned(),
                        action: AuditAction::AuthLoginSucceeded,
                        resource_type: "user".to_owned(),
                        resource_id: outcome.identity.user_id().to_string(),
                        detail: Some(format!(
                            "subject '{}' signed in{}",
                            claims.subject(),
                            if outcome.created_account {
                                " with a new account"
                            } else {
                                ""
                            }
                        )),
                    })
                    .await;
                outcome.audit_error = audited.err().map(|error| error.to_string());
                Ok(outcome)
            }
            Err(failure) => {
                // The refusal stands even if the audit write fails.
                let _ = self
                    .audit_repository
                    .append_event(AuditEvent {
                        subject: failure.username().unwrap_or("anonymous").to_owned(),
                        action: AuditAction::AuthLoginRejected,
                        resource_type: "user".to_owned(),
                        resource_id: failure.kind().to_owned(),
                        detail: Some(failure.to_string()),
                    })
                    .await;
                Err(failure)
            }
        }
    }

    /// Builds the provider end-session redirect and records the logout.
    pub async fn logout(&self, actor: Option<&UserIdentity>, return_url: &str) -> AppResult<String> {
        let end_session_url = self.identity_provider.end_session_url(return_url).await?;

        if let Some(actor) = actor {
            self.audit_repository
                .append_event(AuditEvent {
                    subject: actor.email().to_owned(),
                    action: AuditAction::AuthLogout,
                    resource_type: "user".to_owned(),
                    resource_id: actor.user_id().to_string(),
                    detail: None,
                })
                .await?;
        }

        Ok(end_session_url)
    }

    async fn authenticate(
        &self,
        callback: LoginCallback,
    ) -> Result<(LoginOutcome, IdentityClaims), LoginFailure> {
        if let Some(error) = callback.provider_error {
            return Err(LoginFailure::unauthorized(
                None,
                format!("identity provider returned '{error}'"),
            ));
        }

        let Some(code) = callback.code.filter(|code| !code.is_empty()) else {
            return Err(LoginFailure::unauthorized(
                None,
                "callback is missing the authorization code",
            ));
        };

        match (callback.state.as_deref(), callback.expected_state.as_deref()) {
            (Some(state), Some(expected)) if state == expected => {}
            _ => {
                return Err(LoginFailure::unauthorized(
                    None,
                    "callback state does not match the login request",
                ));
            }
        }

        let document = self
            .identity_provider
            .fetch_user_info(code.as_str())
            .await
            .map_err(|error| LoginFailure::UpstreamError(error.to_string()))?;

        let claims = IdentityClaims::from_document(document)
            .map_err(|error| LoginFailure::ClaimsMalformed(error.to_string()))?;

        let Some(level) = claims.privilege_level() else {
            return Err(LoginFailure::unauthorized(
                Some(claims.name()),
                format!("'{}' asserted no recognized privilege level", claims.email()),
            ));
        };

        let (account, created_account) = match self
            .account_directory
            .find_user_by_email(claims.email())
            .await?
        {
            Some(account) => (account, false),
            None => {
                let role = self.account_directory.add_role(level.role_name()).await?;
                let account = self
                    .account_directory
                    .add_user(NewUserAccount {
                        username: claims.email().to_owned(),
                        first_name: claims.name().to_owned(),
                        last_name: claims.name().to_owned(),
                        email: claims.email().to_owned(),
                        role,
                    })
                    .await?;
                (account, true)
            }
        };

        self.reconcile_account_roles(&account, &claims).await?;
        self.account_directory.record_login(account.id).await?;

        let identity = UserIdentity::new(
            account.id,
            claims.subject(),
            claims.name(),
            account.email.as_str(),
        );

        Ok((
            LoginOutcome {
                identity,
                created_account,
                audit_error: None,
            },
            claims,
        ))
    }

    async fn reconcile_account_roles(
        &self,
        account: &UserAccount,
        claims: &IdentityClaims,
    ) -> AppResult<()> {
        let baseline = self.account_directory.add_role(BASELINE_ROLE_NAME).await?;
        let elevated = self.account_directory.add_role(ELEVATED_ROLE_NAME).await?;

        let mut systems = Vec::new();
        for name in claims.systems().as_slice() {
            if let Some(role) = self.account_directory.find_role(name).await? {
                systems.push(role);
            }
        }

        let catalog = RoleCatalog::new(baseline, elevated, systems);
        let mut roles = account.roles.clone();
        reconcile_roles(
            &mut roles,
            claims.systems().as_slice(),
            claims.privileges().as_slice(),
            &catalog,
        );

        if roles != account.roles {
            self.account_directory
                .save_user_roles(account.id, &roles)
                .await?;
        }

        Ok(())
    }
}
