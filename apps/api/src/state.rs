use atlasgate_application::{AuthorizationService, SsoLoginService, SystemRoleService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sso_login_service: SsoLoginService,
    pub system_role_service: SystemRoleService,
    pub authorization_service: AuthorizationService,
    pub app_url: String,
}

impl AppState {
    /// Returns the login page URL the provider sends users back to after sign-out.
    pub fn login_url(&self) -> String {
        format!("{}/login/", self.app_url.trim_end_matches('/'))
    }
}
