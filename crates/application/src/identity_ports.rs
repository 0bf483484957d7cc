use async_trait::async_trait;
use serde_json::Value;

use atlasgate_core::AppResult;

/// Redirect target and anti-forgery state of an authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Authorization endpoint URL carrying client id, redirect URI and scopes.
    pub url: String,
    /// Opaque `state` value the callback must echo back.
    pub state: String,
}

/// Port for the external OpenID Connect provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Builds the redirect to the provider's authorization endpoint.
    async fn authorization_request(&self) -> AppResult<AuthorizationRequest>;

    /// Exchanges an authorization code and returns the raw user-info document.
    async fn fetch_user_info(&self, code: &str) -> AppResult<Value>;

    /// Builds the provider end-session redirect returning to `return_url`.
    async fn end_session_url(&self, return_url: &str) -> AppResult<String>;
}
