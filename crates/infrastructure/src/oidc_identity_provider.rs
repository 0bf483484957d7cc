//! OpenID Connect adapter for the identity provider port.

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use atlasgate_application::{AuthorizationRequest, IdentityProvider};
use atlasgate_core::{AppError, AppResult};

/// Client registration with the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcSettings {
    /// Location of the provider's discovery document.
    pub discovery_uri: String,
    /// Registered client identifier.
    pub client_id: String,
    /// Registered client secret.
    pub client_secret: String,
    /// Callback URI registered for this application.
    pub redirect_uri: String,
    /// Scopes requested on every authorization.
    pub scopes: Vec<String>,
}

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[derive(Debug, Clone, Deserialize)]
struct DiscoveryDocument {
    authorization_endpoint: String,
    token_endpoint: String,
    userinfo_endpoint: String,
    #[serde(default)]
    end_session_endpoint: Option<String>,
}

/// Identity provider adapter resolving endpoints from the discovery document.
///
/// The document is fetched on every call so that provider-side endpoint
/// changes apply without a restart.
#[derive(Clone)]
pub struct OidcIdentityProvider {
    settings: OidcSettings,
    http_client: reqwest::Client,
}

impl OidcIdentityProvider {
    /// Creates a provider adapter with a client that never follows redirects.
    pub fn new(settings: OidcSettings) -> AppResult<Self> {
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build http client: {error}")))?;

        Ok(Self {
            settings,
            http_client,
        })
    }

    async fn discover(&self) -> AppResult<DiscoveryDocument> {
        let response = self
            .http_client
            .get(self.settings.discovery_uri.as_str())
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to fetch discovery document: {error}"))
            })?
            .error_for_status()
            .map_err(|error| {
                AppError::Internal(format!("discovery endpoint returned an error: {error}"))
            })?;

        response.json::<DiscoveryDocument>().await.map_err(|error| {
            AppError::Internal(format!("failed to decode discovery document: {error}"))
        })
    }

    fn build_client(&self, discovery: &DiscoveryDocument) -> AppResult<ConfiguredClient> {
        Ok(
            BasicClient::new(ClientId::new(self.settings.client_id.clone()))
                .set_client_secret(ClientSecret::new(self.settings.client_secret.clone()))
                .set_auth_uri(
                    AuthUrl::new(discovery.authorization_endpoint.clone()).map_err(|error| {
                        AppError::Internal(format!("invalid authorization endpoint: {error}"))
                    })?,
                )
                .set_token_uri(TokenUrl::new(discovery.token_endpoint.clone()).map_err(
                    |error| AppError::Internal(format!("invalid token endpoint: {error}")),
                )?)
                .set_redirect_uri(
                    RedirectUrl::new(self.settings.redirect_uri.clone()).map_err(|error| {
                        AppError::Internal(format!("invalid redirect uri: {error}"))
                    })?,
                ),
        )
    }
}

/// Appends the `ReturnUrl` parameter to the provider's end-session endpoint.
fn end_session_redirect(end_session_endpoint: &str, return_url: &str) -> AppResult<String> {
    let mut url = Url::parse(end_session_endpoint)
        .map_err(|error| AppError::Internal(format!("invalid end-session endpoint: {error}")))?;
    url.query_pairs_mut().append_pair("ReturnUrl", return_url);
    Ok(url.to_string())
}

#[async_trait]
impl IdentityProvider for OidcIdentityProvider {
    async fn authorization_request(&self) -> AppResult<AuthorizationRequest> {
        let discovery = self.discover().await?;
        let client = self.build_client(&discovery)?;

        let (url, state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(
                self.settings
                    .scopes
                    .iter()
                    .map(|scope| Scope::new(scope.clone())),
            )
            .url();

        Ok(AuthorizationRequest {
            url: url.to_string(),
            state: state.secret().clone(),
        })
    }

    async fn fetch_user_info(&self, code: &str) -> AppResult<Value> {
        let discovery = self.discover().await?;
        let client = self.build_client(&discovery)?;

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_owned()))
            .request_async(&self.http_client)
            .await
            .map_err(|error| AppError::Internal(format!("token exchange failed: {error}")))?;

        let response = self
            .http_client
            .get(discovery.userinfo_endpoint.as_str())
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("failed to fetch user info: {error}")))?
            .error_for_status()
            .map_err(|error| {
                AppError::Internal(format!("user-info endpoint returned an error: {error}"))
            })?;

        response
            .json::<Value>()
            .await
            .map_err(|error| AppError::Internal(format!("failed to decode user info: {error}")))
    }

    async fn end_session_url(&self, return_url: &str) -> AppResult<String> {
        let discovery = self.discover().await?;
        let endpoint = discovery.end_session_endpoint.ok_or_else(|| {
            AppError::Internal("discovery document has no end_session_endpoint".to_owned())
        })?;

        end_session_redirect(endpoint.as_str(), return_url)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DiscoveryDocument, end_session_redirect};

    #[test]
    fn end_session_redirect_encodes_return_url() {
        let url = end_session_redirect(
            "https://idp.example/connect/endsession",
            "https://app.example/login/",
        )
        .unwrap_or_default();

        assert_eq!(
            url,
            "https://idp.example/connect/endsession?ReturnUrl=https%3A%2F%2Fapp.example%2Flogin%2F"
        );
    }

    #[test]
    fn end_session_redirect_keeps_existing_query() {
        let url = end_session_redirect("https://idp.example/logout?tenant=a", "https://app/login/")
            .unwrap_or_default();

        assert!(url.starts_with("https://idp.example/logout?tenant=a&ReturnUrl="));
    }

    #[test]
    fn invalid_end_session_endpoint_is_rejected() {
        assert!(end_session_redirect("not a url", "https://app/login/").is_err());
    }

    #[test]
    fn discovery_document_tolerates_missing_end_session_endpoint() {
        let document = serde_json::from_value::<DiscoveryDocument>(json!({
            "issuer": "https://idp.example",
            "authorization_endpoint": "https://idp.example/connect/authorize",
            "token_endpoint": "https://idp.example/connect/token",
            "userinfo_endpoint": "https://idp.example/connect/userinfo"
        }));

        assert!(document.is_ok());
        assert!(
            document
                .ok()
                .and_then(|document| document.end_session_endpoint)
                .is_none()
        );
    }
}
