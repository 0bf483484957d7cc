use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use atlasgate_core::AppError;
use atlasgate_infrastructure::OidcSettings;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_SCOPES: &str = "openid profile email";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub app_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub oidc: OidcSettings,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:8088".to_owned());
        Url::parse(app_url.as_str())
            .map_err(|error| AppError::Validation(format!("invalid APP_URL: {error}")))?;

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8088);
        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let oidc = if migrate_only {
            OidcSettings {
                discovery_uri: String::new(),
                client_id: String::new(),
                client_secret: String::new(),
                redirect_uri: String::new(),
                scopes: Vec::new(),
            }
        } else {
            OidcSettings {
                discovery_uri: required_non_empty_env("ATLAS_DISCOVERY_URI")?,
                client_id: required_non_empty_env("ATLAS_CLIENT_ID")?,
                client_secret: required_non_empty_env("ATLAS_CLIENT_SECRET")?,
                redirect_uri: required_non_empty_env("ATLAS_REDIRECT_URI")?,
                scopes: parse_scopes(
                    env::var("ATLAS_SCOPES")
                        .unwrap_or_else(|_| DEFAULT_SCOPES.to_owned())
                        .as_str(),
                ),
            }
        };

        Ok(Self {
            migrate_only,
            database_url,
            app_url,
            api_host,
            api_port,
            cookie_secure,
            oidc,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

/// Splits a scope list on whitespace or commas, falling back to the default
/// scopes when nothing remains.
fn parse_scopes(value: &str) -> Vec<String> {
    let scopes: Vec<String> = value
        .split(|character: char| character.is_whitespace() || character == ',')
        .filter(|scope| !scope.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    if scopes.is_empty() {
        return DEFAULT_SCOPES
            .split_whitespace()
            .map(ToOwned::to_owned)
            .collect();
    }

    scopes
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::parse_scopes;

    #[test]
    fn scopes_accept_spaces_and_commas() {
        assert_eq!(
            parse_scopes("openid, profile  email,system"),
            vec!["openid", "profile", "email", "system"]
        );
    }

    #[test]
    fn blank_scopes_fall_back_to_defaults() {
        assert_eq!(parse_scopes(" , "), vec!["openid", "profile", "email"]);
    }
}
