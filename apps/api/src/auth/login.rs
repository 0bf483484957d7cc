use axum::extract::State;
use axum::response::Redirect;
use atlasgate_core::{AppError, UserIdentity};
use tower_sessions::Session;
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_OAUTH_STATE_KEY, SESSION_USER_KEY};

/// Redirects to the identity provider, or home when already signed in.
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Redirect> {
    let signed_in = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .is_some();
    if signed_in {
        return Ok(Redirect::to("/"));
    }

    let request = state.sso_login_service.begin_login().await?;

    session
        .insert(SESSION_OAUTH_STATE_KEY, &request.state)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist login state: {error}")))?;

    info!("redirecting to identity provider");
    Ok(Redirect::to(request.url.as_str()))
}
