use axum::extract::State;
use axum::response::Redirect;
use atlasgate_core::{AppError, UserIdentity};
use tower_sessions::Session;
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

use super::SESSION_USER_KEY;

/// Clears the local session and hands off to the provider's sign-out page.
pub async fn signout_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Redirect> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?;

    session
        .flush()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    let end_session_url = state
        .sso_login_service
        .logout(identity.as_ref(), state.login_url().as_str())
        .await?;

    info!(
        user_id = identity.as_ref().map(UserIdentity::user_id),
        "session closed"
    );
    Ok(Redirect::to(end_session_url.as_str()))
}
