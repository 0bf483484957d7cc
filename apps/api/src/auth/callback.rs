use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use atlasgate_application::LoginCallback;
use atlasgate_core::{AppError, UserIdentity};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::state::AppState;

use super::forbidden_page::forbidden_response;
use super::{SESSION_OAUTH_STATE_KEY, SESSION_USER_KEY};

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct SigninCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Completes the provider login; every failure renders the forbidden page.
pub async fn signin_callback_handler(
    State(state): State<AppState>,
    session: Session,
    query: Result<Query<SigninCallbackQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            warn!(kind = "claims_malformed", error = %rejection, "unreadable login callback query");
            return forbidden_response(None);
        }
    };

    let expected_state = match session.remove::<String>(SESSION_OAUTH_STATE_KEY).await {
        Ok(value) => value,
        Err(error) => {
            warn!(error = %error, "failed to read login state from session");
            None
        }
    };

    let callback = LoginCallback {
        code: query.code,
        state: query.state,
        expected_state,
        provider_error: query.error,
    };

    let outcome = match state.sso_login_service.complete_login(callback).await {
        Ok(outcome) => outcome,
        Err(failure) => {
            warn!(kind = failure.kind(), error = %failure, "external login refused");
            return forbidden_response(failure.username());
        }
    };

    if let Err(error) = establish_session(&session, &outcome.identity).await {
        warn!(kind = "upstream_error", error = %error, "failed to establish session");
        return forbidden_response(None);
    }

    if let Some(error) = outcome.audit_error.as_deref() {
        warn!(error, "failed to record login audit event");
    }

    info!(
        user_id = outcome.identity.user_id(),
        created_account = outcome.created_account,
        "external login succeeded"
    );
    Redirect::to("/").into_response()
}

async fn establish_session(session: &Session, identity: &UserIdentity) -> Result<(), AppError> {
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to rotate session id: {error}")))?;
    session
        .insert(SESSION_USER_KEY, identity)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist session identity: {error}")))
}
