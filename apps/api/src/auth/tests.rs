use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use atlasgate_core::UserIdentity;
use serde_json::{Value, json};

use crate::test_support::{body_text, build_state, memory_session};

use super::callback::SigninCallbackQuery;
use super::{
    SESSION_OAUTH_STATE_KEY, SESSION_USER_KEY, login_handler, signin_callback_handler,
    signout_handler,
};

fn sysadmin_document() -> Value {
    json!({
        "sub": "8f2c",
        "email": "ana@example.com",
        "name": "Ana",
        "role": "sysadmin",
        "system": ["system-A"],
    })
}

fn callback_query(
    code: &str,
    state: &str,
) -> Result<Query<SigninCallbackQuery>, QueryRejection> {
    Ok(Query(SigninCallbackQuery {
        code: Some(code.to_owned()),
        state: Some(state.to_owned()),
        error: None,
    }))
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

#[tokio::test]
async fn login_stores_state_and_redirects_to_provider() {
    let (state, _repository) = build_state(sysadmin_document()).await;
    let session = memory_session();

    let response = login_handler(State(state), session.clone())
        .await
        .map(IntoResponse::into_response);

    assert!(response.is_ok());
    let response = response.unwrap_or_else(|_| unreachable!());
    assert!(location(&response).starts_with("https://idp.example/connect/authorize"));
    assert_eq!(
        session
            .get::<String>(SESSION_OAUTH_STATE_KEY)
            .await
            .ok()
            .flatten(),
        Some("state-1".to_owned())
    );
}

#[tokio::test]
async fn callback_signs_in_and_redirects_home() {
    let (state, _repository) = build_state(sysadmin_document()).await;
    let session = memory_session();
    let stored = session.insert(SESSION_OAUTH_STATE_KEY, "state-1").await;
    assert!(stored.is_ok());

    let response =
        signin_callback_handler(State(state), session.clone(), callback_query("code-1", "state-1"))
            .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .ok()
        .flatten();
    assert_eq!(
        identity.as_ref().map(UserIdentity::email),
        Some("ana@example.com")
    );
}

#[tokio::test]
async fn callback_without_privilege_renders_forbidden_page_with_name() {
    let (state, _repository) = build_state(json!({
        "sub": "8f2c",
        "email": "ana@example.com",
        "name": "Ana",
    }))
    .await;
    let session = memory_session();
    let stored = session.insert(SESSION_OAUTH_STATE_KEY, "state-1").await;
    assert!(stored.is_ok());

    let response =
        signin_callback_handler(State(state), session.clone(), callback_query("code-1", "state-1"))
            .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_text(response).await.contains("Sorry Ana"));
    assert!(
        session
            .get::<UserIdentity>(SESSION_USER_KEY)
            .await
            .ok()
            .flatten()
            .is_none()
    );
}

#[tokio::test]
async fn callback_with_foreign_state_is_refused() {
    let (state, _repository) = build_state(sysadmin_document()).await;
    let session = memory_session();
    let stored = session.insert(SESSION_OAUTH_STATE_KEY, "state-1").await;
    assert!(stored.is_ok());

    let response =
        signin_callback_handler(State(state), session, callback_query("code-1", "forged")).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn callback_token_failure_is_refused() {
    let (state, _repository) = build_state(sysadmin_document()).await;
    let session = memory_session();
    let stored = session.insert(SESSION_OAUTH_STATE_KEY, "state-1").await;
    assert!(stored.is_ok());

    let response =
        signin_callback_handler(State(state), session, callback_query("bad-code", "state-1"))
            .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_clears_session_and_returns_to_login() {
    let (state, _repository) = build_state(sysadmin_document()).await;
    let session = memory_session();
    let stored = session
        .insert(
            SESSION_USER_KEY,
            UserIdentity::new(1, "8f2c", "Ana", "ana@example.com"),
        )
        .await;
    assert!(stored.is_ok());

    let response = signout_handler(State(state), session.clone())
        .await
        .map(IntoResponse::into_response);

    assert!(response.is_ok());
    let response = response.unwrap_or_else(|_| unreachable!());
    assert_eq!(
        location(&response),
        "https://idp.example/connect/endsession?ReturnUrl=https://atlas.example/login/"
    );
    assert!(
        session
            .get::<UserIdentity>(SESSION_USER_KEY)
            .await
            .ok()
            .flatten()
            .is_none()
    );
}
