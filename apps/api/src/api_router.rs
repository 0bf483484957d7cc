use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;
use crate::{auth, handlers, middleware};

pub fn build_router<S>(app_state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let protected_routes = Router::new()
        .route(
            "/security/add_system_role/",
            post(handlers::security::add_system_role_handler),
        )
        .route(
            "/security/csrf_token/",
            get(handlers::security::csrf_token_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/login/", get(auth::login_handler))
        .route("/signin-oidc", get(auth::signin_callback_handler))
        .route("/signout-callback-oidc", get(auth::signout_handler))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}
