use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use atlasgate_application::generate_csrf_token;
use atlasgate_core::{AppError, UserIdentity};
use serde_json::Value;
use tower_sessions::Session;
use tracing::info;

use crate::auth::SESSION_CSRF_TOKEN_KEY;
use crate::dto::{AddSystemRoleRequest, CsrfTokenResponse, MessageResponse};
use crate::error::{ApiError, ApiResult, SchemaError};
use crate::state::AppState;

mod csrf;
mod system_role;

pub use csrf::csrf_token_handler;
pub use system_role::add_system_role_handler;
