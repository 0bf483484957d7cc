use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use atlasgate_core::AppError;
use serde::Serialize;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorResponse {
            message: self.0.to_string(),
        });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

/// Messages reported for one request field.
///
/// Scalar fields carry a message list. List fields whose elements failed carry
/// the messages keyed by element index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(untagged)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/field-messages.ts"
)]
pub enum FieldMessages {
    /// Messages for the field as a whole.
    Field(Vec<String>),
    /// Messages for list elements, keyed by index.
    Items(BTreeMap<usize, Vec<String>>),
}

impl FieldMessages {
    pub fn single(message: &str) -> Self {
        Self::Field(vec![message.to_owned()])
    }
}

/// Schema violations keyed by field name.
pub type FieldErrors = BTreeMap<String, FieldMessages>;

/// Per-field schema violation payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/schema-error-response.ts"
)]
pub struct SchemaErrorResponse {
    message: FieldErrors,
}

/// Request body rejected by a field schema, rendered as `400` with the
/// messages keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError(pub FieldErrors);

impl IntoResponse for SchemaError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(SchemaErrorResponse { message: self.0 }),
        )
            .into_response()
    }
}
