use super::*;

pub async fn add_system_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageResponse>, Response> {
    state
        .authorization_service
        .require_elevated(&user)
        .await
        .map_err(|error| ApiError::from(error).into_response())?;

    if !is_json_request(&headers) {
        return Err(bad_request("Request is not JSON"));
    }

    let payload = serde_json::from_slice::<Value>(&body)
        .map_err(|_| bad_request("Failed to decode JSON object"))?;
    let request = AddSystemRoleRequest::from_json(&payload)
        .map_err(|errors| SchemaError(errors).into_response())?;

    let provisioned = state
        .system_role_service
        .provision_system_role(&user, request.into())
        .await
        .map_err(|error| ApiError::from(error).into_response())?;

    info!(
        role = provisioned.role.name(),
        database_id = provisioned.database_id,
        grants = provisioned.grants.len(),
        "system role provisioned"
    );

    Ok(Json(MessageResponse::new("OK")))
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(MessageResponse::new(message))).into_response()
}

/// Accepts `application/json` and any `application/*+json` media type.
fn is_json_request(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    media_type == "application/json"
        || (media_type.starts_with("application/") && media_type.ends_with("+json"))
}
