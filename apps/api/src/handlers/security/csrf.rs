use super::*;

pub async fn csrf_token_handler(
    Extension(_user): Extension<UserIdentity>,
    session: Session,
) -> ApiResult<Json<CsrfTokenResponse>> {
    let existing = session
        .get::<String>(SESSION_CSRF_TOKEN_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read csrf token: {error}")))?;

    let token = match existing {
        Some(token) => token,
        None => {
            let token = generate_csrf_token()?;
            session
                .insert(SESSION_CSRF_TOKEN_KEY, &token)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to persist csrf token: {error}"))
                })?;
            token
        }
    };

    Ok(Json(CsrfTokenResponse { result: token }))
}
