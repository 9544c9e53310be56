//! HTTP handlers for the three protocol operations.
//!
//! Each handler only extracts and validates the body; the protocol rules live
//! in [`crate::services::AuthService`].

use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::auth::{
        RequestCodeRequest, RequestCodeResponse, ValidateSessionRequest,
        ValidateSessionResponse, VerifyCodeRequest, VerifyCodeResponse,
    },
    dtos::ErrorResponse,
    utils::ValidatedJson,
    AppState,
};

/// Email a one-time code and return a proof token bound to it
#[utoipa::path(
    post,
    path = "/auth/request-code",
    request_body = RequestCodeRequest,
    responses(
        (status = 200, description = "Code sent", body = RequestCodeResponse),
        (status = 400, description = "Invalid email or intent", body = ErrorResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse),
        (status = 502, description = "Code email could not be sent", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn request_code(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RequestCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth.request_code(req).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Exchange a proof token and the emailed code for a session token
#[utoipa::path(
    post,
    path = "/auth/verify-code",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Code accepted", body = VerifyCodeResponse),
        (status = 400, description = "Missing fields or malformed code", body = ErrorResponse),
        (status = 401, description = "Invalid or expired code", body = ErrorResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn verify_code(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth.verify_code(req)?;
    Ok((StatusCode::OK, Json(res)))
}

/// Check a session token and return its email
#[utoipa::path(
    post,
    path = "/auth/validate-session",
    request_body = ValidateSessionRequest,
    responses(
        (status = 200, description = "Session is valid", body = ValidateSessionResponse),
        (status = 400, description = "Session token missing", body = ErrorResponse),
        (status = 401, description = "Session is invalid or expired", body = ErrorResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn validate_session(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ValidateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth.validate_session(req)?;
    Ok((StatusCode::OK, Json(res)))
}

/// Fallback for any verb other than POST on the protocol routes.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
