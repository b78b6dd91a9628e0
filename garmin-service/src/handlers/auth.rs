//! Login and MFA resumption.
//!
//! Credentials go to the session library for a single call and are never
//! kept; the returned token blob is handed straight back to the caller.

use axum::extract::{rejection::JsonRejection, Json, State};
use service_core::error::AppError;
use validator::Validate;

use super::{garmin_failure, invalid_body, missing_fields};
use crate::dtos::auth::{MISSING_LOGIN_FIELDS, MISSING_RESUME_FIELDS};
use crate::dtos::{LoginRequest, LoginResponse, ResumeLoginRequest};
use crate::services::{record_garmin_call, Credentials, LoginOutcome, Operation};
use crate::startup::AppState;

/// POST /auth/garmin/login
///
/// Returns the token blob, or an MFA challenge whose `client_state` must be
/// sent to `/auth/garmin/resume_login`.
pub async fn garmin_login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(req) = payload.map_err(invalid_body)?;
    req.validate()
        .map_err(|_| missing_fields(MISSING_LOGIN_FIELDS))?;

    let user_id = req.user_id.unwrap_or_default();
    let credentials = Credentials {
        email: req.email.unwrap_or_default(),
        password: req.password.unwrap_or_default(),
    };

    let outcome = state
        .garmin
        .login(&credentials)
        .await
        .map_err(|e| garmin_failure(Operation::Login, &user_id, e))?;

    match outcome {
        LoginOutcome::NeedsMfa { client_state } => {
            record_garmin_call(Operation::Login.as_str(), "needs_mfa");
            tracing::info!(user_id = %user_id, "MFA required for user {}.", user_id);
            Ok(Json(LoginResponse::NeedsMfa { client_state }))
        }
        LoginOutcome::Success { tokens } => {
            record_garmin_call(Operation::Login.as_str(), "success");
            tracing::info!(
                user_id = %user_id,
                "Successfully obtained Garmin tokens for user {}.",
                user_id
            );
            tracing::debug!(tokens = %tokens.masked(), "Garmin tokens (masked)");
            Ok(Json(LoginResponse::Success { tokens }))
        }
    }
}

/// POST /auth/garmin/resume_login
pub async fn garmin_resume_login(
    State(state): State<AppState>,
    payload: Result<Json<ResumeLoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(req) = payload.map_err(invalid_body)?;
    if req.validate().is_err() || req.has_blank_client_state() {
        return Err(missing_fields(MISSING_RESUME_FIELDS));
    }

    let user_id = req.user_id.unwrap_or_default();
    let client_state = req.client_state.unwrap_or_default();
    let mfa_code = req.mfa_code.unwrap_or_default();

    let tokens = state
        .garmin
        .resume_login(&client_state, &mfa_code)
        .await
        .map_err(|e| garmin_failure(Operation::ResumeLogin, &user_id, e))?;

    record_garmin_call(Operation::ResumeLogin.as_str(), "success");
    tracing::info!(
        user_id = %user_id,
        "Successfully resumed Garmin login for user {}.",
        user_id
    );
    tracing::debug!(tokens = %tokens.masked(), "Garmin tokens (masked)");

    Ok(Json(LoginResponse::Success { tokens }))
}
