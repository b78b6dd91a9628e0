pub mod auth;
pub mod data;
pub mod health;
pub mod metrics;

use axum::extract::rejection::JsonRejection;
use service_core::error::AppError;

use crate::services::{record_garmin_call, GarminError, Operation};

pub use auth::{garmin_login, garmin_resume_login};
pub use data::{get_body_composition, get_daily_summary};
pub use health::{health_check, readiness_check, read_root};

/// A body that is not JSON of the expected shape is a client error.
pub(crate) fn invalid_body(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(anyhow::anyhow!(
        "Invalid request body: {}",
        rejection.body_text()
    ))
}

pub(crate) fn missing_fields(message: &'static str) -> AppError {
    AppError::BadRequest(anyhow::anyhow!(message))
}

/// Map a session library failure to the 500 response for `operation`.
pub(crate) fn garmin_failure(operation: Operation, user_id: &str, err: GarminError) -> AppError {
    record_garmin_call(operation.as_str(), "error");
    tracing::error!(
        user_id = %user_id,
        operation = %operation,
        error = %err,
        "Garmin {} failed",
        operation
    );
    AppError::UpstreamError(operation.describe(&err))
}
