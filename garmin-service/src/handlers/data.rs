use axum::extract::{rejection::JsonRejection, Json, State};
use service_core::error::AppError;
use validator::Validate;

use super::{garmin_failure, invalid_body, missing_fields};
use crate::dtos::data::{
    parse_date, parse_date_range, MISSING_BODY_COMPOSITION_FIELDS, MISSING_DAILY_SUMMARY_FIELDS,
};
use crate::dtos::{
    BodyCompositionRequest, BodyCompositionResponse, DailySummaryRequest, DailySummaryResponse,
};
use crate::services::{record_garmin_call, Operation, TokenBlob};
use crate::startup::AppState;

/// POST /data/daily_summary
///
/// Steps, calories and similar totals for one calendar day.
pub async fn get_daily_summary(
    State(state): State<AppState>,
    payload: Result<Json<DailySummaryRequest>, JsonRejection>,
) -> Result<Json<DailySummaryResponse>, AppError> {
    let Json(req) = payload.map_err(invalid_body)?;
    req.validate()
        .map_err(|_| missing_fields(MISSING_DAILY_SUMMARY_FIELDS))?;

    let user_id = req.user_id.unwrap_or_default();
    let tokens = TokenBlob::new(req.tokens.unwrap_or_default());
    let date = req.date.unwrap_or_default();
    let calendar_date = parse_date("date", &date)?;

    tracing::debug!(tokens = %tokens.masked(), date = %date, "Fetching daily summary");

    let data = state
        .garmin
        .daily_summary(&tokens, calendar_date)
        .await
        .map_err(|e| garmin_failure(Operation::DailySummary, &user_id, e))?;

    record_garmin_call(Operation::DailySummary.as_str(), "success");
    tracing::info!(
        user_id = %user_id,
        "Successfully retrieved daily summary for user {} on {}.",
        user_id,
        date
    );

    Ok(Json(DailySummaryResponse {
        user_id,
        date,
        data,
    }))
}

/// POST /data/body_composition
///
/// Weight and body composition for `start_date`, or for the inclusive range
/// up to `end_date`.
pub async fn get_body_composition(
    State(state): State<AppState>,
    payload: Result<Json<BodyCompositionRequest>, JsonRejection>,
) -> Result<Json<BodyCompositionResponse>, AppError> {
    let Json(req) = payload.map_err(invalid_body)?;
    req.validate()
        .map_err(|_| missing_fields(MISSING_BODY_COMPOSITION_FIELDS))?;

    let user_id = req.user_id.unwrap_or_default();
    let tokens = TokenBlob::new(req.tokens.unwrap_or_default());
    let start_date = req.start_date.unwrap_or_default();
    let end_date = req.end_date;
    let range_end = end_date.as_deref().filter(|d| !d.is_empty());
    let (start, end) = parse_date_range(&start_date, range_end)?;

    tracing::debug!(
        start_date = %start_date,
        end_date = ?end_date,
        "Fetching body composition"
    );

    let data = state
        .garmin
        .body_composition(&tokens, start, end)
        .await
        .map_err(|e| garmin_failure(Operation::BodyComposition, &user_id, e))?;

    record_garmin_call(Operation::BodyComposition.as_str(), "success");
    tracing::info!(
        user_id = %user_id,
        "Successfully retrieved body composition for user {} from {} to {}.",
        user_id,
        start_date,
        range_end.unwrap_or(&start_date)
    );

    Ok(Json(BodyCompositionResponse {
        user_id,
        start_date,
        end_date,
        data,
    }))
}
