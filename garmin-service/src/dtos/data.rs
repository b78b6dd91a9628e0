use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::error::AppError;
use validator::Validate;

pub const MISSING_DAILY_SUMMARY_FIELDS: &str = "Missing user_id, tokens, or date.";
pub const MISSING_BODY_COMPOSITION_FIELDS: &str = "Missing user_id, tokens, or start_date.";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize, Validate)]
pub struct DailySummaryRequest {
    #[validate(required, length(min = 1))]
    pub user_id: Option<String>,

    /// Token blob previously returned by login.
    #[validate(required, length(min = 1))]
    pub tokens: Option<String>,

    /// YYYY-MM-DD
    #[validate(required, length(min = 1))]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BodyCompositionRequest {
    #[validate(required, length(min = 1))]
    pub user_id: Option<String>,

    #[validate(required, length(min = 1))]
    pub tokens: Option<String>,

    #[validate(required, length(min = 1))]
    pub start_date: Option<String>,

    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DailySummaryResponse {
    pub user_id: String,
    pub date: String,
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct BodyCompositionResponse {
    pub user_id: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub data: Value,
}

/// Parse a `YYYY-MM-DD` request field.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        AppError::BadRequest(anyhow::anyhow!(
            "Invalid {}: expected YYYY-MM-DD, got '{}'.",
            field,
            value
        ))
    })
}

/// Validate an optional end date against its start date.
pub fn parse_date_range(
    start: &str,
    end: Option<&str>,
) -> Result<(NaiveDate, Option<NaiveDate>), AppError> {
    let start_date = parse_date("start_date", start)?;
    let end_date = match end {
        Some(end) => Some(parse_date("end_date", end)?),
        None => None,
    };

    if let Some(end_date) = end_date {
        if end_date < start_date {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "end_date must not be before start_date."
            )));
        }
    }

    Ok((start_date, end_date))
}
