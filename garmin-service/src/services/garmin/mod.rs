//! Seam to the Garmin session library.
//!
//! Handlers only ever talk to a `GarminClient`. `ConnectClient` is the
//! production implementation; `MockGarminClient` backs local development and
//! tests.

pub mod connect;
pub mod mock;
pub mod tokens;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub use connect::ConnectClient;
pub use mock::MockGarminClient;
pub use tokens::{OAuth2Access, TokenBlob};

/// Scopes requested on every login.
pub const LOGIN_SCOPES: [&str; 3] = ["ACTIVITY_READ", "CONNECT_READ", "WELLNESS_READ"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GarminError {
    /// The vendor answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The session library refused the request.
    #[error("{0}")]
    Session(String),

    #[error("{0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for GarminError {
    fn from(err: reqwest::Error) -> Self {
        GarminError::Unexpected(err.to_string())
    }
}

/// The four proxied operations, used for error phrasing, logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    ResumeLogin,
    DailySummary,
    BodyComposition,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Login => "login",
            Operation::ResumeLogin => "resume_login",
            Operation::DailySummary => "daily_summary",
            Operation::BodyComposition => "body_composition",
        }
    }

    /// Message surfaced to callers when `err` aborts this operation.
    pub fn describe(&self, err: &GarminError) -> String {
        match err {
            GarminError::Http { .. } => {
                let prefix = match self {
                    Operation::Login => "Garmin login error",
                    Operation::ResumeLogin => "Garmin MFA error",
                    Operation::DailySummary | Operation::BodyComposition => "Garmin API error",
                };
                format!("{}: {}", prefix, err)
            }
            GarminError::Session(_) => {
                let prefix = match self {
                    Operation::Login => "Failed to login to Garmin",
                    Operation::ResumeLogin => "Failed to complete Garmin MFA",
                    Operation::DailySummary => "Failed to retrieve daily summary",
                    Operation::BodyComposition => "Failed to retrieve body composition",
                };
                format!("{}: {}", prefix, err)
            }
            GarminError::Unexpected(_) => format!("An unexpected error occurred: {}", err),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// The vendor issued an MFA challenge; `client_state` resumes it.
    NeedsMfa { client_state: Value },
    Success { tokens: TokenBlob },
}

#[async_trait]
pub trait GarminClient: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, GarminError>;

    async fn resume_login(
        &self,
        client_state: &Value,
        mfa_code: &str,
    ) -> Result<TokenBlob, GarminError>;

    async fn daily_summary(&self, tokens: &TokenBlob, date: NaiveDate)
        -> Result<Value, GarminError>;

    async fn body_composition(
        &self,
        tokens: &TokenBlob,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Value, GarminError>;

    async fn health_check(&self) -> Result<(), GarminError>;

    fn name(&self) -> &'static str;
}
