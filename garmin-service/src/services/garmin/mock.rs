use super::{Credentials, GarminClient, GarminError, LoginOutcome, TokenBlob};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Mock Garmin client for local development and testing
pub struct MockGarminClient {
    mfa_code: Option<String>,
    failure: Option<GarminError>,
    login_count: AtomicU64,
    resume_count: AtomicU64,
    data_count: AtomicU64,
}

impl MockGarminClient {
    pub fn new() -> Self {
        Self {
            mfa_code: None,
            failure: None,
            login_count: AtomicU64::new(0),
            resume_count: AtomicU64::new(0),
            data_count: AtomicU64::new(0),
        }
    }

    /// Every login answers with an MFA challenge that only `code` resolves.
    pub fn requiring_mfa(mut self, code: impl Into<String>) -> Self {
        self.mfa_code = Some(code.into());
        self
    }

    /// Every call fails with `error`.
    pub fn failing_with(mut self, error: GarminError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn login_count(&self) -> u64 {
        self.login_count.load(Ordering::SeqCst)
    }

    pub fn resume_count(&self) -> u64 {
        self.resume_count.load(Ordering::SeqCst)
    }

    pub fn data_count(&self) -> u64 {
        self.data_count.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), GarminError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn issue_tokens(&self, subject: &str) -> Result<TokenBlob, GarminError> {
        TokenBlob::from_oauth_pair(
            &json!({
                "oauth_token": format!("mock-oauth1-{}", subject),
                "oauth_token_secret": "mock-secret",
            }),
            &json!({
                "scope": "ACTIVITY_READ CONNECT_READ WELLNESS_READ",
                "token_type": "Bearer",
                "access_token": format!("mock-access-{}", subject),
                "refresh_token": format!("mock-refresh-{}", subject),
                "expires_at": 4_102_444_800_i64,
            }),
        )
    }

    fn authorize(&self, tokens: &TokenBlob) -> Result<(), GarminError> {
        let access = tokens.oauth2_access()?;
        if !access.access_token.starts_with("mock-access-") {
            return Err(GarminError::Http {
                status: 401,
                body: "Unauthorized".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MockGarminClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GarminClient for MockGarminClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, GarminError> {
        self.login_count.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        tracing::info!("[MOCK] Garmin login");

        if self.mfa_code.is_some() {
            return Ok(LoginOutcome::NeedsMfa {
                client_state: json!({
                    "signin_params": {"service": "https://sso.garmin.com/sso/embed"},
                    "mock_subject": credentials.email,
                }),
            });
        }

        Ok(LoginOutcome::Success {
            tokens: self.issue_tokens(&credentials.email)?,
        })
    }

    async fn resume_login(
        &self,
        client_state: &Value,
        mfa_code: &str,
    ) -> Result<TokenBlob, GarminError> {
        self.resume_count.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let subject = client_state
            .get("mock_subject")
            .and_then(Value::as_str)
            .ok_or_else(|| GarminError::Session("Unknown MFA client state".to_string()))?;

        if self.mfa_code.as_deref().is_some_and(|code| code != mfa_code) {
            return Err(GarminError::Http {
                status: 401,
                body: "Invalid MFA code".to_string(),
            });
        }

        tracing::info!("[MOCK] Garmin MFA resumed");
        self.issue_tokens(subject)
    }

    async fn daily_summary(
        &self,
        tokens: &TokenBlob,
        date: NaiveDate,
    ) -> Result<Value, GarminError> {
        self.data_count.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.authorize(tokens)?;

        Ok(json!({
            "calendarDate": date.to_string(),
            "totalSteps": 8432,
            "totalKilocalories": 2215.0,
            "activeKilocalories": 512.0,
            "totalDistanceMeters": 6420,
            "restingHeartRate": 54,
        }))
    }

    async fn body_composition(
        &self,
        tokens: &TokenBlob,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Value, GarminError> {
        self.data_count.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.authorize(tokens)?;

        let end_date = end_date.unwrap_or(start_date);
        Ok(json!({
            "startDate": start_date.to_string(),
            "endDate": end_date.to_string(),
            "dateWeightList": [{
                "calendarDate": start_date.to_string(),
                "weight": 72500.0,
                "bodyFat": 18.4,
                "muscleMass": 33200,
            }],
            "totalAverage": {"weight": 72500.0, "bodyFat": 18.4},
        }))
    }

    async fn health_check(&self) -> Result<(), GarminError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
