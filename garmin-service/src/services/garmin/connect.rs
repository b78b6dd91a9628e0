use super::{
    Credentials, GarminClient, GarminError, LoginOutcome, OAuth2Access, TokenBlob, LOGIN_SCOPES,
};
use crate::config::GarminConfig;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::observability::{TracedClientExt, TracedRequest};
use std::time::Duration;

/// User agent of the mobile app whose API the session library speaks.
const USER_AGENT: &str = "GCM-iOS-5.7.2.1";
const SOCIAL_PROFILE_PATH: &str = "/userprofile-service/socialProfile";
const DAILY_SUMMARY_PATH: &str = "/usersummary-service/usersummary/daily";
const BODY_COMPOSITION_PATH: &str = "/weight-service/weight/dateRange";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Production `GarminClient`.
///
/// Data reads go straight to the Connect API with the OAuth2 bearer token
/// carried in the caller's blob. SSO login, MFA resumption and OAuth2 refresh
/// belong to the session library, reached over HTTP at `auth_bridge_url`.
pub struct ConnectClient {
    config: GarminConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct BridgeLoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    scopes: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct BridgeResumeRequest<'a> {
    client_state: &'a Value,
    mfa_code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum BridgeLoginResponse {
    NeedsMfa { client_state: Value },
    Success { tokens: TokenBlob },
}

#[derive(Debug, Serialize)]
struct BridgeRefreshRequest<'a> {
    tokens: &'a TokenBlob,
}

#[derive(Debug, Deserialize)]
struct BridgeTokensResponse {
    tokens: TokenBlob,
}

impl ConnectClient {
    pub fn new(config: GarminConfig) -> Result<Self, GarminError> {
        Url::parse(&config.connect_api_url).map_err(|e| {
            GarminError::Session(format!(
                "Invalid Connect API URL '{}': {}",
                config.connect_api_url, e
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.connect_api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn bridge_url(&self, path: &str) -> Result<String, GarminError> {
        let base = self.config.auth_bridge_url.as_deref().ok_or_else(|| {
            GarminError::Session("No Garmin auth bridge is configured".to_string())
        })?;
        Ok(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }

    /// OAuth2 access for a data call. An expired token is exchanged by the
    /// session library for a fresh one; the caller's blob is left as is.
    async fn fresh_access(&self, tokens: &TokenBlob) -> Result<OAuth2Access, GarminError> {
        let access = tokens.oauth2_access()?;
        if !access.is_expired_at(Utc::now().timestamp()) {
            return Ok(access);
        }

        if self.config.auth_bridge_url.is_none() {
            return Err(GarminError::Session(
                "OAuth2 token expired and no Garmin auth bridge is configured to refresh it"
                    .to_string(),
            ));
        }

        tracing::debug!(tokens = %tokens.masked(), "OAuth2 token expired, refreshing");
        let body = self
            .bridge_post("/refresh", &BridgeRefreshRequest { tokens })
            .await?;
        let response: BridgeTokensResponse = serde_json::from_value(body).map_err(|e| {
            GarminError::Unexpected(format!("Unrecognised refresh response: {}", e))
        })?;

        let refreshed = response.tokens.oauth2_access()?;
        if refreshed.is_expired_at(Utc::now().timestamp()) {
            return Err(GarminError::Session(
                "Refreshed OAuth2 token is already expired".to_string(),
            ));
        }
        Ok(refreshed)
    }

    /// Authenticated GET against the Connect API.
    async fn connect_get(
        &self,
        access: &OAuth2Access,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, GarminError> {
        let url = self.api_url(path);
        tracing::debug!(url = %url, "Calling Garmin Connect API");

        let request = self
            .client
            .traced_get(&url)
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&access.access_token)
            .query(query);

        read_json(request).await
    }

    async fn bridge_post<T: Serialize>(&self, path: &str, body: &T) -> Result<Value, GarminError> {
        let url = self.bridge_url(path)?;
        tracing::debug!(url = %url, "Calling Garmin auth bridge");

        read_json(self.client.traced_post(&url).json(body)).await
    }

    async fn profile_id(&self, access: &OAuth2Access) -> Result<String, GarminError> {
        let profile = self.connect_get(access, SOCIAL_PROFILE_PATH, &[]).await?;

        match profile.get("id") {
            Some(Value::Number(id)) => Ok(id.to_string()),
            Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
            _ => Err(GarminError::Session(
                "User profile has no numeric id".to_string(),
            )),
        }
    }
}

/// Send `request` and decode a JSON body; non-success statuses become
/// `GarminError::Http`, an empty 204 becomes `null`.
async fn read_json(request: TracedRequest) -> Result<Value, GarminError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GarminError::Http {
            status: status.as_u16(),
            body,
        });
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }

    response
        .json()
        .await
        .map_err(|e| GarminError::Unexpected(format!("Failed to parse Garmin response: {}", e)))
}

#[async_trait]
impl GarminClient for ConnectClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, GarminError> {
        let body = self
            .bridge_post(
                "/login",
                &BridgeLoginRequest {
                    email: &credentials.email,
                    password: &credentials.password,
                    scopes: &LOGIN_SCOPES,
                },
            )
            .await?;

        let outcome: BridgeLoginResponse = serde_json::from_value(body).map_err(|e| {
            GarminError::Unexpected(format!("Unrecognised login response: {}", e))
        })?;

        Ok(match outcome {
            BridgeLoginResponse::NeedsMfa { client_state } => LoginOutcome::NeedsMfa { client_state },
            BridgeLoginResponse::Success { tokens } => LoginOutcome::Success { tokens },
        })
    }

    async fn resume_login(
        &self,
        client_state: &Value,
        mfa_code: &str,
    ) -> Result<TokenBlob, GarminError> {
        let body = self
            .bridge_post(
                "/resume_login",
                &BridgeResumeRequest {
                    client_state,
                    mfa_code,
                },
            )
            .await?;

        let response: BridgeTokensResponse = serde_json::from_value(body).map_err(|e| {
            GarminError::Unexpected(format!("Unrecognised MFA response: {}", e))
        })?;

        Ok(response.tokens)
    }

    async fn daily_summary(
        &self,
        tokens: &TokenBlob,
        date: NaiveDate,
    ) -> Result<Value, GarminError> {
        let access = self.fresh_access(tokens).await?;
        let profile_id = self.profile_id(&access).await?;
        let path = format!("{}/{}", DAILY_SUMMARY_PATH, profile_id);

        self.connect_get(
            &access,
            &path,
            &[("calendarDate", date.format(DATE_FORMAT).to_string())],
        )
        .await
    }

    async fn body_composition(
        &self,
        tokens: &TokenBlob,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Value, GarminError> {
        let access = self.fresh_access(tokens).await?;
        let end_date = end_date.unwrap_or(start_date);

        self.connect_get(
            &access,
            BODY_COMPOSITION_PATH,
            &[
                ("startDate", start_date.format(DATE_FORMAT).to_string()),
                ("endDate", end_date.format(DATE_FORMAT).to_string()),
            ],
        )
        .await
    }

    async fn health_check(&self) -> Result<(), GarminError> {
        // No dedicated vendor health endpoint; login needs the bridge.
        if self.config.auth_bridge_url.is_none() {
            return Err(GarminError::Session(
                "No Garmin auth bridge is configured".to_string(),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "garmin-connect"
    }
}
