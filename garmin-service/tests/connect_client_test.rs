//! `ConnectClient` against a local stub of the Connect API and auth bridge.

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use garmin_service::config::GarminConfig;
use garmin_service::services::{
    ConnectClient, Credentials, GarminClient, GarminError, LoginOutcome, TokenBlob,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::net::TcpListener;

const ACCESS_TOKEN: &str = "access-abc";
const STALE_ACCESS_TOKEN: &str = "access-stale";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", ACCESS_TOKEN))
}

async fn social_profile(headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "bad token"})));
    }
    (
        StatusCode::OK,
        Json(json!({"id": 987654, "displayName": "runner-display"})),
    )
}

async fn daily_summary(
    headers: HeaderMap,
    Path(profile_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "profileId": profile_id,
            "calendarDate": query.get("calendarDate"),
            "userAgent": headers.get("user-agent").and_then(|v| v.to_str().ok()),
        })),
    )
}

async fn weight_range(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "startDate": query.get("startDate"),
            "endDate": query.get("endDate"),
            "dateWeightList": [],
        })),
    )
}

async fn bridge_login(Json(body): Json<Value>) -> impl IntoResponse {
    match body["email"].as_str() {
        Some("mfa@example.com") => (
            StatusCode::OK,
            Json(json!({"status": "needs_mfa", "client_state": {"csrf": "x1"}})),
        ),
        Some("locked@example.com") => (
            StatusCode::FORBIDDEN,
            Json(json!({"detail": "account locked"})),
        ),
        _ => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "tokens": stub_tokens(i64::MAX),
                "scopes": body["scopes"],
            })),
        ),
    }
}

async fn bridge_resume(Json(body): Json<Value>) -> impl IntoResponse {
    if body["client_state"]["csrf"] == "x1" && body["mfa_code"] == "123456" {
        (StatusCode::OK, Json(json!({"tokens": stub_tokens(i64::MAX)})))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"detail": "bad code"})))
    }
}

async fn bridge_refresh(Json(body): Json<Value>) -> impl IntoResponse {
    let expired = body["tokens"]
        .as_str()
        .map(|raw| TokenBlob::new(raw).oauth2_access())
        .is_some_and(|access| access.is_ok_and(|a| a.access_token == STALE_ACCESS_TOKEN));

    if expired {
        (StatusCode::OK, Json(json!({"tokens": stub_tokens(i64::MAX)})))
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({"detail": "unknown tokens"})))
    }
}

fn stub_tokens(expires_at: i64) -> TokenBlob {
    TokenBlob::from_oauth_pair(
        &json!({"oauth_token": "o1", "oauth_token_secret": "s1"}),
        &json!({"access_token": ACCESS_TOKEN, "expires_at": expires_at}),
    )
    .unwrap()
}

async fn spawn_stub() -> String {
    let router = Router::new()
        .route("/userprofile-service/socialProfile", get(social_profile))
        .route("/usersummary-service/usersummary/daily/:id", get(daily_summary))
        .route("/weight-service/weight/dateRange", get(weight_range))
        .route("/bridge/login", post(bridge_login))
        .route("/bridge/resume_login", post(bridge_resume))
        .route("/bridge/refresh", post(bridge_refresh));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    address
}

async fn client(with_bridge: bool) -> ConnectClient {
    let address = spawn_stub().await;
    ConnectClient::new(GarminConfig {
        enabled: true,
        connect_api_url: address.clone(),
        auth_bridge_url: with_bridge.then(|| format!("{}/bridge", address)),
        request_timeout_secs: 5,
    })
    .unwrap()
}

fn expired_tokens() -> TokenBlob {
    TokenBlob::from_oauth_pair(
        &json!({"oauth_token": "o1", "oauth_token_secret": "s1"}),
        &json!({"access_token": STALE_ACCESS_TOKEN, "expires_at": 1}),
    )
    .unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn daily_summary_resolves_profile_id_first() {
    let client = client(false).await;

    let data = client
        .daily_summary(&stub_tokens(i64::MAX), date("2024-06-15"))
        .await
        .unwrap();

    assert_eq!(data["profileId"], "987654");
    assert_eq!(data["calendarDate"], "2024-06-15");
    assert_eq!(data["userAgent"], "GCM-iOS-5.7.2.1");
}

#[tokio::test]
async fn body_composition_defaults_end_to_start() {
    let client = client(false).await;

    let data = client
        .body_composition(&stub_tokens(i64::MAX), date("2024-06-01"), None)
        .await
        .unwrap();
    assert_eq!(data["startDate"], "2024-06-01");
    assert_eq!(data["endDate"], "2024-06-01");

    let data = client
        .body_composition(
            &stub_tokens(i64::MAX),
            date("2024-06-01"),
            Some(date("2024-06-30")),
        )
        .await
        .unwrap();
    assert_eq!(data["endDate"], "2024-06-30");
}

#[tokio::test]
async fn vendor_rejection_is_http_error() {
    let client = client(false).await;
    let wrong = TokenBlob::from_oauth_pair(&json!({}), &json!({"access_token": "nope"})).unwrap();

    let err = client
        .daily_summary(&wrong, date("2024-06-15"))
        .await
        .unwrap_err();

    assert!(matches!(err, GarminError::Http { status: 401, .. }), "{:?}", err);
}

#[tokio::test]
async fn expired_tokens_are_refreshed_through_bridge() {
    let client = client(true).await;

    let data = client
        .body_composition(&expired_tokens(), date("2024-06-01"), None)
        .await
        .unwrap();
    assert_eq!(data["startDate"], "2024-06-01");

    let data = client
        .daily_summary(&expired_tokens(), date("2024-06-15"))
        .await
        .unwrap();
    assert_eq!(data["profileId"], "987654");
}

#[tokio::test]
async fn expired_tokens_without_bridge_are_session_error() {
    let client = client(false).await;

    let err = client
        .body_composition(&expired_tokens(), date("2024-06-01"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, GarminError::Session(_)), "{:?}", err);
}

#[tokio::test]
async fn rejected_refresh_is_http_error() {
    let client = client(true).await;
    let unknown = TokenBlob::from_oauth_pair(
        &json!({}),
        &json!({"access_token": "revoked", "expires_at": 1}),
    )
    .unwrap();

    let err = client
        .daily_summary(&unknown, date("2024-06-15"))
        .await
        .unwrap_err();

    assert!(matches!(err, GarminError::Http { status: 400, .. }), "{:?}", err);
}

#[tokio::test]
async fn login_through_bridge_returns_tokens() {
    let client = client(true).await;

    let outcome = client
        .login(&Credentials {
            email: "runner@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    let LoginOutcome::Success { tokens } = outcome else {
        panic!("expected tokens, got {:?}", outcome);
    };
    assert_eq!(tokens.oauth2_access().unwrap().access_token, ACCESS_TOKEN);
}

#[tokio::test]
async fn mfa_through_bridge() {
    let client = client(true).await;

    let outcome = client
        .login(&Credentials {
            email: "mfa@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();
    let LoginOutcome::NeedsMfa { client_state } = outcome else {
        panic!("expected MFA challenge, got {:?}", outcome);
    };

    let tokens = client.resume_login(&client_state, "123456").await.unwrap();
    assert!(tokens.oauth2_access().is_ok());

    let err = client
        .resume_login(&client_state, "000000")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GarminError::Http {
            status: 401,
            body: r#"{"detail":"bad code"}"#.to_string(),
        }
    );
}

#[tokio::test]
async fn bridge_http_failure_is_reported() {
    let client = client(true).await;

    let err = client
        .login(&Credentials {
            email: "locked@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, GarminError::Http { status: 403, .. }), "{:?}", err);
}

#[tokio::test]
async fn login_without_bridge_is_session_error() {
    let client = client(false).await;

    let err = client
        .login(&Credentials {
            email: "runner@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GarminError::Session("No Garmin auth bridge is configured".to_string())
    );
}
