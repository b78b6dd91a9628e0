use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced at the HTTP boundary.
///
/// Every variant renders as `{"detail": "..."}`, the body shape callers of
/// these services parse on failure.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamError(_) | AppError::InternalError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::BadRequest(err) => err.to_string(),
            AppError::UpstreamError(msg) => msg.clone(),
            AppError::InternalError(err) => format!("An unexpected error occurred: {}", err),
            AppError::ConfigError(err) => format!("Configuration error: {}", err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            detail: String,
        }

        let status = self.status();
        match &self {
            // Already logged with context where the upstream call failed.
            AppError::UpstreamError(_) => {}
            _ if status.is_server_error() => {
                tracing::error!(status = %status, error = %self, "Request failed");
            }
            _ => tracing::debug!(status = %status, error = %self, "Request rejected"),
        }

        (
            status,
            Json(ErrorResponse {
                detail: self.detail(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn error_lines_logged_for(err: AppError) -> usize {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::ERROR)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let _ = err.into_response();
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        output.lines().filter(|line| line.contains("ERROR")).count()
    }

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn bad_request_keeps_message_verbatim() {
        let (status, body) = body_of(AppError::BadRequest(anyhow::anyhow!(
            "Missing user_id, tokens, or date."
        )))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Missing user_id, tokens, or date.");
    }

    #[tokio::test]
    async fn upstream_error_is_500_with_text() {
        let (status, body) =
            body_of(AppError::UpstreamError("Garmin API error: 401".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Garmin API error: 401");
    }

    #[tokio::test]
    async fn internal_error_embeds_cause() {
        let (status, body) = body_of(AppError::InternalError(anyhow::anyhow!("boom"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "An unexpected error occurred: boom");
    }

    #[test]
    fn upstream_error_is_not_logged_twice() {
        assert_eq!(
            error_lines_logged_for(AppError::UpstreamError("Garmin API error".to_string())),
            0
        );
        assert_eq!(
            error_lines_logged_for(AppError::InternalError(anyhow::anyhow!("boom"))),
            1
        );
    }
}
