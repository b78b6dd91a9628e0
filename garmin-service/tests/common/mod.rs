#![allow(dead_code)]

use garmin_service::config::{GarminConfig, GarminServiceConfig};
use garmin_service::services::{GarminClient, LoginOutcome, MockGarminClient, TokenBlob};
use garmin_service::startup::Application;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub garmin: Arc<MockGarminClient>,
    pub client: reqwest::Client,
}

pub fn test_config() -> GarminServiceConfig {
    GarminServiceConfig {
        // Use random port for testing (port 0)
        common: CoreConfig {
            port: 0,
            log_level: "error".to_string(),
        },
        garmin: GarminConfig::default(),
        otlp_endpoint: None,
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(MockGarminClient::new()).await
    }

    pub async fn spawn_with(mock: MockGarminClient) -> Self {
        let garmin = Arc::new(mock);
        let client_handle: Arc<dyn GarminClient> = garmin.clone();

        let app = Application::build_with_client(test_config(), client_handle)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            garmin,
            client,
        }
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Tokens the default mock accepts on data calls.
pub async fn mock_tokens() -> TokenBlob {
    let outcome = MockGarminClient::new()
        .login(&garmin_service::services::Credentials {
            email: "runner@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .expect("mock login failed");

    match outcome {
        LoginOutcome::Success { tokens } => tokens,
        LoginOutcome::NeedsMfa { .. } => panic!("default mock never requires MFA"),
    }
}
