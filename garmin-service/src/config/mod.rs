use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const DEFAULT_CONNECT_API_URL: &str = "https://connectapi.garmin.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct GarminServiceConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub garmin: GarminConfig,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GarminConfig {
    /// When false the service answers from `MockGarminClient`.
    pub enabled: bool,
    pub connect_api_url: String,
    /// Out-of-process session library that performs SSO login and MFA.
    pub auth_bridge_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for GarminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            connect_api_url: DEFAULT_CONNECT_API_URL.to_string(),
            auth_bridge_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl GarminServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let enabled = env::var("GARMIN_ENABLED")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let auth_bridge_url = env::var("GARMIN_AUTH_BRIDGE_URL")
            .ok()
            .filter(|url| !url.is_empty());
        if is_prod && enabled && auth_bridge_url.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GARMIN_AUTH_BRIDGE_URL is required in production but not set"
            )));
        }

        Ok(GarminServiceConfig {
            common: common_config,
            garmin: GarminConfig {
                enabled,
                connect_api_url: get_env(
                    "GARMIN_CONNECT_API_URL",
                    Some(DEFAULT_CONNECT_API_URL),
                    is_prod,
                )?,
                auth_bridge_url,
                request_timeout_secs: parse_request_timeout(&get_env(
                    "GARMIN_REQUEST_TIMEOUT_SECS",
                    Some("30"),
                    is_prod,
                )?)?,
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|e| !e.is_empty()),
        })
    }
}

/// Outbound request timeout in seconds. Zero would fail every vendor call.
fn parse_request_timeout(raw: &str) -> Result<u64, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(AppError::ConfigError(anyhow::anyhow!(
            "GARMIN_REQUEST_TIMEOUT_SECS must be greater than zero"
        ))),
        Ok(secs) => Ok(secs),
        Err(e) => {
            tracing::warn!(
                value = %raw,
                error = %e,
                "Invalid GARMIN_REQUEST_TIMEOUT_SECS, using {}s",
                DEFAULT_REQUEST_TIMEOUT_SECS
            );
            Ok(DEFAULT_REQUEST_TIMEOUT_SECS)
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_env_falls_back_to_default_outside_prod() {
        let value = get_env("GARMIN_SERVICE_TEST_UNSET_KEY", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn get_env_requires_value_in_prod() {
        let err = get_env("GARMIN_SERVICE_TEST_UNSET_KEY", Some("fallback"), true).unwrap_err();
        assert!(err.to_string().contains("required in production"));
    }

    #[test]
    fn request_timeout_rejects_zero() {
        let err = parse_request_timeout("0").unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn request_timeout_falls_back_on_garbage() {
        assert_eq!(parse_request_timeout("45").unwrap(), 45);
        assert_eq!(
            parse_request_timeout("soon").unwrap(),
            DEFAULT_REQUEST_TIMEOUT_SECS
        );
    }

    #[test]
    fn default_garmin_config_uses_mock() {
        let config = GarminConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.connect_api_url, DEFAULT_CONNECT_API_URL);
        assert!(config.auth_bridge_url.is_none());
    }
}
