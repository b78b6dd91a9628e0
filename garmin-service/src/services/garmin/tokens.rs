use super::GarminError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

const MASK_PREFIX_LEN: usize = 30;

/// Opaque session blob owned by the session library: base64 of the JSON
/// array `[oauth1_token, oauth2_token]`.
///
/// The service never stores it; callers send it back on every data request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenBlob(String);

/// The part of the OAuth2 token the data calls need.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuth2Access {
    pub access_token: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl OAuth2Access {
    pub fn is_expired_at(&self, unix_now: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= unix_now)
    }
}

impl TokenBlob {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Pack an OAuth1/OAuth2 token pair the way the session library dumps it.
    pub fn from_oauth_pair(oauth1: &Value, oauth2: &Value) -> Result<Self, GarminError> {
        let bytes = serde_json::to_vec(&json!([oauth1, oauth2]))
            .map_err(|e| GarminError::Unexpected(format!("Failed to encode tokens: {}", e)))?;
        Ok(Self(STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe rendering: a short prefix only.
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(MASK_PREFIX_LEN).collect();
        format!("{}...", prefix)
    }

    pub fn oauth2_access(&self) -> Result<OAuth2Access, GarminError> {
        let decoded = STANDARD
            .decode(self.0.trim())
            .map_err(|e| GarminError::Session(format!("Token blob is not valid base64: {}", e)))?;

        let pair: Vec<Value> = serde_json::from_slice(&decoded).map_err(|e| {
            GarminError::Session(format!("Token blob does not hold a token pair: {}", e))
        })?;

        let oauth2 = pair
            .into_iter()
            .nth(1)
            .ok_or_else(|| GarminError::Session("Token blob has no OAuth2 token".to_string()))?;

        serde_json::from_value(oauth2)
            .map_err(|e| GarminError::Session(format!("Malformed OAuth2 token: {}", e)))
    }
}

impl fmt::Debug for TokenBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TokenBlob").field(&self.masked()).finish()
    }
}
