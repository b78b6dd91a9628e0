use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::services::TokenBlob;

pub const MISSING_LOGIN_FIELDS: &str = "Missing email, password, or user_id.";
pub const MISSING_RESUME_FIELDS: &str = "Missing client_state, mfa_code, or user_id.";

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(required, length(min = 1))]
    pub email: Option<String>,

    #[validate(required, length(min = 1))]
    pub password: Option<String>,

    /// Caller-side (Sparky Fitness) user id, used for logging only.
    #[validate(required, length(min = 1))]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResumeLoginRequest {
    #[validate(required)]
    pub client_state: Option<Value>,

    #[validate(required, length(min = 1))]
    pub mfa_code: Option<String>,

    #[validate(required, length(min = 1))]
    pub user_id: Option<String>,
}

impl ResumeLoginRequest {
    /// `required` lets `{}` and `""` through; the session library cannot
    /// resume from those either.
    pub fn has_blank_client_state(&self) -> bool {
        match &self.client_state {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(Value::Object(map)) => map.is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginResponse {
    Success { tokens: TokenBlob },
    NeedsMfa { client_state: Value },
}
