pub mod auth;
pub mod data;

pub use auth::{LoginRequest, LoginResponse, ResumeLoginRequest};
pub use data::{
    BodyCompositionRequest, BodyCompositionResponse, DailySummaryRequest, DailySummaryResponse,
};
