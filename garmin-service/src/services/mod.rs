pub mod garmin;
pub mod metrics;

pub use garmin::{
    ConnectClient, Credentials, GarminClient, GarminError, LoginOutcome, MockGarminClient,
    Operation, TokenBlob,
};
pub use metrics::{get_metrics, init_metrics, record_garmin_call};
