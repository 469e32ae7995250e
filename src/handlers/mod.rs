//! HTTP handlers for the relay endpoints and infrastructure probes.

pub mod child_data;
pub mod health;
pub mod internet_status;

pub use child_data::request_child_data;
pub use health::{health_check, readiness_check};
pub use internet_status::{check_internet_status, update_internet_status};

/// Plain-text banner used by uptime probes.
pub async fn api_root() -> &'static str {
    "API Working"
}
