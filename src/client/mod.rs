mod scoring;
mod types;

pub use scoring::{HttpScoringClient, ScoringClient};
pub use types::{ErrorBody, HealthStatus, ScoreResponse, check_batch_response, check_response};
