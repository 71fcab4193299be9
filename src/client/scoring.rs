use super::types::*;
use crate::{
    Error, Result,
    config::ServiceConfig,
    model::{PredictionResult, TransactionInput},
};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Remote scoring service. Implementations never retry.
#[async_trait]
pub trait ScoringClient: Send + Sync {
    async fn health(&self) -> Result<HealthStatus>;

    async fn score_one(&self, input: &TransactionInput) -> Result<PredictionResult>;

    /// Scores the whole batch in one request; output order matches `inputs`.
    async fn score_batch(&self, inputs: &[TransactionInput]) -> Result<Vec<PredictionResult>>;
}

pub struct HttpScoringClient {
    client: reqwest::Client,
    service: ServiceConfig,
}

impl HttpScoringClient {
    pub fn new(service: ServiceConfig) -> Result<Self> {
        service.validate()?;

        let client = reqwest::Client::builder()
            .timeout(service.timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        debug!("Created scoring client for: {}", service.base_url);

        Ok(Self { client, service })
    }

    async fn read<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::ServiceUnavailable(format!("Failed to read {} response: {}", endpoint, e))
        })?;

        if !status.is_success() {
            warn!("{} returned {}", endpoint, status);
            return Err(rejection(status, &body));
        }

        debug!("{} returned {} bytes", endpoint, body.len());

        serde_json::from_str(&body).map_err(|e| {
            Error::contract(format!("Unexpected {} response shape: {}", endpoint, e))
        })
    }

    fn unavailable(endpoint: &str, err: reqwest::Error) -> Error {
        let reason = if err.is_timeout() {
            "timed out".to_string()
        } else {
            err.to_string()
        };
        Error::ServiceUnavailable(format!("{}: {}", endpoint, reason))
    }
}

fn rejection(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        });
    Error::ServiceRejected {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl ScoringClient for HttpScoringClient {
    async fn health(&self) -> Result<HealthStatus> {
        let url = self.service.endpoint("health");
        debug!("Probing scoring service at {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::unavailable("health", e))?;

        Self::read("health", response).await
    }

    async fn score_one(&self, input: &TransactionInput) -> Result<PredictionResult> {
        let url = self.service.endpoint("predict");
        debug!("Scoring single transaction at {}", url);

        let response = self
            .client
            .post(&url)
            .json(input)
            .send()
            .await
            .map_err(|e| Self::unavailable("predict", e))?;

        let scored: ScoreResponse = Self::read("predict", response).await?;
        check_response(0, input, scored)
    }

    async fn score_batch(&self, inputs: &[TransactionInput]) -> Result<Vec<PredictionResult>> {
        let url = self.service.endpoint("batch-predict");
        debug!("Scoring batch of {} transactions at {}", inputs.len(), url);

        let response = self
            .client
            .post(&url)
            .json(inputs)
            .send()
            .await
            .map_err(|e| Self::unavailable("batch-predict", e))?;

        let scored: Vec<ScoreResponse> = Self::read("batch-predict", response).await?;
        check_batch_response(inputs, scored)
    }
}
