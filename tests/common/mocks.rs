use async_trait::async_trait;
use fraudshield::{
    Error, Result,
    client::{HealthStatus, ScoringClient},
    model::{PredictionResult, TransactionInput},
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use wiremock::{Request, Respond, ResponseTemplate};

/// Deterministic score used by every mock: amount / 10000, capped at 1.
pub fn mock_probability(amount: f64) -> f64 {
    (amount / 10_000.0).min(1.0)
}

fn mock_result(input: &TransactionInput) -> PredictionResult {
    let fraud_probability = mock_probability(input.amount);
    PredictionResult {
        transaction: input.clone(),
        fraud_probability,
        is_fraud: fraud_probability >= 0.5,
    }
}

/// In-process scoring client that records what it was asked to score.
#[derive(Default)]
pub struct MockScoringClient {
    pub single_requests: Arc<Mutex<Vec<TransactionInput>>>,
    pub batch_requests: Arc<Mutex<Vec<Vec<TransactionInput>>>>,
    pub error: Option<Error>,
    pub drop_results: usize,
    gate: Option<Arc<Notify>>,
}

impl MockScoringClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(mut self, error: Error) -> Self {
        self.error = Some(error);
        self
    }

    /// Returns `n` fewer results than were submitted.
    pub fn dropping_results(mut self, n: usize) -> Self {
        self.drop_results = n;
        self
    }

    /// Holds every scoring call until the returned handle is notified.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn single_calls(&self) -> usize {
        self.single_requests.lock().unwrap().len()
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_requests.lock().unwrap().len()
    }

    pub fn last_batch(&self) -> Vec<TransactionInput> {
        self.batch_requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl ScoringClient for MockScoringClient {
    async fn health(&self) -> Result<HealthStatus> {
        Ok(HealthStatus {
            status: Some("healthy".to_string()),
            model_loaded: true,
            model_status: Some("loaded".to_string()),
            model_error: None,
            api_version: Some("1.0.0".to_string()),
        })
    }

    async fn score_one(&self, input: &TransactionInput) -> Result<PredictionResult> {
        self.single_requests.lock().unwrap().push(input.clone());
        self.wait_for_gate().await;
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        Ok(mock_result(input))
    }

    async fn score_batch(&self, inputs: &[TransactionInput]) -> Result<Vec<PredictionResult>> {
        self.batch_requests.lock().unwrap().push(inputs.to_vec());
        self.wait_for_gate().await;
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        let keep = inputs.len().saturating_sub(self.drop_results);
        Ok(inputs[..keep].iter().map(mock_result).collect())
    }
}

fn scored_json(record: &Value) -> Value {
    let amount = record["amount"].as_f64().unwrap_or_default();
    let probability = mock_probability(amount);
    json!({
        "amount": record["amount"],
        "merchant_category": record["merchant_category"],
        "fraud_probability": probability,
        "is_fraud": probability >= 0.5,
    })
}

/// wiremock responder that scores whatever was posted, echoing fields back.
pub struct EchoScorer;

impl Respond for EchoScorer {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400).set_body_json(json!({"error": "bad json"})),
        };
        let scored = match &body {
            Value::Array(records) => Value::Array(records.iter().map(scored_json).collect()),
            record => scored_json(record),
        };
        ResponseTemplate::new(200).set_body_json(scored)
    }
}

/// wiremock responder for `/batch-predict` that answers only the first `n` records.
pub struct TruncatingScorer(pub usize);

impl Respond for TruncatingScorer {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let records: Vec<Value> = serde_json::from_slice(&request.body).unwrap_or_default();
        let scored: Vec<Value> = records.iter().take(self.0).map(scored_json).collect();
        ResponseTemplate::new(200).set_body_json(scored)
    }
}
