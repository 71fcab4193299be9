use crate::{
    Error, Result,
    model::{PredictionResult, TransactionInput},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: Option<String>,
    pub model_loaded: bool,
    #[serde(default)]
    pub model_status: Option<String>,
    #[serde(default)]
    pub model_error: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
}

/// One scored record as returned by `/predict` or an element of `/batch-predict`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreResponse {
    pub fraud_probability: f64,
    pub is_fraud: bool,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub merchant_category: Option<Value>,
}

/// Error envelope the service uses for non-success responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Checks one response against the input it answers.
pub fn check_response(
    index: usize,
    input: &TransactionInput,
    response: ScoreResponse,
) -> Result<PredictionResult> {
    let probability = response.fraud_probability;
    if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
        return Err(Error::contract(format!(
            "result {}: fraud_probability {} outside [0, 1]",
            index, probability
        )));
    }

    if let Some(echoed) = &response.amount {
        let matches = echoed
            .as_f64()
            .is_some_and(|amount| (amount - input.amount).abs() < 1e-6);
        if !matches {
            return Err(Error::contract(format!(
                "result {}: echoed amount {} does not match submitted {}",
                index, echoed, input.amount
            )));
        }
    }

    if let Some(echoed) = &response.merchant_category {
        let matches = echoed
            .as_str()
            .is_some_and(|category| category.eq_ignore_ascii_case(input.merchant_category.as_str()));
        if !matches {
            return Err(Error::contract(format!(
                "result {}: echoed merchant_category {} does not match submitted {}",
                index, echoed, input.merchant_category
            )));
        }
    }

    Ok(PredictionResult {
        transaction: input.clone(),
        fraud_probability: probability,
        is_fraud: response.is_fraud,
    })
}

/// Pairs a batch response with its request, index by index.
pub fn check_batch_response(
    inputs: &[TransactionInput],
    responses: Vec<ScoreResponse>,
) -> Result<Vec<PredictionResult>> {
    if responses.len() != inputs.len() {
        return Err(Error::contract(format!(
            "sent {} records, received {} results",
            inputs.len(),
            responses.len()
        )));
    }

    inputs
        .iter()
        .zip(responses)
        .enumerate()
        .map(|(index, (input, response))| check_response(index, input, response))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureKind;
    use crate::model::{DayOfWeek, DeviceType, MerchantCategory};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn input(amount: f64) -> TransactionInput {
        TransactionInput {
            user_id: None,
            amount,
            hour: 1,
            day_of_week: DayOfWeek::Tuesday,
            merchant_category: MerchantCategory::Travel,
            device_type: DeviceType::Mobile,
            distance_from_home_km: 5.0,
            is_foreign: false,
            is_high_risk_merchant: false,
            has_history_of_chargeback: false,
        }
    }

    fn response(value: Value) -> ScoreResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_batch_pairs_in_order() {
        let inputs = vec![input(10.0), input(20.0)];
        let results = check_batch_response(
            &inputs,
            vec![
                response(json!({"fraud_probability": 0.1, "is_fraud": false, "amount": 10.0})),
                response(json!({"fraud_probability": 0.9, "is_fraud": true, "amount": 20.0, "merchant_category": "travel"})),
            ],
        )
        .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].transaction, inputs[0]);
        assert_eq!(results[1].transaction, inputs[1]);
        assert!(results[1].is_fraud);
    }

    #[test]
    fn test_length_mismatch_is_contract_violation() {
        let inputs = vec![input(1.0), input(2.0), input(3.0)];
        let err = check_batch_response(
            &inputs,
            vec![response(json!({"fraud_probability": 0.1, "is_fraud": false}))],
        )
        .unwrap_err();
        assert_eq!(err.kind(), FailureKind::ContractViolation);
    }

    #[test]
    fn test_probability_outside_unit_interval_is_rejected() {
        let err = check_response(
            0,
            &input(1.0),
            response(json!({"fraud_probability": 1.5, "is_fraud": true})),
        )
        .unwrap_err();
        assert_eq!(err.kind(), FailureKind::ContractViolation);
    }

    #[test]
    fn test_echo_mismatch_is_rejected() {
        let err = check_response(
            4,
            &input(1.0),
            response(json!({"fraud_probability": 0.2, "is_fraud": false, "amount": 2.0})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("result 4"));

        let err = check_response(
            0,
            &input(1.0),
            response(json!({"fraud_probability": 0.2, "is_fraud": false, "merchant_category": "fuel"})),
        )
        .unwrap_err();
        assert_eq!(err.kind(), FailureKind::ContractViolation);
    }

    #[test]
    fn test_health_status_tolerates_extra_fields() {
        let status: HealthStatus = serde_json::from_value(json!({
            "status": "healthy",
            "model_loaded": false,
            "model_status": "not_loaded",
            "model_path": "/srv/models/model.pkl",
            "model_exists": false,
            "model_error": "Model file not found",
            "api_version": "1.0.0"
        }))
        .unwrap();
        assert!(!status.model_loaded);
        assert_eq!(status.api_version.as_deref(), Some("1.0.0"));
    }
}
