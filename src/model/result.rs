use super::types::TransactionInput;
use serde::Serialize;
use std::fmt;

/// Scoring outcome for one input, carrying the input it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    #[serde(flatten)]
    pub transaction: TransactionInput,
    pub fraud_probability: f64,
    pub is_fraud: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Fraud,
    Legitimate,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fraud => f.write_str("FRAUD"),
            Self::Legitimate => f.write_str("Legitimate"),
        }
    }
}

impl PredictionResult {
    pub fn verdict(&self) -> Verdict {
        if self.is_fraud {
            Verdict::Fraud
        } else {
            Verdict::Legitimate
        }
    }

    pub fn probability_percent(&self) -> String {
        format!("{:.2}%", self.fraud_probability * 100.0)
    }

    pub fn display_amount(&self) -> String {
        format!("₹{:.2}", self.transaction.amount)
    }

    pub fn display_user_id(&self) -> String {
        self.transaction
            .user_id
            .as_ref()
            .map_or_else(|| "Auto-generated".to_string(), ToString::to_string)
    }
}
