use super::types::{RawRecord, fields};

/// Raw text of the single-transaction form, exactly as entered.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionForm {
    pub user_id: Option<String>,
    pub amount: String,
    pub hour: String,
    pub day_of_week: String,
    pub merchant_category: String,
    pub device_type: String,
    pub distance_from_home_km: String,
    pub is_foreign: String,
    pub is_high_risk_merchant: String,
    pub has_history_of_chargeback: String,
}

impl Default for TransactionForm {
    fn default() -> Self {
        Self {
            user_id: None,
            amount: "1500.00".to_string(),
            hour: "14".to_string(),
            day_of_week: "4".to_string(),
            merchant_category: "grocery".to_string(),
            device_type: "mobile".to_string(),
            distance_from_home_km: "2.0".to_string(),
            is_foreign: "0".to_string(),
            is_high_risk_merchant: "0".to_string(),
            has_history_of_chargeback: "0".to_string(),
        }
    }
}

impl TransactionForm {
    pub fn into_record(self) -> RawRecord {
        let mut record = RawRecord::new();
        if let Some(user_id) = self.user_id {
            record.insert(fields::USER_ID.to_string(), user_id);
        }
        let pairs = [
            (fields::AMOUNT, self.amount),
            (fields::HOUR, self.hour),
            (fields::DAY_OF_WEEK, self.day_of_week),
            (fields::MERCHANT_CATEGORY, self.merchant_category),
            (fields::DEVICE_TYPE, self.device_type),
            (fields::DISTANCE_FROM_HOME_KM, self.distance_from_home_km),
            (fields::IS_FOREIGN, self.is_foreign),
            (fields::IS_HIGH_RISK_MERCHANT, self.is_high_risk_merchant),
            (fields::HAS_HISTORY_OF_CHARGEBACK, self.has_history_of_chargeback),
        ];
        for (name, value) in pairs {
            record.insert(name.to_string(), value);
        }
        record
    }
}
