use fraudshield::{
    client::HttpScoringClient,
    config::{Config, ServiceConfig},
    model::TransactionForm,
};
use std::time::Duration;

/// Header row carrying every required column plus the optional ones.
pub const FULL_HEADER: &str = "user_id,amount,hour,day_of_week,merchant_category,device_type,distance_from_home_km,is_foreign,is_high_risk_merchant,has_history_of_chargeback";

/// Header row carrying only the required columns.
pub const REQUIRED_HEADER: &str = "amount,merchant_category,device_type,distance_from_home_km,is_foreign,is_high_risk_merchant,has_history_of_chargeback";

/// One data row under [`FULL_HEADER`].
pub fn full_row(user_id: u32, amount: &str, merchant: &str) -> String {
    format!("{user_id},{amount},14,4,{merchant},mobile,3.5,0,0,0")
}

/// Builds an uploaded file from a header and rows.
pub fn csv_file(header: &str, rows: &[String]) -> Vec<u8> {
    let mut text = String::from(header);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    text.into_bytes()
}

/// A five-row file with ascending amounts 100..500.
pub fn five_row_file() -> Vec<u8> {
    let rows: Vec<String> = (1..=5)
        .map(|i| full_row(i, &format!("{}", i * 100), "grocery"))
        .collect();
    csv_file(FULL_HEADER, &rows)
}

pub fn form_with_amount(amount: &str) -> TransactionForm {
    TransactionForm {
        amount: amount.to_string(),
        ..TransactionForm::default()
    }
}

pub fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.service = ServiceConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
    };
    config.logs.level = "debug".to_string();
    config
}

pub fn http_client(base_url: &str) -> HttpScoringClient {
    HttpScoringClient::new(create_test_config(base_url).service).unwrap()
}

/// Yields until `check` holds, failing the test after a second.
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::task::yield_now().await;
    }
}
