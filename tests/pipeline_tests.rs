use fraudshield::{
    FailureKind, codec,
    session::BatchSession,
    workflow::{BatchWorkflow, Submission, WorkflowState},
};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer,
    matchers::{method, path},
};

mod common;
use common::{EchoScorer, TruncatingScorer, five_row_file, http_client, mock_probability};

#[tokio::test]
async fn test_upload_score_and_export() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch-predict"))
        .respond_with(EchoScorer)
        .expect(1)
        .mount(&server)
        .await;

    let session = BatchSession::new();
    let wf = BatchWorkflow::new(Arc::new(http_client(&server.uri())), session.clone());
    wf.collect(five_row_file()).unwrap();
    let batch = match wf.submit().await.unwrap() {
        Submission::Completed(batch) => batch,
        other => panic!("unexpected submission: {other:?}"),
    };
    assert_eq!(batch.scored_count(), 5);

    let requests = server.received_requests().await.unwrap();
    let body: Vec<Value> = serde_json::from_slice(&requests[0].body).unwrap();
    let sent: Vec<f64> = body.iter().map(|r| r["amount"].as_f64().unwrap()).collect();
    assert_eq!(sent, vec![100.0, 200.0, 300.0, 400.0, 500.0]);

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("fraud_detection_results.csv");
    session.export_to(&file).await.unwrap();

    let exported = std::fs::read(&file).unwrap();
    let text = String::from_utf8(exported.clone()).unwrap();
    assert!(text.starts_with("user_id,amount,hour,day_of_week,merchant_category"));
    assert!(text.lines().next().unwrap().ends_with("fraud_probability,is_fraud"));

    let reread = codec::decode_results(&exported).unwrap();
    assert_eq!(reread.len(), 5);
    assert_eq!(reread[4].transaction.amount, 500.0);
    assert_eq!(reread[4].fraud_probability, mock_probability(500.0));
    assert_eq!(reread, batch.results);
}

#[tokio::test]
async fn test_three_results_for_five_records_is_contract_violation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch-predict"))
        .respond_with(EchoScorer)
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/batch-predict"))
        .respond_with(TruncatingScorer(3))
        .mount(&server)
        .await;

    let session = BatchSession::new();
    let wf = BatchWorkflow::new(Arc::new(http_client(&server.uri())), session.clone());

    wf.collect(five_row_file()).unwrap();
    let previous = match wf.submit().await.unwrap() {
        Submission::Completed(batch) => batch,
        other => panic!("unexpected submission: {other:?}"),
    };
    let exported_before = session.export().unwrap();

    wf.collect(five_row_file()).unwrap();
    let err = wf.submit().await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::ContractViolation);
    assert_eq!(wf.state(), WorkflowState::Failed);
    assert_eq!(session.current().unwrap().id, previous.id);
    assert_eq!(session.export().unwrap(), exported_before);
}

#[tokio::test]
async fn test_export_before_any_batch_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("fraud_detection_results.csv");

    let err = BatchSession::new().export_to(&file).await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::ExportWithNoData);
    assert!(!file.exists());
}
