use anyhow::Result;
use fraudshield::{
    client::{HttpScoringClient, ScoringClient},
    config,
    session::BatchSession,
    workflow::{BatchWorkflow, Submission},
};
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info, warn};

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Determine log level: environment variable overrides config
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logs.level.clone());

    if let Err(e) = validate_log_level(&log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .json()
        .init();

    let mut args = std::env::args().skip(1);
    let Some(input_path) = args.next() else {
        eprintln!("Usage: fraudshield <transactions.csv> [output.csv]");
        std::process::exit(2);
    };
    let output_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.export.file_name));

    let client = Arc::new(HttpScoringClient::new(config.service.clone())?);

    match client.health().await {
        Ok(health) if !health.model_loaded => warn!(
            "Scoring service is up but the model is not loaded: {}",
            health.model_error.as_deref().unwrap_or("no detail")
        ),
        Ok(health) => info!(
            "Scoring service ready (api version {})",
            health.api_version.as_deref().unwrap_or("unknown")
        ),
        Err(e) => error!("Cannot reach scoring service: {}", e),
    }

    let session = BatchSession::new();
    let workflow = BatchWorkflow::new(client, session.clone());

    let file = tokio::fs::read(&input_path).await?;
    info!("Loaded {} ({} bytes)", input_path, file.len());
    workflow.collect(file)?;

    match workflow.submit().await {
        Ok(Submission::Completed(batch)) => {
            for result in &batch.results {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    result.display_user_id(),
                    result.display_amount(),
                    result.transaction.merchant_category,
                    result.probability_percent(),
                    result.verdict()
                );
            }
            for skipped in &batch.skipped_rows {
                println!("line {} skipped: {}", skipped.row, skipped.reason);
            }
            session.export_to(&output_path).await?;
            println!(
                "{} scored, {} skipped, results written to {}",
                batch.scored_count(),
                batch.skipped_count(),
                output_path.display()
            );
        }
        Ok(Submission::Ignored | Submission::Superseded) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    workflow.acknowledge()?;
    Ok(())
}
