mod types;

pub use types::*;

use crate::Result;
use std::env;
use std::path::Path;
use tracing::debug;

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    load_from(&config_path).await
}

pub async fn load_from(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    debug!("Loading configuration from: {}", path.display());

    let config_str = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&config_str)?;
    config.service.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_load_from_file_with_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(
            &path,
            "service:\n  base_url: \"http://scoring:5000/api\"\nlogs:\n  level: debug\n",
        )
        .await
        .unwrap();

        let config = load_from(&path).await.unwrap();
        assert_eq!(config.service.base_url, "http://scoring:5000/api");
        assert_eq!(config.service.timeout_secs, 30);
        assert_eq!(config.logs.level, "debug");
        assert_eq!(config.export.file_name, "fraud_detection_results.csv");
    }

    #[tokio::test]
    async fn test_load_rejects_empty_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "service:\n  base_url: \"\"\n")
            .await
            .unwrap();

        let result = load_from(&path).await;
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let result = load_from("/definitely/not/here/config.yaml").await;
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
