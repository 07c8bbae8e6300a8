//! CLI argument parsing and subcommand dispatch.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use adwatch_core::{AnomalyDetector, Config};

use crate::store::{DetectorStore, FileDetectorStore, StoreContext};

#[derive(Debug, Parser)]
#[command(name = "adwatch-server", version, about = "Anomaly detector preview and run server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default).
    Serve,
    /// Store a detector definition from a JSON file.
    Import {
        /// Path to the detector JSON document.
        path: PathBuf,
        /// Id to store it under; defaults to the document's `detector_id`,
        /// then the file stem.
        #[arg(long)]
        id: Option<String>,
    },
}

/// Import a detector file into the file store. Returns the stored id and version.
pub async fn import(
    config: &Config,
    path: &Path,
    id: Option<&str>,
) -> anyhow::Result<(String, u64)> {
    let raw = tokio::fs::read(path).await?;
    let detector: AnomalyDetector = serde_json::from_slice(&raw)?;

    let id = id
        .map(str::to_string)
        .or_else(|| detector.detector_id.clone())
        .or_else(|| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .ok_or_else(|| anyhow::anyhow!("Cannot derive a detector id from {}", path.display()))?;

    let store = FileDetectorStore::new(config.storage.detectors_dir())?;
    let version = store.put(&StoreContext::System, &id, &detector).await?;
    info!(detector_id = %id, version, "Imported detector from {}", path.display());
    Ok((id, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serve_is_optional() {
        let cli = Cli::parse_from(["adwatch-server"]);
        assert!(cli.command.is_none());
        let cli = Cli::parse_from(["adwatch-server", "import", "cpu.json", "--id", "cpu"]);
        assert!(matches!(cli.command, Some(Command::Import { id: Some(ref id), .. }) if id == "cpu"));
    }

    #[tokio::test]
    async fn import_uses_file_stem_and_bumps_version() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::for_profile("CLITEST");
        config.storage.data_dir = tmp.path().to_path_buf();

        let file = tmp.path().join("cpu-detector.json");
        let doc = json!({
            "name": "cpu",
            "time_field": "ts",
            "indices": ["metrics"],
            "feature_attributes": [{
                "feature_name": "avg_cpu",
                "aggregation_query": { "avg_cpu": { "avg": { "field": "cpu" } } }
            }],
            "detection_interval": { "period": { "interval": 10, "unit": "Minutes" } }
        });
        std::fs::write(&file, doc.to_string()).unwrap();

        let (id, v1) = import(&config, &file, None).await.unwrap();
        assert_eq!(id, "cpu-detector");
        let (_, v2) = import(&config, &file, None).await.unwrap();
        assert_eq!(v2, v1 + 1);
        assert!(tmp.path().join("detectors/cpu-detector.json").is_file());
    }
}
