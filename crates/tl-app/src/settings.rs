//! Configuration file of the timeline binary

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tl_client::ClientConfig;
use tl_data::PipelineConfig;

/// Contents of the optional `--config` JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub client: ClientConfig,
}

impl AppConfig {
    /// Load the file if given, otherwise use the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_path_gives_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.client, ClientConfig::default());
        assert_eq!(config.pipeline.non_critical_tag, "non_critical");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"{{"client": {{"base_url": "http://backend:8000"}}, "pipeline": {{"neutral_color": "#333333"}}}}"##
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.client.base_url, "http://backend:8000");
        assert_eq!(config.client.timeout_secs, ClientConfig::default().timeout_secs);
        assert_eq!(config.pipeline.neutral_color, "#333333");
        assert!(!config.pipeline.markers.is_empty());
    }

    #[test]
    fn test_unreadable_file_reports_path() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/timeline.json"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/timeline.json"));
    }
}
