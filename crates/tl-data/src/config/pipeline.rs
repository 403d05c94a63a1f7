//! Configuration of the derivation pipeline

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::markers::{default_markers, MarkerRule};
use crate::DataError;

/// Tunables of schema inference, filtering and classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Substrings identifying the time column, tried against headers in order
    pub time_keywords: Vec<String>,

    /// Marker string → heartbeat category
    pub markers: Vec<MarkerRule>,

    /// Tag excluded by the non-critical filter
    pub non_critical_tag: String,

    /// Background colors treated as "no color"
    pub default_backgrounds: Vec<String>,

    /// Color of events whose row carries no background
    pub neutral_color: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            time_keywords: vec![
                "时间".to_string(),
                "Time".to_string(),
                "Date".to_string(),
            ],
            markers: default_markers(),
            non_critical_tag: "non_critical".to_string(),
            default_backgrounds: vec![
                "#FFFFFF".to_string(),
                "#000000".to_string(),
                "#00FFFFFF".to_string(),
                "transparent".to_string(),
            ],
            neutral_color: "#9CA3AF".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON configuration file; missing fields keep their defaults
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check if a background color means "unstyled"
    pub fn is_default_background(&self, color: &str) -> bool {
        let color = color.trim();
        color.is_empty()
            || self
                .default_backgrounds
                .iter()
                .any(|default| color.eq_ignore_ascii_case(default))
    }

    /// Add a marker rule
    pub fn add_marker(&mut self, rule: MarkerRule) {
        if !self.markers.contains(&rule) {
            self.markers.push(rule);
        }
    }
}
