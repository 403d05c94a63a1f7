//! Heartbeat marker table

use serde::{Deserialize, Serialize};

/// Category a heartbeat marker assigns a row to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatKind {
    Device,
    Elevator,
}

/// A literal substring that, found in any content column, classifies the row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerRule {
    pub marker: String,
    pub kind: HeartbeatKind,
}

impl MarkerRule {
    pub fn new(marker: impl Into<String>, kind: HeartbeatKind) -> Self {
        Self {
            marker: marker.into(),
            kind,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        !self.marker.is_empty() && text.contains(&self.marker)
    }
}

/// Device heartbeat marker
pub const DEVICE_HEARTBEAT_MARKER: &str = "装置心跳";

/// Elevator heartbeat marker
pub const ELEVATOR_HEARTBEAT_MARKER: &str = "电梯心跳";

/// The built-in marker table
pub fn default_markers() -> Vec<MarkerRule> {
    vec![
        MarkerRule::new(DEVICE_HEARTBEAT_MARKER, HeartbeatKind::Device),
        MarkerRule::new(ELEVATOR_HEARTBEAT_MARKER, HeartbeatKind::Elevator),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_matching() {
        let rule = MarkerRule::new(DEVICE_HEARTBEAT_MARKER, HeartbeatKind::Device);
        assert!(rule.matches("装置心跳正常"));
        assert!(!rule.matches("电梯心跳正常"));
        assert!(!MarkerRule::new("", HeartbeatKind::Device).matches("anything"));
    }

    #[test]
    fn test_marker_table_deserializes() {
        let rules: Vec<MarkerRule> =
            serde_json::from_str(r#"[{"marker": "心跳包", "kind": "elevator"}]"#).unwrap();
        assert_eq!(rules[0].kind, HeartbeatKind::Elevator);
    }
}
