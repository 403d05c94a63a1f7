//! Wire types of the rule-debug preview exchange

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::{CellValue, Row, RowId};

/// Request body sent to the rule-evaluation service
#[derive(Debug, Serialize)]
pub struct PreviewRequest<'a> {
    /// The entire, unfiltered row set
    pub rows: &'a [Arc<Row>],
    pub context: &'a str,
}

/// Row the rule engine considers delayed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayedRow {
    pub id: RowId,
    #[serde(default)]
    pub time: Option<CellValue>,
    pub delay_min: f64,
    #[serde(default)]
    pub content: String,
}

/// Row from which the rule engine extracted attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRow {
    pub id: RowId,
    #[serde(default)]
    pub time: Option<CellValue>,
    #[serde(default)]
    pub extracted_attrs: Vec<String>,
    #[serde(default)]
    pub content: String,
}

/// Row the rule engine skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgnoredRow {
    pub id: RowId,
    #[serde(default)]
    pub time: Option<CellValue>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub content: String,
}

/// Categorized response of the rule-evaluation service, kept as received
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugPreview {
    #[serde(default)]
    pub delayed_rows: Vec<DelayedRow>,
    #[serde(default)]
    pub attribute_rows: Vec<AttributeRow>,
    #[serde(default)]
    pub ignored_rows: Vec<IgnoredRow>,
}

impl DebugPreview {
    pub fn total(&self) -> usize {
        self.delayed_rows.len() + self.attribute_rows.len() + self.ignored_rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cell;

    #[test]
    fn test_request_body_shape() {
        let rows = vec![Arc::new(Row::new(2).with_cell("描述", Cell::new("电梯故障")))];
        let body = serde_json::to_value(PreviewRequest { rows: &rows, context: "合同号 474" }).unwrap();

        assert_eq!(body["context"], "合同号 474");
        assert_eq!(body["rows"][0]["id"], 2);
        assert_eq!(body["rows"][0]["cells"]["描述"]["value"], "电梯故障");
    }

    #[test]
    fn test_response_decoding() {
        let body = r#"{
            "delayed_rows": [{"id": 3, "time": "2025-12-08 10:18:04", "delay_min": 12.5, "content": "门锁故障"}],
            "attribute_rows": [{"id": 4, "time": null, "extracted_attrs": ["floor=3"], "content": "x"}],
            "ignored_rows": [{"id": "r9", "time": 1700000000000, "reason": "heartbeat", "content": "装置心跳"}]
        }"#;
        let preview: DebugPreview = serde_json::from_str(body).unwrap();

        assert_eq!(preview.total(), 3);
        assert_eq!(preview.delayed_rows[0].delay_min, 12.5);
        assert_eq!(preview.attribute_rows[0].time, None);
        assert_eq!(preview.ignored_rows[0].id, RowId::from("r9"));
    }
}
