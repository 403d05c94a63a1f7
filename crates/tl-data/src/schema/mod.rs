use serde::Serialize;

use crate::config::PipelineConfig;

/// Schema inferrer labelling columns from header names alone
pub struct SchemaInferrer {
    time_keywords: Vec<String>,
}

/// Column roles of a dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Columns {
    /// Time column; `None` only when there are no headers
    pub time_col: Option<String>,

    /// Device column; empty when the dataset has a single column
    pub device_col: String,

    /// Every other column, in header order
    pub content_cols: Vec<String>,
}

impl Columns {
    /// Time column name, empty when absent
    pub fn time_col(&self) -> &str {
        self.time_col.as_deref().unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.time_col.is_none()
    }
}

impl SchemaInferrer {
    /// Create an inferrer with the built-in time keywords
    pub fn new() -> Self {
        Self::from_config(&PipelineConfig::default())
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            time_keywords: config.time_keywords.clone(),
        }
    }

    /// Override the substrings that identify the time column
    pub fn with_time_keywords(mut self, keywords: Vec<String>) -> Self {
        self.time_keywords = keywords;
        self
    }

    /// Infer column roles.
    ///
    /// The first header containing a time keyword is the time column,
    /// falling back to the first header. The second header is the device
    /// column. Headers are never reordered.
    pub fn infer(&self, headers: &[String]) -> Columns {
        let time_col = headers
            .iter()
            .find(|header| self.is_time_header(header))
            .or_else(|| headers.first())
            .cloned();

        let device_col = headers.get(1).cloned().unwrap_or_default();

        let content_cols = headers
            .iter()
            .filter(|header| Some(header.as_str()) != time_col.as_deref() && **header != device_col)
            .cloned()
            .collect();

        Columns {
            time_col,
            device_col,
            content_cols,
        }
    }

    fn is_time_header(&self, header: &str) -> bool {
        self.time_keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && header.contains(keyword.as_str()))
    }
}

impl Default for SchemaInferrer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_time_column_by_keyword() {
        let columns = SchemaInferrer::new().infer(&headers(&["ID", "时间", "内容"]));
        assert_eq!(columns.time_col.as_deref(), Some("时间"));
        assert_eq!(columns.device_col, "时间");
        assert_eq!(columns.content_cols, headers(&["ID", "内容"]));
    }

    #[test]
    fn test_time_column_falls_back_to_first_header() {
        let columns = SchemaInferrer::new().infer(&headers(&["A", "B", "C"]));
        assert_eq!(columns.time_col.as_deref(), Some("A"));
        assert_eq!(columns.device_col, "B");
        assert_eq!(columns.content_cols, headers(&["C"]));
    }

    #[test]
    fn test_first_matching_header_wins() {
        let columns = SchemaInferrer::new().infer(&headers(&["合同号", "Event Date", "装置时间"]));
        assert_eq!(columns.time_col.as_deref(), Some("Event Date"));
    }

    #[test]
    fn test_single_column_has_no_device() {
        let columns = SchemaInferrer::new().infer(&headers(&["Time"]));
        assert_eq!(columns.time_col.as_deref(), Some("Time"));
        assert_eq!(columns.device_col, "");
        assert!(columns.content_cols.is_empty());
    }

    #[test]
    fn test_empty_headers() {
        let columns = SchemaInferrer::new().infer(&[]);
        assert_eq!(columns.time_col, None);
        assert_eq!(columns.device_col, "");
        assert!(columns.content_cols.is_empty());
        assert!(columns.is_empty());
    }

    #[test]
    fn test_device_column_can_coincide_with_time_column() {
        let inferrer = SchemaInferrer::new().with_time_keywords(vec!["When".to_string()]);
        let columns = inferrer.infer(&headers(&["Device", "When", "Text"]));
        assert_eq!(columns.time_col.as_deref(), Some("When"));
        assert_eq!(columns.device_col, "When");
        assert_eq!(columns.content_cols, headers(&["Device", "Text"]));
    }
}
