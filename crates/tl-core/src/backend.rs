//! Seam to the external collaborators

use std::sync::Arc;

use crate::debug::DebugPreview;
use crate::model::{Dataset, Row};

/// Upload and rule-evaluation service
#[async_trait::async_trait]
pub trait TimelineBackend: Send + Sync {
    /// Convert a spreadsheet document into a dataset
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> anyhow::Result<Dataset>;

    /// Classify the full row set into delayed/attribute/ignored buckets
    async fn preview_rules(&self, rows: &[Arc<Row>], context: &str) -> anyhow::Result<DebugPreview>;

    /// Where requests are sent, for logging
    fn endpoint(&self) -> &str;
}
