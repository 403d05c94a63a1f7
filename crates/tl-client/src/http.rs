//! reqwest implementation of [`TimelineBackend`]

use std::sync::Arc;

use anyhow::Context;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tl_core::{Dataset, DebugPreview, PreviewRequest, Row, TimelineBackend};
use tracing::{debug, info};

use crate::{ClientConfig, ClientError};

const UPLOAD_PATH: &str = "/api/upload";
const PREVIEW_RULES_PATH: &str = "/api/debug/preview_rules";

/// HTTP client for the upload and rule-evaluation endpoints
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            base_url: config.normalized_base_url()?,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a spreadsheet document as the multipart field `file`
    pub async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<Dataset, ClientError> {
        let url = format!("{}{}", self.base_url, UPLOAD_PATH);
        debug!("Uploading {} ({} bytes) to {}", file_name, bytes.len(), url);

        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);
        let response = self.client.post(&url).multipart(form).send().await?;
        let dataset: Dataset = decode(response).await?;

        info!(
            "Received sheet '{}' with {} rows, {} columns",
            dataset.sheet_name,
            dataset.rows.len(),
            dataset.headers.len()
        );
        Ok(dataset)
    }

    /// Ask the rule engine to classify the full row set
    pub async fn preview(&self, rows: &[Arc<Row>], context: &str) -> Result<DebugPreview, ClientError> {
        let url = format!("{}{}", self.base_url, PREVIEW_RULES_PATH);
        debug!("Requesting rule preview for {} rows", rows.len());

        let request = PreviewRequest { rows, context };
        let response = self.client.post(&url).json(&request).send().await?;
        let preview: DebugPreview = decode(response).await?;

        info!(
            "Rule preview: {} delayed, {} attribute, {} ignored",
            preview.delayed_rows.len(),
            preview.attribute_rows.len(),
            preview.ignored_rows.len()
        );
        Ok(preview)
    }
}

/// Reject non-2xx responses, then decode the JSON body
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait::async_trait]
impl TimelineBackend for HttpBackend {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> anyhow::Result<Dataset> {
        self.upload_file(file_name, bytes)
            .await
            .with_context(|| format!("Failed to upload {}", file_name))
    }

    async fn preview_rules(&self, rows: &[Arc<Row>], context: &str) -> anyhow::Result<DebugPreview> {
        self.preview(rows, context)
            .await
            .context("Failed to preview rules")
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tl_core::{Cell, RowId};
    use wiremock::matchers::{body_partial_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn backend(server: &MockServer) -> HttpBackend {
        HttpBackend::new(&ClientConfig::new(format!("{}/", server.uri()))).unwrap()
    }

    #[tokio::test]
    async fn test_upload_decodes_dataset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .and(header_exists("content-type"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sheet_name": "时间线",
                "headers": ["时间", "合同号", "描述"],
                "rows": [
                    {"id": 2, "cells": {
                        "时间": {"value": "2025-12-08 10:18:04"},
                        "描述": {"value": "电梯故障", "style": {"backgroundColor": "#FFC7CE"}}
                    }}
                ],
                "server_version": "1.2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dataset = backend(&server).await.upload_file("log.xlsx", vec![1, 2, 3]).await.unwrap();
        assert_eq!(dataset.sheet_name, "时间线");
        assert_eq!(dataset.rows[0].id, RowId::Int(2));
        assert_eq!(
            dataset.rows[0].cell("描述").unwrap().background_color(),
            Some("#FFC7CE")
        );
        assert_eq!(dataset.server_version.as_deref(), Some("1.2"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = backend(&server).await.upload_file("log.xlsx", Vec::new()).await.unwrap_err();
        match err {
            ClientError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = backend(&server).await.upload_file("log.xlsx", Vec::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_preview_sends_rows_and_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/debug/preview_rules"))
            .and(body_partial_json(json!({"context": "elevator 3"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "delayed_rows": [{"id": 1, "time": 100, "delay_min": 2.5, "content": "slow"}],
                "ignored_rows": [{"id": "x", "reason": "heartbeat"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let rows = vec![Arc::new(Row::new(1).with_cell("描述", Cell::new("slow")))];
        let backend = backend(&server).await;
        let preview = backend.preview_rules(&rows, "elevator 3").await.unwrap();

        assert_eq!(preview.delayed_rows[0].delay_min, 2.5);
        assert!(preview.attribute_rows.is_empty());
        assert_eq!(preview.ignored_rows[0].id, RowId::from("x"));
        assert_eq!(backend.endpoint(), server.uri());
    }

    #[tokio::test]
    async fn test_trait_errors_carry_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/debug/preview_rules"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;

        let err = backend(&server).await.preview_rules(&[], "").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to preview rules");
        assert!(err.root_cause().to_string().contains("422"));
    }
}
