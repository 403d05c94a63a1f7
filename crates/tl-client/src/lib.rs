//! HTTP adapter for the upload and rule-evaluation service

pub mod config;
pub mod http;

use thiserror::Error;

pub use config::ClientConfig;
pub use http::HttpBackend;

/// Errors that can occur talking to the backend
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}
