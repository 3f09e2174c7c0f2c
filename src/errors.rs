// src/errors.rs
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read payload file {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON payload: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Encoding '{encoding}' is unavailable: {reason}")]
    EncodingUnavailable { encoding: String, reason: String },

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Request timed out after {:.2} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("API request failed with status {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Unexpected response body: {0}")]
    InvalidResponse(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
