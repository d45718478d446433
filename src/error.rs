use crate::domain::variant::AttemptDiagnostic;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Digest configuration error: {0}")]
    DigestConfig(String),
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("No initiate variant produced a verified reply ({} attempts)", attempts.len())]
    RemoteProtocolAmbiguity { attempts: Vec<AttemptDiagnostic> },
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Remote endpoint returned HTTP {status}: {body}")]
    RemoteStatus { status: u16, body: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
