//! Generation pipeline error taxonomy.
//!
//! Every failure mode the pipeline can hit is a distinct variant so callers
//! can surface a distinguishable result; quota refusals in particular must
//! read differently from a generic forbidden.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Document not found")]
    NotFound,

    #[error("Forbidden: you do not own this document")]
    Forbidden,

    #[error("Monthly quota reached. Upgrade to Pro for unlimited generation.")]
    QuotaExceeded,

    #[error("Valid transcript is required ({0})")]
    InvalidInput(&'static str),

    #[error("A generation for this document is already in progress")]
    Conflict,

    #[error("Model provider request failed: {0}")]
    ModelUnavailable(String),

    #[error("Failed to parse model response: {0}")]
    ParseError(&'static str),

    #[error("Failed to persist generated document: {0}")]
    Persistence(String),
}

impl GenerateError {
    /// Stable machine-readable kind, used in API bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerateError::MissingParameter(_) => "missing_parameter",
            GenerateError::Unauthorized => "unauthorized",
            GenerateError::NotFound => "not_found",
            GenerateError::Forbidden => "forbidden",
            GenerateError::QuotaExceeded => "quota_exceeded",
            GenerateError::InvalidInput(_) => "invalid_input",
            GenerateError::Conflict => "conflict",
            GenerateError::ModelUnavailable(_) => "model_unavailable",
            GenerateError::ParseError(_) => "generation_parse_error",
            GenerateError::Persistence(_) => "persistence_error",
        }
    }
}
