//! Errors raised while talking to the agent API.

use thiserror::Error;

/// Fallback when a failed response carries neither `error` nor `message`.
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Error)]
pub enum BankrError {
    /// Bad local input, rejected before any request is made.
    #[error("invalid input: {0}")]
    Validation(String),

    /// No API key configured. Raised before any request is made.
    #[error("{0}")]
    Auth(String),

    /// Transport failure: no HTTP response was obtained.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered, but with a non-2xx status or `success: false`.
    #[error("API error ({status_code}): {message}")]
    Remote { status_code: u16, message: String },

    /// The API does not know this job.
    #[error("job not found: {job_id}")]
    NotFound { job_id: String },

    /// Polling gave up before the job reached a terminal state.
    #[error("job {job_id} still running after {attempts} poll attempts")]
    Timeout { job_id: String, attempts: usize },
}

impl BankrError {
    pub fn missing_api_key() -> Self {
        Self::Auth(format!(
            "no Bankr API key found. Run `bankr login` or set {}.",
            crate::consts::API_KEY_ENV
        ))
    }

    /// HTTP status code when the API produced one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Remote { status_code, .. } => Some(*status_code),
            Self::NotFound { .. } => Some(404),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BankrError>;
