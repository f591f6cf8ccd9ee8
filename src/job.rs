//! Job model shared by the API layer and the poller.
//!
//! Field names follow the wire format of the agent API (`camelCase`), so
//! these types deserialize straight from `GET /agent/job/{id}`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a remote job.
///
/// Statuses the client does not know are kept verbatim in [`JobStatus::Other`]
/// so they still compare (and change-detect) correctly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Other(String),
}

impl JobStatus {
    /// `completed`, `failed` and `cancelled` are final: no transition follows.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Human-readable line shown when the job enters this status.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::Pending => "Thinking...",
            Self::Processing => "Working on it...",
            Self::Completed => "Done!",
            Self::Failed => "Something went wrong",
            Self::Cancelled => "Cancelled",
            Self::Other(_) => "Processing...",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A progress message the agent emitted while working.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}

impl StatusUpdate {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: String::new(),
        }
    }
}

/// Extra details attached to a transaction the agent prepared or executed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMetadata {
    #[serde(default)]
    pub human_readable_message: Option<String>,
    #[serde(default)]
    pub input_token_ticker: Option<String>,
    #[serde(default)]
    pub output_token_ticker: Option<String>,
    #[serde(default)]
    pub input_token_amount: Option<String>,
    #[serde(default)]
    pub output_token_amount: Option<String>,
    /// Anything else the API sent (raw transaction, chain data, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub metadata: Option<TransactionMetadata>,
}

impl Transaction {
    /// One-line description: the API's own message if present, else a
    /// swap summary built from the token fields, else the transaction type.
    pub fn summary(&self) -> String {
        let Some(meta) = &self.metadata else {
            return self.kind.clone();
        };
        if let Some(msg) = &meta.human_readable_message {
            return msg.clone();
        }
        match (&meta.input_token_ticker, &meta.output_token_ticker) {
            (Some(input), Some(output)) => format!(
                "{} {} → {} {}",
                meta.input_token_amount.as_deref().unwrap_or("?"),
                input,
                meta.output_token_amount.as_deref().unwrap_or("?"),
                output
            ),
            _ => self.kind.clone(),
        }
    }
}

/// Snapshot of one remote job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "jobId")]
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub prompt: String,
    /// Agent reply; present once the job completed.
    #[serde(default, rename = "response")]
    pub result: Option<String>,
    /// Failure reason; present once the job failed.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub status_updates: Vec<StatusUpdate>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub rich_data: Vec<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub cancelled_at: Option<String>,
    /// Server-side processing time in milliseconds.
    #[serde(default)]
    pub processing_time: Option<f64>,
}

impl Job {
    pub fn new(id: impl Into<String>, status: impl Into<JobStatus>) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            ..Self::default()
        }
    }

    pub fn with_updates<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.status_updates = messages.into_iter().map(StatusUpdate::new).collect();
        self
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Answer to `POST /agent/prompt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
