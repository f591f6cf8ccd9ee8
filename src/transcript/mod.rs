pub mod sqlite;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

use crate::job::{Job, JobStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// One line of the chat: a prompt the user sent, or what came back.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    pub job_id: Option<String>,
    pub status: Option<JobStatus>,
    /// Filled in by the store; ignored on append.
    pub timestamp: String,
}

impl TranscriptEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            job_id: None,
            status: None,
            timestamp: String::new(),
        }
    }

    /// An assistant reply. `job` is absent when the request never produced one.
    pub fn assistant(content: impl Into<String>, job: Option<&Job>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            job_id: job.map(|j| j.id.clone()),
            status: job.map(|j| j.status.clone()),
            timestamp: String::new(),
        }
    }
}

impl fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let who = match self.role {
            Role::User => "you",
            Role::Assistant => "bankr",
        };
        write!(f, "[{}] {who}: {}", self.timestamp, self.content)?;
        if let (Some(id), Some(status)) = (&self.job_id, &self.status) {
            write!(f, "  ({id}, {status})")?;
        }
        Ok(())
    }
}

/// Where the chat is kept. Could be in-memory, SQLite, etc.
#[async_trait]
pub trait Transcript: Send + Sync {
    async fn append(&self, entry: TranscriptEntry) -> Result<()>;
    /// The last `limit` entries, oldest first.
    async fn recent(&self, limit: usize) -> Result<Vec<TranscriptEntry>>;
    async fn clear(&self) -> Result<()>;
}
