pub mod http;
pub mod mock;

use async_trait::async_trait;

use crate::error::Result;
use crate::job::Job;

/// The remote agent. Could be the hosted HTTP API or a test script.
///
/// One method per endpoint; no retries or polling here, that lives in
/// [`JobClient`](crate::client::JobClient).
#[async_trait]
pub trait AgentApi: Send + Sync {
    /// `POST /agent/prompt`. Returns the freshly created job (normally `pending`).
    async fn submit(&self, prompt: &str) -> Result<Job>;

    /// `GET /agent/job/{id}`. Full snapshot including every status update so far.
    async fn fetch_status(&self, job_id: &str) -> Result<Job>;

    /// `POST /agent/job/{id}/cancel`. May return an already-terminal status.
    async fn cancel(&self, job_id: &str) -> Result<Job>;
}
