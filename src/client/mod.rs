//! Job lifecycle on top of an [`AgentApi`]: submit, follow, cancel.
//!
//! [`JobClient`] is cheap to clone; clones share the same API handle and
//! cancellation bookkeeping, so one clone can cancel a job while another
//! is polling it.

mod poll;
mod stream;

pub use poll::{PollObserver, PollOptions, PollOutcome, PollSession};
pub use stream::PollEvent;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::api::AgentApi;
use crate::error::{BankrError, Result};
use crate::job::Job;

/// Jobs remembered by the cancel ledger before the oldest is forgotten.
pub const CANCEL_LEDGER_CAPACITY: usize = 256;

/// Latest known answer for every job a cancel was accepted for, oldest
/// evicted first.
struct CancelLedger {
    answers: HashMap<String, Job>,
    order: VecDeque<String>,
    capacity: usize,
}

impl CancelLedger {
    fn new(capacity: usize) -> Self {
        Self {
            answers: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn get(&self, job_id: &str) -> Option<Job> {
        self.answers.get(job_id).cloned()
    }

    fn record(&mut self, job_id: &str, job: Job) {
        if self.answers.insert(job_id.to_string(), job).is_none() {
            self.order.push_back(job_id.to_string());
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.answers.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.answers.len()
    }
}

#[derive(Clone)]
pub struct JobClient {
    api: Arc<dyn AgentApi>,
    cancelled: Arc<Mutex<CancelLedger>>,
}

impl JobClient {
    pub fn new(api: Arc<dyn AgentApi>) -> Self {
        Self::with_ledger_capacity(api, CANCEL_LEDGER_CAPACITY)
    }

    /// Like [`JobClient::new`], remembering at most `capacity` cancelled jobs.
    pub fn with_ledger_capacity(api: Arc<dyn AgentApi>, capacity: usize) -> Self {
        Self {
            api,
            cancelled: Arc::new(Mutex::new(CancelLedger::new(capacity.max(1)))),
        }
    }

    /// Submit a prompt. The returned job is `pending` with its id assigned.
    pub async fn submit(&self, prompt: &str) -> Result<Job> {
        if prompt.trim().is_empty() {
            return Err(BankrError::Validation("prompt must not be empty".to_string()));
        }
        let job = self.api.submit(prompt).await?;
        tracing::info!(job_id = %job.id, "prompt submitted");
        Ok(job)
    }

    /// Current snapshot of a job.
    pub async fn fetch_status(&self, job_id: &str) -> Result<Job> {
        validate_job_id(job_id)?;
        self.api.fetch_status(job_id).await
    }

    /// Ask the agent to cancel a job.
    ///
    /// The answer may be another terminal status if the job finished first;
    /// callers should accept whatever terminal status comes back. Once a
    /// cancel was accepted for a job, repeat calls never send another
    /// request and never fail: a terminal answer is replayed as is, and a
    /// non-terminal one is refreshed with a status lookup (falling back to
    /// the remembered answer if that lookup fails). A rejection from the API
    /// on the first call is resolved by looking the job up: if it is
    /// terminal, that snapshot is the answer.
    pub async fn cancel(&self, job_id: &str) -> Result<Job> {
        validate_job_id(job_id)?;

        let known = self.cancelled.lock().unwrap().get(job_id);
        if let Some(known) = known {
            return Ok(self.settle_repeat_cancel(job_id, known).await);
        }

        let job = match self.api.cancel(job_id).await {
            Ok(job) => job,
            Err(BankrError::Remote {
                status_code,
                message,
            }) => {
                let job = self.api.fetch_status(job_id).await?;
                if !job.is_terminal() {
                    return Err(BankrError::Remote {
                        status_code,
                        message,
                    });
                }
                tracing::debug!(job_id, status = %job.status, "cancel rejected, job already terminal");
                job
            }
            Err(e) => return Err(e),
        };

        tracing::info!(job_id, status = %job.status, "cancel requested");
        self.cancelled.lock().unwrap().record(job_id, job.clone());
        Ok(job)
    }

    async fn settle_repeat_cancel(&self, job_id: &str, known: Job) -> Job {
        if known.is_terminal() {
            tracing::debug!(job_id, status = %known.status, "cancel already settled");
            return known;
        }
        match self.api.fetch_status(job_id).await {
            Ok(job) => {
                tracing::debug!(job_id, status = %job.status, "cancel already requested");
                self.cancelled.lock().unwrap().record(job_id, job.clone());
                job
            }
            Err(e) => {
                tracing::debug!(job_id, error = %e, "lookup after repeat cancel failed");
                known
            }
        }
    }

    /// Optimistic stop: trip the poll loop's token, then ask the agent to
    /// cancel. Failures are logged, not returned, since the job may simply
    /// have finished already.
    pub async fn stop(&self, job_id: &str, cancel: &CancellationToken) -> Option<Job> {
        cancel.cancel();
        match self.cancel(job_id).await {
            Ok(job) => Some(job),
            Err(e) => {
                tracing::warn!(job_id, error = %e, "cancel failed, ignoring");
                None
            }
        }
    }

    /// Submit a prompt and follow the job to the end.
    ///
    /// The observer hears about the job id as soon as it exists, so a
    /// caller can cancel it while this future is still running. The submit
    /// request itself is never abandoned: if `cancel` fires while it is in
    /// flight, the job it creates is cancelled as soon as its id is known.
    pub async fn execute(
        &self,
        prompt: &str,
        observer: &mut dyn PollObserver,
        options: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        if cancel.is_cancelled() {
            return Ok(PollOutcome::Cancelled { last: None });
        }
        let job = self.submit(prompt).await?;
        observer.on_job_created(&job.id);

        if cancel.is_cancelled() {
            tracing::info!(job_id = %job.id, "cancelled during submit, cancelling created job");
            let last = match self.cancel(&job.id).await {
                Ok(answer) => answer,
                Err(e) => {
                    tracing::warn!(job_id = %job.id, error = %e, "cancel failed, ignoring");
                    job
                }
            };
            return Ok(PollOutcome::Cancelled { last: Some(last) });
        }
        self.poll(&job.id, observer, options, cancel).await
    }
}

/// Job ids are opaque but always URL-safe: ASCII letters, digits, `_`, `-`.
fn validate_job_id(job_id: &str) -> Result<()> {
    if job_id.trim().is_empty() {
        return Err(BankrError::Validation("job id must not be empty".to_string()));
    }
    let url_safe = job_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !url_safe {
        return Err(BankrError::Validation(format!("invalid job id: {job_id:?}")));
    }
    Ok(())
}
