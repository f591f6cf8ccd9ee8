use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::AgentApi;
use crate::error::{BankrError, Result};
use crate::job::{Job, JobStatus};

/// A scripted agent for tests.
///
/// `fetch_status` walks through the given snapshots in order and keeps
/// returning the last one once the script runs out. Every endpoint counts
/// its calls so tests can assert on network traffic.
pub struct MockAgentApi {
    job_id: String,
    snapshots: Vec<Job>,
    fetch_delay: Duration,
    submit_delay: Duration,
    fail_fetch_at: Option<usize>,
    cancel_script: Mutex<VecDeque<Result<Job>>>,
    prompts: Mutex<Vec<String>>,
    submits: AtomicUsize,
    fetches: AtomicUsize,
    cancels: AtomicUsize,
}

impl MockAgentApi {
    pub fn new(snapshots: Vec<Job>) -> Self {
        let job_id = snapshots
            .first()
            .map(|job| job.id.clone())
            .unwrap_or_else(|| "job_mock".to_string());
        Self {
            job_id,
            snapshots,
            fetch_delay: Duration::ZERO,
            submit_delay: Duration::ZERO,
            fail_fetch_at: None,
            cancel_script: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            submits: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
        }
    }

    /// Id handed out by `submit`.
    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = job_id.into();
        self
    }

    /// Make every `fetch_status` take this long.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    /// Make `submit` take this long before the job exists.
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    /// Fail the n-th `fetch_status` call (0-based) with a 500.
    pub fn failing_fetch_at(mut self, call: usize) -> Self {
        self.fail_fetch_at = Some(call);
        self
    }

    /// Queue a response for the next `cancel` call. Once the queue is empty,
    /// `cancel` answers with a `cancelled` snapshot.
    pub fn push_cancel(&self, response: Result<Job>) {
        self.cancel_script.lock().unwrap().push_back(response);
    }

    pub fn submit_calls(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentApi for MockAgentApi {
    async fn submit(&self, prompt: &str) -> Result<Job> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        Ok(Job {
            prompt: prompt.to_string(),
            ..Job::new(self.job_id.clone(), JobStatus::Pending)
        })
    }

    async fn fetch_status(&self, job_id: &str) -> Result<Job> {
        let i = self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        if self.fail_fetch_at == Some(i) {
            return Err(BankrError::Remote {
                status_code: 500,
                message: format!("MockAgentApi: scripted failure on call {}", i + 1),
            });
        }
        let snapshot = self
            .snapshots
            .get(i)
            .or_else(|| self.snapshots.last())
            .ok_or_else(|| BankrError::NotFound {
                job_id: job_id.to_string(),
            })?;
        Ok(snapshot.clone())
    }

    async fn cancel(&self, job_id: &str) -> Result<Job> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        let scripted = self.cancel_script.lock().unwrap().pop_front();
        match scripted {
            Some(response) => response,
            None => Ok(Job::new(job_id, JobStatus::Cancelled)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_snapshots_then_repeats_last() {
        let api = MockAgentApi::new(vec![
            Job::new("j", "pending"),
            Job::new("j", "completed"),
        ]);
        assert_eq!(api.fetch_status("j").await.unwrap().status, JobStatus::Pending);
        assert_eq!(api.fetch_status("j").await.unwrap().status, JobStatus::Completed);
        assert_eq!(api.fetch_status("j").await.unwrap().status, JobStatus::Completed);
        assert_eq!(api.fetch_calls(), 3);
    }

    #[tokio::test]
    async fn empty_script_is_not_found() {
        let api = MockAgentApi::new(vec![]);
        assert!(matches!(
            api.fetch_status("nope").await.unwrap_err(),
            BankrError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn submit_records_prompt() {
        let api = MockAgentApi::new(vec![]).with_job_id("job_7");
        let job = api.submit("buy 1 ETH").await.unwrap();
        assert_eq!(job.id, "job_7");
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(api.prompts(), vec!["buy 1 ETH".to_string()]);
    }
}
