use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{JobClient, validate_job_id};
use crate::consts::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use crate::error::{BankrError, Result};
use crate::job::{Job, JobStatus};

/// Receives progress while a job is polled.
///
/// Every method defaults to a no-op, so observers only implement what they
/// render. Calls happen inline in the poll loop; keep them quick.
pub trait PollObserver: Send {
    /// The job was created (only called by [`JobClient::execute`]).
    fn on_job_created(&mut self, _job_id: &str) {}

    /// The job entered a status not seen before in this poll.
    fn on_status_change(&mut self, _status: &JobStatus, _message: &str) {}

    /// The agent emitted a new progress message. Never repeated.
    fn on_agent_update(&mut self, _message: &str) {}
}

/// Silent observer.
impl PollObserver for () {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// Pause between two polls.
    pub interval: Duration,
    /// Polls before giving up. One extra fetch follows the last attempt.
    pub max_attempts: usize,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PollOptions {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// How a poll ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The job reached `completed`, `failed` or `cancelled`.
    Finished(Job),
    /// Attempts ran out; `job` is the last snapshot and is not terminal.
    TimedOut { job: Job, attempts: usize },
    /// The cancellation token fired. `last` is the latest snapshot, if any.
    Cancelled { last: Option<Job> },
}

impl PollOutcome {
    pub fn job(&self) -> Option<&Job> {
        match self {
            Self::Finished(job) | Self::TimedOut { job, .. } => Some(job),
            Self::Cancelled { last } => last.as_ref(),
        }
    }

    pub fn into_job(self) -> Option<Job> {
        match self {
            Self::Finished(job) | Self::TimedOut { job, .. } => Some(job),
            Self::Cancelled { last } => last,
        }
    }

    /// Strict view: a timeout becomes [`BankrError::Timeout`], a local
    /// cancellation becomes `Ok(None)`.
    pub fn into_result(self) -> Result<Option<Job>> {
        match self {
            Self::Finished(job) => Ok(Some(job)),
            Self::TimedOut { job, attempts } => Err(BankrError::Timeout {
                job_id: job.id,
                attempts,
            }),
            Self::Cancelled { .. } => Ok(None),
        }
    }
}

/// Bookkeeping for one poll loop. Owned by that loop, never shared.
#[derive(Debug)]
pub struct PollSession {
    job_id: String,
    last_observed_status: Option<JobStatus>,
    delivered_update_count: usize,
    cancel: CancellationToken,
}

impl PollSession {
    pub fn new(job_id: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            job_id: job_id.into(),
            last_observed_status: None,
            delivered_update_count: 0,
            cancel,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn last_observed_status(&self) -> Option<&JobStatus> {
        self.last_observed_status.as_ref()
    }

    pub fn delivered_update_count(&self) -> usize {
        self.delivered_update_count
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Report what is new in `job`: first the unseen suffix of its status
    /// updates, then the status itself if it changed.
    ///
    /// The delivered count never moves backwards, so a shorter list from
    /// the API does not cause replays later.
    pub fn observe(&mut self, job: &Job, observer: &mut dyn PollObserver) {
        if job.status_updates.len() > self.delivered_update_count {
            for update in &job.status_updates[self.delivered_update_count..] {
                observer.on_agent_update(&update.message);
            }
            self.delivered_update_count = job.status_updates.len();
        }

        if self.last_observed_status.as_ref() != Some(&job.status) {
            observer.on_status_change(&job.status, job.status.default_message());
            self.last_observed_status = Some(job.status.clone());
        }
    }
}

impl JobClient {
    /// Follow a job until it is terminal, the attempts run out, or `cancel`
    /// fires.
    ///
    /// Polls every `options.interval`, at most `options.max_attempts` times,
    /// then makes one last fetch and reports it as [`PollOutcome::TimedOut`]
    /// if it is still not terminal. Cancellation aborts an in-flight request
    /// or pause immediately. Errors from a fetch end the loop and are
    /// returned as-is.
    pub async fn poll(
        &self,
        job_id: &str,
        observer: &mut dyn PollObserver,
        options: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        validate_job_id(job_id)?;
        let mut session = PollSession::new(job_id, cancel.clone());
        let mut last: Option<Job> = None;

        for attempt in 1..=options.max_attempts {
            if session.is_cancelled() {
                tracing::debug!(job_id, attempt, "poll stopped by cancellation");
                return Ok(PollOutcome::Cancelled { last });
            }

            let job = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled { last }),
                job = self.api.fetch_status(job_id) => job?,
            };
            tracing::debug!(
                job_id,
                attempt,
                status = %job.status,
                updates = job.status_updates.len(),
                "polled job"
            );

            session.observe(&job, observer);
            if job.is_terminal() {
                tracing::info!(job_id, status = %job.status, attempt, "job finished");
                return Ok(PollOutcome::Finished(job));
            }
            last = Some(job);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled { last }),
                _ = tokio::time::sleep(options.interval) => {}
            }
        }

        if session.is_cancelled() {
            return Ok(PollOutcome::Cancelled { last });
        }
        let job = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled { last }),
            job = self.api.fetch_status(job_id) => job?,
        };
        session.observe(&job, observer);

        if job.is_terminal() {
            tracing::info!(job_id, status = %job.status, "job finished on final check");
            return Ok(PollOutcome::Finished(job));
        }
        tracing::warn!(
            job_id,
            attempts = options.max_attempts,
            status = %job.status,
            "polling timed out"
        );
        Ok(PollOutcome::TimedOut {
            job,
            attempts: options.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        statuses: Vec<JobStatus>,
        updates: Vec<String>,
    }

    impl PollObserver for Recorder {
        fn on_status_change(&mut self, status: &JobStatus, _message: &str) {
            self.statuses.push(status.clone());
        }

        fn on_agent_update(&mut self, message: &str) {
            self.updates.push(message.to_string());
        }
    }

    fn session() -> PollSession {
        PollSession::new("job_1", CancellationToken::new())
    }

    #[test]
    fn observe_delivers_only_new_suffix() {
        let mut session = session();
        let mut rec = Recorder::default();

        session.observe(&Job::new("job_1", "processing").with_updates(["a", "b"]), &mut rec);
        session.observe(&Job::new("job_1", "processing").with_updates(["a", "b"]), &mut rec);
        session.observe(
            &Job::new("job_1", "processing").with_updates(["a", "b", "c"]),
            &mut rec,
        );

        assert_eq!(rec.updates, vec!["a", "b", "c"]);
        assert_eq!(session.delivered_update_count(), 3);
    }

    #[test]
    fn observe_suppresses_repeated_status() {
        let mut session = session();
        let mut rec = Recorder::default();

        for status in ["pending", "pending", "processing", "processing", "completed"] {
            session.observe(&Job::new("job_1", status), &mut rec);
        }

        assert_eq!(
            rec.statuses,
            vec![JobStatus::Pending, JobStatus::Processing, JobStatus::Completed]
        );
        assert_eq!(session.last_observed_status(), Some(&JobStatus::Completed));
    }

    #[test]
    fn shrinking_update_list_does_not_rewind() {
        let mut session = session();
        let mut rec = Recorder::default();

        session.observe(&Job::new("job_1", "processing").with_updates(["a", "b"]), &mut rec);
        session.observe(&Job::new("job_1", "processing").with_updates(["a"]), &mut rec);
        session.observe(&Job::new("job_1", "processing").with_updates(["a", "b"]), &mut rec);

        assert_eq!(rec.updates, vec!["a", "b"]);
        assert_eq!(session.delivered_update_count(), 2);
    }

    #[test]
    fn unknown_status_gets_generic_message() {
        struct Messages(Vec<String>);
        impl PollObserver for Messages {
            fn on_status_change(&mut self, _status: &JobStatus, message: &str) {
                self.0.push(message.to_string());
            }
        }

        let mut session = session();
        let mut msgs = Messages(Vec::new());
        session.observe(&Job::new("job_1", "pending"), &mut msgs);
        session.observe(&Job::new("job_1", "queued_for_gas"), &mut msgs);
        assert_eq!(msgs.0, vec!["Thinking...", "Processing..."]);
    }

    #[test]
    fn session_reflects_token() {
        let token = CancellationToken::new();
        let session = PollSession::new("job_1", token.clone());
        assert!(!session.is_cancelled());
        token.cancel();
        assert!(session.is_cancelled());
        assert_eq!(session.job_id(), "job_1");
    }

    #[test]
    fn outcome_into_result() {
        let done = PollOutcome::Finished(Job::new("j", "completed"));
        assert_eq!(done.into_result().unwrap().unwrap().id, "j");

        let timed_out = PollOutcome::TimedOut {
            job: Job::new("j", "processing"),
            attempts: 3,
        };
        assert!(matches!(
            timed_out.into_result().unwrap_err(),
            BankrError::Timeout { attempts: 3, .. }
        ));

        let cancelled = PollOutcome::Cancelled { last: None };
        assert!(cancelled.into_result().unwrap().is_none());
    }

    #[test]
    fn default_options() {
        let options = PollOptions::default();
        assert_eq!(options.interval, Duration::from_millis(1500));
        assert_eq!(options.max_attempts, 120);
    }
}
