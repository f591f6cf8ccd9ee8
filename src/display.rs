//! Terminal rendering of jobs and poll results.

use std::fmt::Display;
use std::fmt::Write as _;

use crate::client::{PollObserver, PollOutcome};
use crate::job::{Job, JobStatus};
use crate::spinner::SpinnerHandle;

/// What the user sees once a job is over.
pub fn render_job(job: &Job) -> String {
    match job.status {
        JobStatus::Completed => {
            let mut out = job
                .result
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "No response received.".to_string());
            if !job.transactions.is_empty() {
                out.push_str("\n\nTransactions:");
                for tx in &job.transactions {
                    let _ = write!(out, "\n  • {}", tx.summary());
                }
            }
            out
        }
        JobStatus::Failed => format!(
            "✗ Error: {}",
            job.error.as_deref().unwrap_or("Job failed")
        ),
        JobStatus::Cancelled => "Job cancelled".to_string(),
        _ => format!(
            "job {} is {}: {}",
            job.id,
            job.status,
            job.status.default_message()
        ),
    }
}

pub fn render_outcome(outcome: &PollOutcome) -> String {
    match outcome {
        PollOutcome::Finished(job) => render_job(job),
        PollOutcome::TimedOut { job, attempts } => format!(
            "Polling timed out after {attempts} attempts; job {} is still {}. \
             Check later with `bankr status {}`.",
            job.id, job.status, job.id
        ),
        PollOutcome::Cancelled { .. } => "Job cancelled".to_string(),
    }
}

pub fn render_error(err: &dyn Display) -> String {
    format!("✗ Error: {err}")
}

/// Full snapshot, for `bankr status` and `/status`.
pub fn render_snapshot(job: &Job) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  job       {}", job.id);
    let _ = writeln!(out, "  status    {}", job.status);
    if !job.prompt.is_empty() {
        let _ = writeln!(out, "  prompt    {}", job.prompt);
    }
    let times = [
        ("created", &job.created_at),
        ("started", &job.started_at),
        ("completed", &job.completed_at),
        ("cancelled", &job.cancelled_at),
    ];
    for (label, value) in times {
        if let Some(value) = value {
            let _ = writeln!(out, "  {label:<9} {value}");
        }
    }
    if let Some(ms) = job.processing_time {
        let _ = writeln!(out, "  took      {:.1}s", ms / 1000.0);
    }
    if !job.status_updates.is_empty() {
        let _ = writeln!(out, "  updates");
        for update in &job.status_updates {
            let _ = writeln!(out, "    · {}", update.message);
        }
    }
    if job.is_terminal() {
        for line in render_job(job).lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    out
}

/// Running tally of jobs in this session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub completed: u32,
    pub failed: u32,
    pub cancelled: u32,
    pub timed_out: u32,
    pub errors: u32,
}

impl SessionStats {
    pub fn record(&mut self, outcome: &PollOutcome) {
        match outcome {
            PollOutcome::Finished(job) => match job.status {
                JobStatus::Completed => self.completed += 1,
                JobStatus::Failed => self.failed += 1,
                _ => self.cancelled += 1,
            },
            PollOutcome::TimedOut { .. } => self.timed_out += 1,
            PollOutcome::Cancelled { .. } => self.cancelled += 1,
        }
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn total(&self) -> u32 {
        self.completed + self.failed + self.cancelled + self.timed_out + self.errors
    }
}

/// Drives a spinner from poll progress: agent updates are printed and
/// become the spinner text; default status text is only shown until the
/// agent says something itself.
pub struct SpinnerObserver {
    spinner: SpinnerHandle,
    job_id: Option<String>,
    heard_from_agent: bool,
}

impl SpinnerObserver {
    pub fn new(spinner: SpinnerHandle) -> Self {
        Self {
            spinner,
            job_id: None,
            heard_from_agent: false,
        }
    }

    /// Id of the job being followed, once known.
    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }
}

impl PollObserver for SpinnerObserver {
    fn on_job_created(&mut self, job_id: &str) {
        self.job_id = Some(job_id.to_string());
        self.spinner.set_message(JobStatus::Pending.default_message());
    }

    fn on_status_change(&mut self, _status: &JobStatus, message: &str) {
        if !self.heard_from_agent {
            self.spinner.set_message(message);
        }
    }

    fn on_agent_update(&mut self, message: &str) {
        self.heard_from_agent = true;
        self.spinner.println(format!("  · {message}"));
        self.spinner.set_message(message);
    }
}
