//! Poll progress as a [`Stream`] instead of callbacks.

use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{JobClient, PollObserver, PollOptions, PollOutcome};
use crate::error::Result;
use crate::job::JobStatus;

/// One item of [`JobClient::poll_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    StatusChanged { status: JobStatus, message: String },
    AgentUpdate { message: String },
    /// Always the last item of a successful stream.
    Finished(PollOutcome),
}

struct ChannelObserver {
    tx: mpsc::UnboundedSender<Result<PollEvent>>,
}

impl PollObserver for ChannelObserver {
    fn on_status_change(&mut self, status: &JobStatus, message: &str) {
        let _ = self.tx.send(Ok(PollEvent::StatusChanged {
            status: status.clone(),
            message: message.to_string(),
        }));
    }

    fn on_agent_update(&mut self, message: &str) {
        let _ = self.tx.send(Ok(PollEvent::AgentUpdate {
            message: message.to_string(),
        }));
    }
}

impl JobClient {
    /// Poll `job_id` in a background task and yield its progress.
    ///
    /// The stream is finite: it ends after [`PollEvent::Finished`] or after
    /// a single `Err`. Dropping it stops the background poll.
    pub fn poll_events(
        &self,
        job_id: &str,
        options: PollOptions,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<PollEvent>> + Send + 'static {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.clone();
        let job_id = job_id.to_string();

        tokio::spawn(async move {
            let mut observer = ChannelObserver { tx: tx.clone() };
            let watcher = tx.clone();
            tokio::select! {
                result = client.poll(&job_id, &mut observer, &options, &cancel) => {
                    let _ = tx.send(result.map(PollEvent::Finished));
                }
                _ = watcher.closed() => {
                    tracing::debug!(job_id = %job_id, "event stream dropped, stopping poll");
                }
            }
        });

        futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
    }
}
