//! Progress indicator shown on stderr while a job is in flight.

use std::io::Write;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Braille spinner frames.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Frame interval.
const INTERVAL: Duration = Duration::from_millis(80);

enum Update {
    Message(String),
    Line(String),
}

/// Animated status line owned by a background task.
///
/// Lives on stderr; answers printed to stdout are never overwritten.
/// Talk to it through a [`SpinnerHandle`] and finish with [`Spinner::stop`].
pub struct Spinner {
    handle: JoinHandle<()>,
    updates: mpsc::UnboundedSender<Update>,
    stop: CancellationToken,
}

/// Cheap, cloneable way to talk to a running [`Spinner`].
#[derive(Clone)]
pub struct SpinnerHandle {
    updates: mpsc::UnboundedSender<Update>,
}

impl SpinnerHandle {
    /// Replace the text next to the spinner.
    pub fn set_message(&self, message: impl Into<String>) {
        let _ = self.updates.send(Update::Message(message.into()));
    }

    /// Print a permanent line above the spinner.
    pub fn println(&self, line: impl Into<String>) {
        let _ = self.updates.send(Update::Line(line.into()));
    }
}

impl Spinner {
    /// Start a spinner with the given message (e.g. `"Sending..."`).
    pub fn start(message: &str) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let stop = CancellationToken::new();
        let token = stop.clone();
        let mut message = message.to_string();

        let handle = tokio::spawn(async move {
            let mut i = 0;
            loop {
                let frame = FRAMES[i % FRAMES.len()];
                eprint!("\x1b[2K\r{frame} {message}");
                let _ = std::io::stderr().flush();

                tokio::select! {
                    _ = tokio::time::sleep(INTERVAL) => i += 1,
                    _ = token.cancelled() => break,
                    Some(update) = rx.recv() => match update {
                        Update::Message(m) => message = m,
                        Update::Line(line) => eprintln!("\x1b[2K\r{line}"),
                    },
                }
            }
            // Flush lines queued right before the stop
            while let Ok(update) = rx.try_recv() {
                if let Update::Line(line) = update {
                    eprintln!("\x1b[2K\r{line}");
                }
            }
            eprint!("\x1b[2K\r");
            let _ = std::io::stderr().flush();
        });

        Self {
            handle,
            updates: tx,
            stop,
        }
    }

    pub fn handle(&self) -> SpinnerHandle {
        SpinnerHandle {
            updates: self.updates.clone(),
        }
    }

    /// Wait for the task to print pending lines and erase the status line.
    pub async fn stop(self) {
        self.stop.cancel();
        let _ = self.handle.await;
    }
}
