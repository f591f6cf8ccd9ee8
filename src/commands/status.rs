use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::display::{render_error, render_snapshot};

pub struct StatusCommand;

#[async_trait]
impl Command for StatusCommand {
    fn name(&self) -> &str {
        "/status"
    }

    fn usage(&self) -> &str {
        "<job-id>"
    }

    fn description(&self) -> &str {
        "show the current state of a job"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        if args.is_empty() {
            eprintln!("  usage: /status <job-id>");
            return CommandResult::Handled;
        }
        let Some(client) = info.client else {
            eprintln!("  ✗ not connected (run /login first)");
            return CommandResult::Handled;
        };

        match client.fetch_status(args).await {
            Ok(job) => print!("{}", render_snapshot(&job)),
            Err(e) => eprintln!("  {}", render_error(&e)),
        }
        CommandResult::Handled
    }
}
