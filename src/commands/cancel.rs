use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::display::render_error;

pub struct CancelCommand;

#[async_trait]
impl Command for CancelCommand {
    fn name(&self) -> &str {
        "/cancel"
    }

    fn usage(&self) -> &str {
        "<job-id>"
    }

    fn description(&self) -> &str {
        "ask the agent to cancel a job"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        if args.is_empty() {
            eprintln!("  usage: /cancel <job-id>");
            return CommandResult::Handled;
        }
        let Some(client) = info.client else {
            eprintln!("  ✗ not connected (run /login first)");
            return CommandResult::Handled;
        };

        match client.cancel(args).await {
            Ok(job) => println!("  job {} is {}", job.id, job.status),
            Err(e) => eprintln!("  {}", render_error(&e)),
        }
        CommandResult::Handled
    }
}
