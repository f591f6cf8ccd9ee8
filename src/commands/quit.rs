use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};

/// Ends the session. A job still running was already cancelled or finished
/// before the prompt came back, so there is nothing to clean up here.
pub struct QuitCommand;

#[async_trait]
impl Command for QuitCommand {
    fn name(&self) -> &str {
        "/quit"
    }

    fn aliases(&self) -> &[&str] {
        &["/exit", "/q", "quit", "exit"]
    }

    fn description(&self) -> &str {
        "leave bankr and print the session tally"
    }

    async fn execute(&self, _args: &str, _info: &SessionInfo<'_>) -> CommandResult {
        CommandResult::Quit
    }
}
