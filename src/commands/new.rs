use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};

pub struct NewCommand;

#[async_trait]
impl Command for NewCommand {
    fn name(&self) -> &str {
        "/new"
    }

    fn description(&self) -> &str {
        "start a new conversation (clear history)"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(transcript) = info.transcript else {
            eprintln!("  ✗ history not available");
            return CommandResult::Handled;
        };

        if let Err(e) = transcript.clear().await {
            eprintln!("  ✗ failed to clear history: {e}");
            return CommandResult::Handled;
        }

        println!("  ✓ history cleared");
        CommandResult::Handled
    }
}
