use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::consts::DEFAULT_HISTORY_LIMIT;

pub struct HistoryCommand;

#[async_trait]
impl Command for HistoryCommand {
    fn name(&self) -> &str {
        "/history"
    }

    fn usage(&self) -> &str {
        "[count]"
    }

    fn description(&self) -> &str {
        "show recent prompts and replies"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(transcript) = info.transcript else {
            eprintln!("  ✗ history not available");
            return CommandResult::Handled;
        };
        let limit = if args.is_empty() {
            DEFAULT_HISTORY_LIMIT
        } else {
            match args.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    eprintln!("  usage: /history [count]");
                    return CommandResult::Handled;
                }
            }
        };

        match transcript.recent(limit).await {
            Ok(entries) if entries.is_empty() => println!("  (no history yet)"),
            Ok(entries) => {
                for entry in entries {
                    println!("  {entry}");
                }
            }
            Err(e) => eprintln!("  ✗ failed to read history: {e}"),
        }
        CommandResult::Handled
    }
}
