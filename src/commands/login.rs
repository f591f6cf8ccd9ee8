use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::auth;
use crate::consts::CREDENTIAL_NAME;

/// Takes the key as an argument: the REPL owns stdin, so the command
/// cannot prompt for it.
pub struct LoginCommand;

#[async_trait]
impl Command for LoginCommand {
    fn name(&self) -> &str {
        "/login"
    }

    fn usage(&self) -> &str {
        "<api-key>"
    }

    fn description(&self) -> &str {
        "store a Bankr API key"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        if args.is_empty() {
            eprintln!("  usage: /login <api-key>");
            eprintln!("  (or quit and run `bankr login` to paste it at a prompt)");
            return CommandResult::Handled;
        }

        if let Err(e) = auth::login(info.db_path, CREDENTIAL_NAME, args) {
            eprintln!("  ✗ login failed: {e:#}");
            return CommandResult::Handled;
        }
        println!("  ✓ API key saved");
        CommandResult::StateChanged(StateChange::Auth)
    }
}
