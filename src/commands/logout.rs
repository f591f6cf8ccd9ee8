use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::auth;
use crate::consts::CREDENTIAL_NAME;

pub struct LogoutCommand;

#[async_trait]
impl Command for LogoutCommand {
    fn name(&self) -> &str {
        "/logout"
    }

    fn description(&self) -> &str {
        "forget the stored API key"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        if let Err(e) = auth::logout(info.db_path, CREDENTIAL_NAME) {
            eprintln!("  ✗ {e:#}");
            return CommandResult::Handled;
        }
        println!("  ✓ logged out");
        CommandResult::StateChanged(StateChange::Auth)
    }
}
