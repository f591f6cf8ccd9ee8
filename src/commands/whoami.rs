use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};

pub struct WhoamiCommand;

#[async_trait]
impl Command for WhoamiCommand {
    fn name(&self) -> &str {
        "/whoami"
    }

    fn description(&self) -> &str {
        "show API endpoint, auth status, and session tally"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        println!("  api       {}", info.api_url);
        println!("  auth      {}", info.auth_status);
        println!("  database  {}", info.db_path);
        println!(
            "  jobs      {} completed, {} failed, {} cancelled",
            info.stats.completed, info.stats.failed, info.stats.cancelled
        );
        CommandResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::test_info;

    #[tokio::test]
    async fn returns_handled() {
        assert!(matches!(
            WhoamiCommand.execute("", &test_info()).await,
            CommandResult::Handled
        ));
    }

    #[test]
    fn metadata() {
        assert_eq!(WhoamiCommand.name(), "/whoami");
        assert!(WhoamiCommand.aliases().is_empty());
    }
}
