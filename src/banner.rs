//! Startup banner and session summary display.

use crate::client::PollOptions;
use crate::display::SessionStats;

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub api_url: &'a str,
    pub auth_status: &'a str,
    pub database: &'a str,
    pub poll: &'a PollOptions,
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║              B A N K R                ║
   ║    prompts in, transactions out       ║
   ╚═══════════════════════════════════════╝

   version   {}
   api       {}
   auth      {}
   polling   every {} ms, up to {} attempts
   database  {}

   Ctrl+C cancels a running job, /help lists commands.
"#,
        env!("CARGO_PKG_VERSION"),
        info.api_url,
        info.auth_status,
        info.poll.interval.as_millis(),
        info.poll.max_attempts,
        info.database,
    );
}

/// Print the session summary (job tally + farewell).
pub fn print_session_summary(stats: SessionStats) {
    if stats.total() > 0 {
        println!(
            "session: {} completed, {} failed, {} cancelled, {} timed out, {} errors",
            stats.completed, stats.failed, stats.cancelled, stats.timed_out, stats.errors,
        );
    }
    println!("goodbye.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_banner_does_not_panic() {
        let poll = PollOptions::default();
        let info = BannerInfo {
            api_url: "https://api.bankr.bot",
            auth_status: "not authenticated",
            database: ":memory:",
            poll: &poll,
        };
        print_banner(&info);
    }

    #[test]
    fn print_session_summary_with_jobs() {
        let stats = SessionStats {
            completed: 2,
            failed: 1,
            ..SessionStats::default()
        };
        print_session_summary(stats);
    }

    #[test]
    fn print_session_summary_empty() {
        // Should only print "goodbye." with no tally line
        print_session_summary(SessionStats::default());
    }
}
