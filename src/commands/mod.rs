//! Slash commands available at the `bankr>` prompt.
//!
//! Each command is a [`Command`]; [`CommandRegistry`] owns the set, splits
//! `name args`, resolves aliases and renders `/help`. Input that is not a
//! command is a prompt for the agent.

mod cancel;
mod help;
mod history;
mod login;
mod logout;
mod new;
mod quit;
mod status;
mod whoami;

use async_trait::async_trait;
use std::sync::Arc;

use crate::client::JobClient;
use crate::display::SessionStats;
use crate::transcript::Transcript;

/// What a command can see of the running session.
pub struct SessionInfo<'a> {
    pub api_url: &'a str,
    pub auth_status: &'a str,
    pub db_path: &'a str,
    pub stats: SessionStats,
    /// Client for commands that talk to the API (`/status`, `/cancel`).
    pub client: Option<&'a JobClient>,
    pub transcript: Option<&'a dyn Transcript>,
}

/// Something the REPL must rebuild after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    /// Stored credentials changed; the client must be rebuilt.
    Auth,
}

/// Outcome of [`CommandRegistry::dispatch`].
pub enum CommandResult {
    /// Not a command, send input to the agent.
    NotACommand,
    /// Done; read the next line.
    Handled,
    /// Done, and session state changed.
    StateChanged(StateChange),
    /// Exit the REPL.
    Quit,
}

/// One slash command.
#[async_trait]
pub trait Command: Send + Sync {
    /// Primary name, e.g. `"/whoami"`.
    fn name(&self) -> &str;

    /// Alternative names, e.g. `&["/h", "/?"]`.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Argument synopsis for `/help`, e.g. `"<job-id>"`.
    fn usage(&self) -> &str {
        ""
    }

    /// One-line description for `/help`.
    fn description(&self) -> &str;

    /// Run the command. `args` is everything after the command name, trimmed.
    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult;
}

/// Holds registered commands.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Registry holding every built-in command.
    pub fn new() -> Self {
        let commands: Vec<Arc<dyn Command>> = vec![
            Arc::new(help::HelpCommand),
            Arc::new(whoami::WhoamiCommand),
            Arc::new(status::StatusCommand),
            Arc::new(cancel::CancelCommand),
            Arc::new(history::HistoryCommand),
            Arc::new(new::NewCommand),
            Arc::new(login::LoginCommand),
            Arc::new(logout::LogoutCommand),
            Arc::new(quit::QuitCommand),
        ];
        Self { commands }
    }

    /// Register an additional command.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    /// Run the command `input` names, if any.
    pub async fn dispatch(&self, input: &str, info: &SessionInfo<'_>) -> CommandResult {
        let input = input.trim();
        let (cmd, args) = input
            .split_once(char::is_whitespace)
            .map(|(cmd, args)| (cmd, args.trim()))
            .unwrap_or((input, ""));

        // Bare words like `quit` only count when they are the whole input,
        // so "exit my ETH position" still reaches the agent.
        if !cmd.starts_with('/') && !args.is_empty() {
            return CommandResult::NotACommand;
        }

        for command in &self.commands {
            if cmd == command.name() || command.aliases().contains(&cmd) {
                // /help needs the registry to list all commands
                if command.name() == "/help" {
                    print!("{}", self.help_text());
                    return CommandResult::Handled;
                }
                return command.execute(args, info).await;
            }
        }

        if cmd.starts_with('/') {
            println!("  unknown command {cmd}; /help lists them");
            return CommandResult::Handled;
        }

        CommandResult::NotACommand
    }

    /// `/help` output, one aligned line per command.
    pub fn help_text(&self) -> String {
        let entries: Vec<(String, &str)> = self
            .commands
            .iter()
            .map(|c| (format_label(c.name(), c.usage(), c.aliases()), c.description()))
            .collect();

        let max_width = entries
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(10);

        let mut out = String::new();
        for (label, desc) in &entries {
            out.push_str(&format!("  {label:<max_width$}  {desc}\n"));
        }
        out.push_str("  anything else is sent to the agent; Ctrl+C cancels a running job\n");
        out
    }

    /// Primary names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// Every name and alias that triggers a command.
    pub fn all_triggers(&self) -> Vec<&str> {
        let mut triggers = Vec::new();
        for cmd in &self.commands {
            triggers.push(cmd.name());
            triggers.extend_from_slice(cmd.aliases());
        }
        triggers
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn format_label(name: &str, usage: &str, aliases: &[&str]) -> String {
    let mut label = name.to_string();
    if !usage.is_empty() {
        label.push(' ');
        label.push_str(usage);
    }
    if !aliases.is_empty() {
        label.push_str(&format!(" ({})", aliases.join(", ")));
    }
    label
}
