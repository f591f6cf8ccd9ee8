use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use bankr::api::http::HttpAgentApi;
use bankr::auth::{self, CredentialStore};
use bankr::banner::{BannerInfo, print_banner, print_session_summary};
use bankr::client::{JobClient, PollEvent, PollOptions, PollOutcome};
use bankr::commands::{CommandRegistry, CommandResult, SessionInfo, StateChange};
use bankr::config::{self, ClientConfig, ConfigStore, KNOWN_KEYS};
use bankr::consts::{API_KEY_ENV, CREDENTIAL_NAME, default_db_path};
use bankr::display::{
    SessionStats, SpinnerObserver, render_error, render_outcome, render_snapshot,
};
use bankr::job::{Job, JobStatus};
use bankr::logging;
use bankr::spinner::Spinner;
use bankr::transcript::sqlite::SqliteTranscript;
use bankr::transcript::{Transcript, TranscriptEntry};

#[derive(Parser)]
#[command(name = "bankr", version, about = "Talk to the Bankr agent from your terminal.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Agent API base URL (overrides stored config and BANKR_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// SQLite database for credentials, config and history (use :memory: for ephemeral)
    #[arg(short, long, global = true)]
    db: Option<String>,

    /// Milliseconds between two status polls
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    /// Polls before giving up on a job
    #[arg(long, global = true)]
    max_attempts: Option<usize>,

    /// Debug logging on stderr (BANKR_LOG overrides)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Send one prompt, wait for the answer, and exit
    Prompt {
        /// Prompt text; multiple words are joined with spaces
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Show a job's current state
    Status {
        job_id: String,
        /// Keep polling and print progress until the job ends
        #[arg(short, long, default_value_t = false)]
        watch: bool,
    },
    /// Ask the agent to cancel a job
    Cancel { job_id: String },
    /// Store a Bankr API key
    Login {
        /// Key to store; read from stdin when omitted
        #[arg(long)]
        key: Option<String>,
    },
    /// Forget the stored API key
    Logout,
    /// Read or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print one setting
    Get { key: String },
    /// Store a setting
    Set { key: String, value: String },
    /// Remove a stored setting
    Unset { key: String },
    /// Print every stored setting
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => default_db_path().to_string_lossy().into_owned(),
    };
    ensure_parent_dir(&db_path)?;

    let store = ConfigStore::open(&db_path)?;

    // Subcommands that never talk to the agent
    match &cli.command {
        Some(Command::Login { key }) => return handle_login(&db_path, key.as_deref()),
        Some(Command::Logout) => {
            auth::logout(&db_path, CREDENTIAL_NAME)?;
            println!("✓ Logged out.");
            return Ok(());
        }
        Some(Command::Config { action }) => return handle_config(&store, action),
        _ => {}
    }

    let options = config::resolve_poll_options(&store, cli.interval_ms, cli.max_attempts)?;
    let (client, client_config, auth_status) =
        connect(&db_path, &store, cli.api_url.clone())?;

    match cli.command {
        Some(Command::Prompt { text }) => {
            let transcript = SqliteTranscript::new(&db_path)?;
            let prompt = text.join(" ");
            let mut stats = SessionStats::default();
            // Already rendered; only the exit code is left to decide
            let succeeded = matches!(
                run_prompt(&client, &prompt, &options, &transcript, &mut stats).await,
                Ok(PollOutcome::Finished(job)) if job.status == JobStatus::Completed
            );
            if !succeeded {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Status { job_id, watch }) => {
            if watch {
                watch_job(&client, &job_id, options).await
            } else {
                let job = client.fetch_status(&job_id).await?;
                print!("{}", render_snapshot(&job));
                Ok(())
            }
        }
        Some(Command::Cancel { job_id }) => {
            let job = client.cancel(&job_id).await?;
            println!("job {} is {}", job.id, job.status);
            Ok(())
        }
        Some(Command::Login { .. } | Command::Logout | Command::Config { .. }) => Ok(()),
        None => {
            repl(
                &db_path,
                &store,
                cli.api_url,
                &options,
                client,
                client_config,
                auth_status,
            )
            .await
        }
    }
}

fn ensure_parent_dir(db_path: &str) -> anyhow::Result<()> {
    if db_path == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = Path::new(db_path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

/// Resolve credentials and config into a ready client plus its auth label.
fn connect(
    db_path: &str,
    store: &ConfigStore,
    flag_url: Option<String>,
) -> anyhow::Result<(JobClient, ClientConfig, String)> {
    let credentials = CredentialStore::open(db_path)?;
    let resolved = credentials.resolve(CREDENTIAL_NAME, API_KEY_ENV)?;
    let auth_status = auth::auth_status(resolved.as_ref());
    let client_config = ClientConfig::resolve(flag_url, store, resolved.map(|(key, _)| key))?;
    tracing::debug!(config = ?client_config, "client configured");

    let api = HttpAgentApi::new(client_config.clone())?;
    Ok((JobClient::new(Arc::new(api)), client_config, auth_status))
}

/// Submit, follow with a spinner, print the answer, and record it.
/// Ctrl+C while the job runs cancels the job, not the program.
async fn run_prompt(
    client: &JobClient,
    prompt: &str,
    options: &PollOptions,
    transcript: &dyn Transcript,
    stats: &mut SessionStats,
) -> anyhow::Result<PollOutcome> {
    if let Err(e) = transcript.append(TranscriptEntry::user(prompt)).await {
        tracing::warn!(error = %e, "failed to record prompt");
    }

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let spinner = Spinner::start("Sending...");
    let mut observer = SpinnerObserver::new(spinner.handle());
    let result = client.execute(prompt, &mut observer, options, &cancel).await;
    spinner.stop().await;
    interrupt.abort();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            stats.record_error();
            eprintln!("{}", render_error(&e));
            record_reply(transcript, &render_error(&e), None).await;
            return Err(e.into());
        }
    };

    let outcome = match (outcome, observer.job_id()) {
        (PollOutcome::Cancelled { last }, Some(job_id)) => {
            let settled = client.stop(job_id, &cancel).await;
            PollOutcome::Cancelled {
                last: settled.or(last),
            }
        }
        (outcome, _) => outcome,
    };

    stats.record(&outcome);
    let rendered = render_outcome(&outcome);
    println!("\n{rendered}");
    record_reply(transcript, &rendered, outcome.job()).await;
    Ok(outcome)
}

async fn record_reply(transcript: &dyn Transcript, text: &str, job: Option<&Job>) {
    if let Err(e) = transcript
        .append(TranscriptEntry::assistant(text, job))
        .await
    {
        tracing::warn!(error = %e, "failed to record reply");
    }
}

/// `bankr status --watch`: print progress events until the job ends.
async fn watch_job(client: &JobClient, job_id: &str, options: PollOptions) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let events = client.poll_events(job_id, options, cancel.clone());
    let mut events = Box::pin(events);

    loop {
        let event = tokio::select! {
            event = events.next() => event,
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                println!("\nstopped watching {job_id}");
                return Ok(());
            }
        };
        match event {
            Some(Ok(PollEvent::StatusChanged { status, message })) => {
                println!("  [{status}] {message}");
            }
            Some(Ok(PollEvent::AgentUpdate { message })) => println!("  · {message}"),
            Some(Ok(PollEvent::Finished(outcome))) => {
                println!("\n{}", render_outcome(&outcome));
                outcome.into_result()?;
                return Ok(());
            }
            Some(Err(e)) => return Err(e.into()),
            None => return Ok(()),
        }
    }
}

fn handle_login(db_path: &str, key: Option<&str>) -> anyhow::Result<()> {
    let key = match key {
        Some(key) => key.to_string(),
        None => {
            print!("Paste your Bankr API key: ");
            io::stdout().flush()?;
            let mut key = String::new();
            io::stdin().read_line(&mut key)?;
            key
        }
    };
    auth::login(db_path, CREDENTIAL_NAME, &key)?;
    println!("✓ API key saved to {db_path}");
    Ok(())
}

fn handle_config(store: &ConfigStore, action: &ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match store.get(key)? {
            Some(value) => println!("{value}"),
            None => bail!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            config::validate_setting(key, value)?;
            store.set(key, value)?;
            println!("✓ {key} = {value}");
        }
        ConfigAction::Unset { key } => {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                bail!("unknown config key {key:?} (known: {})", KNOWN_KEYS.join(", "));
            }
            store.remove(key)?;
            println!("✓ {key} unset");
        }
        ConfigAction::List => {
            let pairs = store.list()?;
            if pairs.is_empty() {
                println!("(no stored settings)");
            }
            for (key, value) in pairs {
                println!("{key} = {value}");
            }
        }
    }
    Ok(())
}

async fn repl(
    db_path: &str,
    store: &ConfigStore,
    flag_url: Option<String>,
    options: &PollOptions,
    mut client: JobClient,
    mut client_config: ClientConfig,
    mut auth_status: String,
) -> anyhow::Result<()> {
    let transcript = SqliteTranscript::new(db_path)?;
    let registry = CommandRegistry::new();
    let mut stats = SessionStats::default();

    let database = if db_path == ":memory:" {
        "ephemeral"
    } else {
        db_path
    };
    print_banner(&BannerInfo {
        api_url: &client_config.api_url,
        auth_status: &auth_status,
        database,
        poll: options,
    });

    // Async stdin so Ctrl+C is caught at the prompt too
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\nbankr> ");
        io::stdout().flush()?;

        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {e}");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let info = SessionInfo {
            api_url: &client_config.api_url,
            auth_status: &auth_status,
            db_path,
            stats,
            client: Some(&client),
            transcript: Some(&transcript),
        };
        match registry.dispatch(input, &info).await {
            CommandResult::Quit => break,
            CommandResult::Handled => continue,
            CommandResult::StateChanged(StateChange::Auth) => {
                match connect(db_path, store, flag_url.clone()) {
                    Ok((new_client, new_config, new_status)) => {
                        client = new_client;
                        client_config = new_config;
                        auth_status = new_status;
                        println!("  auth: {auth_status}");
                    }
                    Err(e) => eprintln!("  ✗ {e:#}"),
                }
                continue;
            }
            CommandResult::NotACommand => {}
        }

        // Errors are already shown and tallied by run_prompt
        let _ = run_prompt(&client, input, options, &transcript, &mut stats).await;
    }

    print_session_summary(stats);
    Ok(())
}
