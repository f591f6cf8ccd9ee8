pub mod storage;

pub use storage::{CredentialStore, KeySource};

use anyhow::{Context, Result, bail};

use crate::consts::{API_KEY_ENV, mask_key};

/// Save an API key.
///
/// This is the shared logic used by both the CLI `bankr login` subcommand
/// and the `/login` REPL slash command.
pub fn login(db_path: &str, name: &str, api_key: &str) -> Result<()> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("no API key provided");
    }
    if api_key.chars().any(char::is_whitespace) {
        bail!("API key must not contain whitespace");
    }
    if db_path == ":memory:" {
        bail!("an in-memory database cannot keep a key; use a --db file or set {API_KEY_ENV}");
    }
    let store = CredentialStore::open(db_path).context("failed to open credential storage")?;
    store
        .set(name, api_key)
        .context("failed to save API key")?;
    Ok(())
}

/// Remove the stored API key.
///
/// Shared by the CLI `bankr logout` subcommand and the `/logout` command.
pub fn logout(db_path: &str, name: &str) -> Result<()> {
    let store = CredentialStore::open(db_path).context("failed to open credential storage")?;
    store
        .remove(name)
        .context("failed to remove API key")?;
    Ok(())
}

/// One-line auth summary for the banner and `/whoami`.
pub fn auth_status(resolved: Option<&(String, KeySource)>) -> String {
    match resolved {
        Some((key, KeySource::Stored)) => format!("API key ✓ ({})", mask_key(key)),
        Some((key, KeySource::Env)) => format!("API key (env) ✓ ({})", mask_key(key)),
        None => "not authenticated".to_string(),
    }
}
