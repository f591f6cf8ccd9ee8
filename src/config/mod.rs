//! Client configuration and the persisted key-value settings behind it.
//!
//! [`ConfigStore`] shares a database with
//! [`CredentialStore`](crate::auth::CredentialStore) and
//! [`SqliteTranscript`](crate::transcript::sqlite::SqliteTranscript); pass
//! the same path to all three.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use rusqlite::Connection;

use crate::client::PollOptions;
use crate::consts::{API_URL_ENV, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT, mask_key};

pub const KEY_API_URL: &str = "api_url";
pub const KEY_POLL_INTERVAL_MS: &str = "poll_interval_ms";
pub const KEY_MAX_ATTEMPTS: &str = "max_attempts";

/// Keys accepted by `bankr config set`.
pub const KNOWN_KEYS: &[&str] = &[KEY_API_URL, KEY_POLL_INTERVAL_MS, KEY_MAX_ATTEMPTS];

/// Everything the HTTP client needs. Built once at startup and handed
/// to [`HttpAgentApi`](crate::api::http::HttpAgentApi).
#[derive(Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// API URL priority: explicit flag → stored config → environment → default.
    pub fn resolve(
        flag_url: Option<String>,
        store: &ConfigStore,
        api_key: Option<String>,
    ) -> Result<Self> {
        let api_url = match flag_url {
            Some(url) => url,
            None => match store.get(KEY_API_URL)? {
                Some(url) => url,
                None => std::env::var(API_URL_ENV)
                    .ok()
                    .filter(|url| !url.is_empty())
                    .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            },
        };
        validate_url(&api_url)?;
        Ok(Self::new(api_url, api_key))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, None)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_deref().map(mask_key))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Poll settings: explicit flags win over stored values, which win over
/// the defaults.
pub fn resolve_poll_options(
    store: &ConfigStore,
    interval_ms: Option<u64>,
    max_attempts: Option<usize>,
) -> Result<PollOptions> {
    let mut options = PollOptions::default();
    if let Some(ms) = interval_ms.or(store.get_parsed(KEY_POLL_INTERVAL_MS)?) {
        options.interval = Duration::from_millis(ms);
    }
    if let Some(n) = max_attempts.or(store.get_parsed(KEY_MAX_ATTEMPTS)?) {
        if n == 0 {
            bail!("{KEY_MAX_ATTEMPTS} must be at least 1");
        }
        options.max_attempts = n;
    }
    Ok(options)
}

fn validate_url(url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("API URL must start with http:// or https://, got {url:?}");
    }
    Ok(())
}

/// Check a value before `bankr config set` stores it.
pub fn validate_setting(key: &str, value: &str) -> Result<()> {
    match key {
        KEY_API_URL => validate_url(value),
        KEY_POLL_INTERVAL_MS => value
            .parse::<u64>()
            .map(|_| ())
            .with_context(|| format!("{key} must be a number of milliseconds")),
        KEY_MAX_ATTEMPTS => match value.parse::<usize>() {
            Ok(n) if n > 0 => Ok(()),
            _ => bail!("{key} must be a positive integer"),
        },
        _ => bail!("unknown config key {key:?} (known: {})", KNOWN_KEYS.join(", ")),
    }
}

/// Persistent key-value configuration store.
pub struct ConfigStore {
    conn: Mutex<Connection>,
}

impl ConfigStore {
    /// Open or create the config table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open config database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create config table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get a config value by key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT value FROM config WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Get a value and parse it; a stored value that does not parse is an error.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.get(key)?
            .map(|raw| {
                raw.parse::<T>()
                    .with_context(|| format!("invalid stored value for {key}: {raw:?}"))
            })
            .transpose()
    }

    /// Set a config value (upsert).
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    /// Remove a config key.
    pub fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM config WHERE key = ?1", [key])?;
        Ok(())
    }

    /// All stored pairs, sorted by key.
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT key, value FROM config ORDER BY key ASC")?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_config() -> ConfigStore {
        ConfigStore::open(":memory:").unwrap()
    }

    #[test]
    fn get_returns_none_for_missing_key() {
        let config = mem_config();
        assert!(config.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn set_overwrites_existing() {
        let config = mem_config();
        config.set(KEY_API_URL, "https://old.example").unwrap();
        config.set(KEY_API_URL, "https://new.example").unwrap();
        assert_eq!(config.get(KEY_API_URL).unwrap().unwrap(), "https://new.example");
    }

    #[test]
    fn remove_nonexistent_is_ok() {
        let config = mem_config();
        config.remove("nonexistent").unwrap();
    }

    #[test]
    fn list_is_sorted() {
        let config = mem_config();
        config.set(KEY_POLL_INTERVAL_MS, "500").unwrap();
        config.set(KEY_API_URL, "https://x.example").unwrap();
        let pairs = config.list().unwrap();
        assert_eq!(pairs[0].0, KEY_API_URL);
        assert_eq!(pairs[1].0, KEY_POLL_INTERVAL_MS);
    }

    #[test]
    fn get_parsed_rejects_garbage() {
        let config = mem_config();
        config.set(KEY_MAX_ATTEMPTS, "lots").unwrap();
        assert!(config.get_parsed::<usize>(KEY_MAX_ATTEMPTS).is_err());
        config.set(KEY_MAX_ATTEMPTS, "7").unwrap();
        assert_eq!(config.get_parsed::<usize>(KEY_MAX_ATTEMPTS).unwrap(), Some(7));
    }

    #[test]
    fn flag_url_wins_over_stored() {
        let config = mem_config();
        config.set(KEY_API_URL, "https://stored.example").unwrap();
        let resolved =
            ClientConfig::resolve(Some("http://localhost:3000".to_string()), &config, None)
                .unwrap();
        assert_eq!(resolved.api_url, "http://localhost:3000");
    }

    #[test]
    fn stored_url_used_without_flag() {
        let config = mem_config();
        config.set(KEY_API_URL, "https://stored.example").unwrap();
        let resolved = ClientConfig::resolve(None, &config, Some("bk_key".to_string())).unwrap();
        assert_eq!(resolved.api_url, "https://stored.example");
        assert_eq!(resolved.api_key.as_deref(), Some("bk_key"));
    }

    #[test]
    fn bad_url_is_rejected() {
        let config = mem_config();
        assert!(ClientConfig::resolve(Some("ftp://nope".to_string()), &config, None).is_err());
    }

    #[test]
    fn debug_masks_api_key() {
        let config = ClientConfig::new(DEFAULT_API_URL, Some("bk_supersecretkey".to_string()));
        let printed = format!("{config:?}");
        assert!(!printed.contains("supersecret"));
        assert!(printed.contains("bk_s"));
    }

    #[test]
    fn poll_options_precedence() {
        let config = mem_config();
        let options = resolve_poll_options(&config, None, None).unwrap();
        assert_eq!(options, PollOptions::default());

        config.set(KEY_POLL_INTERVAL_MS, "250").unwrap();
        config.set(KEY_MAX_ATTEMPTS, "10").unwrap();
        let options = resolve_poll_options(&config, None, None).unwrap();
        assert_eq!(options.interval, Duration::from_millis(250));
        assert_eq!(options.max_attempts, 10);

        let options = resolve_poll_options(&config, Some(100), Some(3)).unwrap();
        assert_eq!(options.interval, Duration::from_millis(100));
        assert_eq!(options.max_attempts, 3);
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = mem_config();
        assert!(resolve_poll_options(&config, None, Some(0)).is_err());
    }

    #[test]
    fn validate_setting_checks_values() {
        assert!(validate_setting(KEY_API_URL, "https://ok.example").is_ok());
        assert!(validate_setting(KEY_API_URL, "nope").is_err());
        assert!(validate_setting(KEY_POLL_INTERVAL_MS, "1500").is_ok());
        assert!(validate_setting(KEY_POLL_INTERVAL_MS, "-1").is_err());
        assert!(validate_setting(KEY_MAX_ATTEMPTS, "0").is_err());
        assert!(validate_setting("theme", "dark").is_err());
    }

    #[test]
    fn persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config-test.db");
        let path_str = path.to_str().unwrap();

        {
            let config = ConfigStore::open(path_str).unwrap();
            config.set(KEY_API_URL, "https://persisted.example").unwrap();
        }

        {
            let config = ConfigStore::open(path_str).unwrap();
            assert_eq!(
                config.get(KEY_API_URL).unwrap().unwrap(),
                "https://persisted.example"
            );
        }
    }
}
