//! Project-wide constants.

use std::path::PathBuf;
use std::time::Duration;

/// Hosted agent API used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "https://api.bankr.bot";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "BANKR_API_KEY";

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "BANKR_API_URL";

/// Environment variable read by the log filter.
pub const LOG_ENV: &str = "BANKR_LOG";

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Delay between two status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Poll attempts before giving up and returning the last snapshot.
pub const DEFAULT_MAX_ATTEMPTS: usize = 120;

/// Per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of transcript entries shown by `/history`.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Credential slot used for the API key.
pub const CREDENTIAL_NAME: &str = "bankr";

/// Default database path: `~/.bankr/bankr.db`.
/// Single DB for transcript, credentials, and config.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".bankr")
        .join("bankr.db")
}

/// Mask an API key for display, keeping a short prefix and suffix.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
