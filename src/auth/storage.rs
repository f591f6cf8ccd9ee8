use std::sync::Mutex;

use anyhow::Result;
use rusqlite::Connection;

/// Where a resolved API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Stored,
    Env,
}

/// Manages API key storage in SQLite.
///
/// Shares a database with the transcript and config; pass the same path
/// used for `SqliteTranscript`.
pub struct CredentialStore {
    conn: Mutex<Connection>,
}

impl CredentialStore {
    /// Open or create a credentials table in the given database path.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS credentials (
                name    TEXT PRIMARY KEY,
                api_key TEXT NOT NULL
            )",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get the stored key for a credential slot.
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT api_key FROM credentials WHERE name = ?1")?;
        let mut rows = stmt.query([name])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Store a key (upsert).
    pub fn set(&self, name: &str, api_key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO credentials (name, api_key) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET api_key = excluded.api_key",
            [name, api_key],
        )?;
        Ok(())
    }

    /// Remove the key for a credential slot.
    pub fn remove(&self, name: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM credentials WHERE name = ?1", [name])?;
        Ok(())
    }

    /// Resolve the API key to use.
    /// Priority: stored key → environment variable.
    pub fn resolve(&self, name: &str, env_var: &str) -> Result<Option<(String, KeySource)>> {
        if let Some(key) = self.get(name)?
            && !key.is_empty()
        {
            return Ok(Some((key, KeySource::Stored)));
        }

        if let Ok(key) = std::env::var(env_var)
            && !key.is_empty()
        {
            return Ok(Some((key, KeySource::Env)));
        }

        Ok(None)
    }
}
