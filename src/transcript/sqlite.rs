use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rusqlite::{Connection, params};
use std::sync::Mutex;

use super::{Role, Transcript, TranscriptEntry};
use crate::job::JobStatus;

/// SQLite-backed chat transcript.
pub struct SqliteTranscript {
    conn: Mutex<Connection>,
}

impl SqliteTranscript {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS transcript (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL DEFAULT (datetime('now')),
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                job_id TEXT,
                status TEXT
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }
}

#[async_trait]
impl Transcript for SqliteTranscript {
    async fn append(&self, entry: TranscriptEntry) -> Result<()> {
        let status = entry.status.map(String::from);
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO transcript (role, content, job_id, status) VALUES (?1, ?2, ?3, ?4)",
            params![entry.role.as_str(), entry.content, entry.job_id, status],
        )?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<TranscriptEntry>> {
        let conn = self.conn.lock().unwrap();
        // Get the last `limit` entries, but return them in chronological order
        let mut stmt = conn.prepare(
            "SELECT timestamp, role, content, job_id, status FROM (
                SELECT * FROM transcript ORDER BY id DESC LIMIT ?1
            ) ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(timestamp, role, content, job_id, status)| {
                let role = Role::parse(&role).ok_or_else(|| anyhow!("unknown role in transcript: {role}"))?;
                Ok(TranscriptEntry {
                    role,
                    content,
                    job_id,
                    status: status.map(JobStatus::from),
                    timestamp,
                })
            })
            .collect()
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM transcript", [])?;
        Ok(())
    }
}
