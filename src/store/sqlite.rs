//! On-disk [`LocalStore`] backed by a single SQLite file.

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{Batch, LocalStore};
use crate::db;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = db::open_database(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = db::open_memory_database()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn health(&self) -> Result<db::HealthReport> {
        let conn = self.lock()?;
        db::check_database_health(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow!("store lock poisoned: {e}"))
    }
}

fn upsert(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, chrono::Utc::now().to_rfc3339()],
    )
}

impl LocalStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()
        .with_context(|| format!("failed to read key {key}"))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        upsert(&conn, key, value).with_context(|| format!("failed to write key {key}"))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])
            .with_context(|| format!("failed to remove key {key}"))?;
        Ok(())
    }

    fn apply(&self, batch: Batch) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for key in &batch.remove {
            tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        }
        for (key, value) in &batch.set {
            upsert(&tx, key, value)?;
        }
        tx.commit().context("failed to commit store batch")?;
        Ok(())
    }

    fn set_unless_present(&self, guard: &str, key: &str, value: &str) -> Result<bool> {
        let conn = self.lock()?;
        // One statement, so another process cannot write `guard` in between.
        let written = conn
            .execute(
                "INSERT INTO kv (key, value, updated_at)
                 SELECT ?1, ?2, ?3 WHERE NOT EXISTS (SELECT 1 FROM kv WHERE key = ?4)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, chrono::Utc::now().to_rfc3339(), guard],
            )
            .with_context(|| format!("failed to write key {key}"))?;
        Ok(written > 0)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}
