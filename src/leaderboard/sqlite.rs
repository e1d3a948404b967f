//! Durable SQLite backend
//!
//! Each row is one member of a tier's ranked collection: the member is the
//! JSON-serialized entry and `score` is its rank weight.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, params};

use super::entry::LeaderboardEntry;
use super::store::{RankingStore, StoreError};
use crate::consts::MAX_ENTRIES_PER_TIER;
use crate::settings::Difficulty;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS ranking (
        seq    INTEGER PRIMARY KEY AUTOINCREMENT,
        tier   TEXT    NOT NULL,
        score  INTEGER NOT NULL,
        member TEXT    NOT NULL
    );
    CREATE INDEX IF NOT EXISTS ranking_tier_score ON ranking (tier, score DESC, seq ASC);
";

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (and create if needed) the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// Private database that lives as long as the store
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl RankingStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn is_available(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn
                .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .is_ok(),
            Err(_) => false,
        }
    }

    fn insert(&self, tier: Difficulty, entry: &LeaderboardEntry) -> Result<(), StoreError> {
        let member =
            serde_json::to_string(entry).map_err(|e| StoreError::Backend(e.to_string()))?;
        let score = i64::try_from(entry.score)
            .map_err(|_| StoreError::Backend(format!("score {} out of range", entry.score)))?;

        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO ranking (tier, score, member) VALUES (?1, ?2, ?3)",
            params![tier.as_str(), score, member],
        )?;
        tx.execute(
            "DELETE FROM ranking WHERE tier = ?1 AND seq NOT IN (
                SELECT seq FROM ranking WHERE tier = ?1
                ORDER BY score DESC, seq ASC LIMIT ?2
            )",
            params![tier.as_str(), MAX_ENTRIES_PER_TIER as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn top(&self, tier: Difficulty, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn.prepare(
            "SELECT member FROM ranking WHERE tier = ?1 ORDER BY score DESC, seq ASC LIMIT ?2",
        )?;
        let members = stmt
            .query_map(params![tier.as_str(), limit], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        members
            .iter()
            .map(|m| serde_json::from_str(m).map_err(|e| StoreError::Corrupt(e.to_string())))
            .collect()
    }
}
