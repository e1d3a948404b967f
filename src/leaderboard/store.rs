//! Ranked storage backends
//!
//! A store keeps one ranked collection per difficulty tier, ordered by score
//! descending with insertion order breaking ties, never holding more than
//! `MAX_ENTRIES_PER_TIER` entries once an insert returns.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use super::entry::LeaderboardEntry;
use crate::consts::MAX_ENTRIES_PER_TIER;
use crate::settings::Difficulty;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend rejected or failed the operation
    Backend(String),
    /// A stored member could not be decoded
    Corrupt(String),
    /// A writer panicked while holding the store lock
    Poisoned,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Backend(e) => write!(f, "storage backend error: {e}"),
            StoreError::Corrupt(e) => write!(f, "corrupt leaderboard member: {e}"),
            StoreError::Poisoned => write!(f, "leaderboard store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {}

/// A ranked per-tier collection of leaderboard entries
pub trait RankingStore: Send + Sync {
    /// Short backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Cheap reachability probe, run once per request
    fn is_available(&self) -> bool {
        true
    }

    /// Append `entry` to `tier`, then evict everything ranked below the cap
    fn insert(&self, tier: Difficulty, entry: &LeaderboardEntry) -> Result<(), StoreError>;

    /// Up to `limit` entries of `tier`, best first
    fn top(&self, tier: Difficulty, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError>;
}

/// In-process fallback: not shared across processes, gone on restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    tiers: Mutex<HashMap<Difficulty, Vec<LeaderboardEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RankingStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn insert(&self, tier: Difficulty, entry: &LeaderboardEntry) -> Result<(), StoreError> {
        let mut tiers = self.tiers.lock().map_err(|_| StoreError::Poisoned)?;
        let list = tiers.entry(tier).or_default();
        list.push(entry.clone());
        // Stable sort keeps earlier entries ahead of later ties
        list.sort_by(|a, b| b.score.cmp(&a.score));
        list.truncate(MAX_ENTRIES_PER_TIER);
        Ok(())
    }

    fn top(&self, tier: Difficulty, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let tiers = self.tiers.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(tiers
            .get(&tier)
            .map(|list| list.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
