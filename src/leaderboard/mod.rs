//! Shared high score leaderboard
//!
//! Top 50 entries per difficulty tier, ranked by score. A durable SQLite
//! store is used when configured and reachable; an in-process store covers
//! everything else.

pub mod client;
pub mod entry;
pub mod fallback;
pub mod service;
pub mod sqlite;
pub mod store;

pub use client::{ClientError, LeaderboardClient, PendingRankings, ServiceClient};
pub use entry::{LeaderboardEntry, Rankings, ScoreSubmission, ValidationError};
pub use fallback::{FallbackStore, RequestStore};
pub use service::{LeaderboardService, SubmitError};
pub use sqlite::SqliteStore;
pub use store::{MemoryStore, RankingStore, StoreError};
