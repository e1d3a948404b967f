//! Leaderboard business logic: validate, stamp, persist, rank

use std::fmt;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use super::entry::{LeaderboardEntry, Rankings, ScoreSubmission, ValidationError};
use super::fallback::{FallbackStore, RequestStore};
use super::sqlite::SqliteStore;
use super::store::{RankingStore, StoreError};
use crate::config::ServerConfig;
use crate::consts::MAX_ENTRIES_PER_TIER;
use crate::settings::Difficulty;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    Invalid(ValidationError),
    Storage(StoreError),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Invalid(e) => write!(f, "{e}"),
            SubmitError::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SubmitError {}

impl From<ValidationError> for SubmitError {
    fn from(e: ValidationError) -> Self {
        SubmitError::Invalid(e)
    }
}

impl From<StoreError> for SubmitError {
    fn from(e: StoreError) -> Self {
        SubmitError::Storage(e)
    }
}

pub struct LeaderboardService {
    store: FallbackStore,
}

impl LeaderboardService {
    pub fn new(durable: Option<Arc<dyn RankingStore>>) -> Self {
        Self::with_store(FallbackStore::new(durable))
    }

    pub fn with_store(store: FallbackStore) -> Self {
        Self { store }
    }

    /// Process-local rankings only
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Build from configuration; an unopenable database degrades to memory
    pub fn from_config(config: &ServerConfig) -> Self {
        let durable = config.database_path.as_ref().and_then(|path| {
            match SqliteStore::open(path) {
                Ok(store) => {
                    log::info!("Opened leaderboard database {}", path.display());
                    Some(Arc::new(store) as Arc<dyn RankingStore>)
                }
                Err(e) => {
                    log::warn!("Cannot open {} ({}); using fallback only", path.display(), e);
                    None
                }
            }
        });
        Self::new(durable)
    }

    pub fn active_backend(&self) -> &'static str {
        self.store.active_backend()
    }

    /// Validate an untyped body and record it
    pub fn submit_json(&self, body: &Value) -> Result<LeaderboardEntry, SubmitError> {
        let submission = ScoreSubmission::from_json(body)?;
        self.submit(submission)
    }

    /// Record a submission; duplicates are kept as separate entries
    pub fn submit(&self, submission: ScoreSubmission) -> Result<LeaderboardEntry, SubmitError> {
        Self::submit_to(&self.store.for_request(), submission)
    }

    /// Record a submission and read back every tier within one request
    pub fn submit_and_rank(&self, submission: ScoreSubmission) -> Result<Rankings, SubmitError> {
        let store = self.store.for_request();
        Self::submit_to(&store, submission)?;
        Ok(Self::rankings_from(&store))
    }

    /// Top entries of one tier, best first
    pub fn query(&self, tier: Difficulty) -> Result<Vec<LeaderboardEntry>, StoreError> {
        self.store.for_request().top(tier, MAX_ENTRIES_PER_TIER)
    }

    /// All tiers from one backend; a tier that cannot be read comes back empty
    pub fn rankings(&self) -> Rankings {
        Self::rankings_from(&self.store.for_request())
    }

    fn submit_to(
        store: &RequestStore<'_>,
        submission: ScoreSubmission,
    ) -> Result<LeaderboardEntry, SubmitError> {
        submission.validate()?;
        let date = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let entry = submission.into_entry(date);
        store.insert(entry.difficulty, &entry)?;
        log::info!(
            "Saved {} score {} for {:?}",
            entry.difficulty.as_str(),
            entry.score,
            entry.company_name
        );
        Ok(entry)
    }

    fn rankings_from(store: &RequestStore<'_>) -> Rankings {
        let mut rankings = Rankings::default();
        for tier in Difficulty::ALL {
            match store.top(tier, MAX_ENTRIES_PER_TIER) {
                Ok(entries) => *rankings.tier_mut(tier) = entries,
                Err(e) => log::error!("Failed to load {} rankings: {}", tier.as_str(), e),
            }
        }
        rankings
    }
}
