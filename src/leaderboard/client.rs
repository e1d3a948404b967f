//! Client side of the leaderboard as seen by the game controller
//!
//! Requests never block the caller: each returns a receiver the controller
//! polls once per frame.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::oneshot;

use super::entry::{Rankings, ScoreSubmission};
use super::service::{LeaderboardService, SubmitError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The service refused the submission
    Rejected(String),
    /// The request did not complete
    Transport(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Rejected(e) => write!(f, "submission rejected: {e}"),
            ClientError::Transport(e) => write!(f, "leaderboard unreachable: {e}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<SubmitError> for ClientError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Invalid(v) => ClientError::Rejected(v.to_string()),
            SubmitError::Storage(s) => ClientError::Transport(s.to_string()),
        }
    }
}

/// Resolves to refreshed rankings, or the reason the request failed
pub type PendingRankings = oneshot::Receiver<Result<Rankings, ClientError>>;

pub trait LeaderboardClient {
    /// Record a score, then fetch every tier
    fn submit(&self, submission: ScoreSubmission) -> PendingRankings;

    fn fetch_rankings(&self) -> PendingRankings;
}

/// Talks to a service living in the same process
#[derive(Clone)]
pub struct ServiceClient {
    service: Arc<LeaderboardService>,
    runtime: Handle,
}

impl ServiceClient {
    pub fn new(service: Arc<LeaderboardService>, runtime: Handle) -> Self {
        Self { service, runtime }
    }
}

impl LeaderboardClient for ServiceClient {
    fn submit(&self, submission: ScoreSubmission) -> PendingRankings {
        let (tx, rx) = oneshot::channel();
        let service = self.service.clone();
        self.runtime.spawn_blocking(move || {
            let result = service.submit_and_rank(submission).map_err(ClientError::from);
            // Receiver gone means the session was discarded
            let _ = tx.send(result);
        });
        rx
    }

    fn fetch_rankings(&self) -> PendingRankings {
        let (tx, rx) = oneshot::channel();
        let service = self.service.clone();
        self.runtime.spawn_blocking(move || {
            let _ = tx.send(Ok(service.rankings()));
        });
        rx
    }
}
