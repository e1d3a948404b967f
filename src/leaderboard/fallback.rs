//! Durable-first store with an in-process safety net
//!
//! Availability of the durable backend is probed once per request. When it is
//! missing or unreachable, that request is served by the fallback store; when
//! it fails mid-operation, that one operation is.

use std::sync::Arc;

use super::entry::LeaderboardEntry;
use super::store::{MemoryStore, RankingStore, StoreError};
use crate::settings::Difficulty;

pub struct FallbackStore {
    durable: Option<Arc<dyn RankingStore>>,
    fallback: Box<dyn RankingStore>,
}

impl FallbackStore {
    pub fn new(durable: Option<Arc<dyn RankingStore>>) -> Self {
        Self::with_fallback(durable, Box::new(MemoryStore::new()))
    }

    pub fn with_fallback(
        durable: Option<Arc<dyn RankingStore>>,
        fallback: Box<dyn RankingStore>,
    ) -> Self {
        match &durable {
            Some(store) => {
                log::info!("Leaderboard using {} with {} fallback", store.name(), fallback.name())
            }
            None => log::warn!("No durable leaderboard configured; rankings are process-local"),
        }
        Self { durable, fallback }
    }

    /// Probe the durable backend once and pin the result for one request
    pub fn for_request(&self) -> RequestStore<'_> {
        let durable = self.durable.as_deref().filter(|store| {
            let up = store.is_available();
            if !up {
                log::warn!("{} unavailable; serving request from fallback", store.name());
            }
            up
        });
        RequestStore {
            durable,
            fallback: self.fallback.as_ref(),
        }
    }

    /// Name of the backend that would serve a request right now
    pub fn active_backend(&self) -> &'static str {
        self.for_request().name()
    }
}

/// A single operation is its own request
impl RankingStore for FallbackStore {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn insert(&self, tier: Difficulty, entry: &LeaderboardEntry) -> Result<(), StoreError> {
        self.for_request().insert(tier, entry)
    }

    fn top(&self, tier: Difficulty, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        self.for_request().top(tier, limit)
    }
}

/// Backend choice for one request; operations never re-probe
pub struct RequestStore<'a> {
    durable: Option<&'a dyn RankingStore>,
    fallback: &'a dyn RankingStore,
}

impl RankingStore for RequestStore<'_> {
    fn name(&self) -> &'static str {
        self.durable.unwrap_or(self.fallback).name()
    }

    fn insert(&self, tier: Difficulty, entry: &LeaderboardEntry) -> Result<(), StoreError> {
        if let Some(store) = self.durable {
            match store.insert(tier, entry) {
                Ok(()) => return Ok(()),
                Err(e) => log::warn!("{} insert failed ({}); using fallback", store.name(), e),
            }
        }
        self.fallback.insert(tier, entry)
    }

    fn top(&self, tier: Difficulty, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        if let Some(store) = self.durable {
            match store.top(tier, limit) {
                Ok(entries) => return Ok(entries),
                Err(e) => log::warn!("{} query failed ({}); using fallback", store.name(), e),
            }
        }
        self.fallback.top(tier, limit)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use crate::leaderboard::sqlite::SqliteStore;
    use crate::leaderboard::store::tests::{check_cap_and_order, entry};

    /// Durable stand-in whose reachability and failures are scripted
    #[derive(Default)]
    pub(crate) struct FlakyStore {
        pub down: AtomicBool,
        pub fail_ops: AtomicBool,
        pub probes: AtomicUsize,
        pub inner: MemoryStore,
    }

    impl RankingStore for FlakyStore {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn is_available(&self) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst);
            !self.down.load(Ordering::SeqCst)
        }

        fn insert(&self, tier: Difficulty, entry: &LeaderboardEntry) -> Result<(), StoreError> {
            if self.fail_ops.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("connection reset".into()));
            }
            self.inner.insert(tier, entry)
        }

        fn top(&self, tier: Difficulty, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
            if self.fail_ops.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("connection reset".into()));
            }
            self.inner.top(tier, limit)
        }
    }

    #[test]
    fn test_unconfigured_uses_memory() {
        let store = FallbackStore::new(None);
        assert_eq!(store.active_backend(), "memory");
        check_cap_and_order(&store);
    }

    #[test]
    fn test_durable_keeps_same_semantics() {
        let sqlite: Arc<dyn RankingStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let store = FallbackStore::new(Some(sqlite.clone()));
        assert_eq!(store.active_backend(), "sqlite");
        check_cap_and_order(&store);
        assert_eq!(sqlite.top(Difficulty::Hard, 50).unwrap().len(), 50);
    }

    #[test]
    fn test_operational_failure_falls_back_for_that_write() {
        let flaky = Arc::new(FlakyStore::default());
        let durable: Arc<dyn RankingStore> = flaky.clone();
        let store = FallbackStore::new(Some(durable));

        flaky.fail_ops.store(true, Ordering::SeqCst);
        store.insert(Difficulty::Easy, &entry(10, Difficulty::Easy, "saved")).unwrap();
        assert!(flaky.inner.top(Difficulty::Easy, 50).unwrap().is_empty());
        // Durable still failing: reads come from memory too
        assert_eq!(store.top(Difficulty::Easy, 50).unwrap()[0].company_name, "saved");

        flaky.fail_ops.store(false, Ordering::SeqCst);
        store.insert(Difficulty::Easy, &entry(20, Difficulty::Easy, "durable")).unwrap();
        assert_eq!(flaky.inner.top(Difficulty::Easy, 50).unwrap().len(), 1);
    }

    #[test]
    fn test_availability_probed_every_request() {
        let flaky = Arc::new(FlakyStore::default());
        let durable: Arc<dyn RankingStore> = flaky.clone();
        let store = FallbackStore::new(Some(durable));

        flaky.down.store(true, Ordering::SeqCst);
        store.insert(Difficulty::Hard, &entry(5, Difficulty::Hard, "a")).unwrap();
        assert_eq!(store.active_backend(), "memory");

        flaky.down.store(false, Ordering::SeqCst);
        store.insert(Difficulty::Hard, &entry(6, Difficulty::Hard, "b")).unwrap();
        assert_eq!(store.active_backend(), "flaky");
        assert_eq!(flaky.inner.top(Difficulty::Hard, 50).unwrap().len(), 1);
        assert_eq!(flaky.probes.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_one_probe_per_request() {
        let flaky = Arc::new(FlakyStore::default());
        let durable: Arc<dyn RankingStore> = flaky.clone();
        let store = FallbackStore::new(Some(durable));

        let request = store.for_request();
        assert_eq!(flaky.probes.load(Ordering::SeqCst), 1);
        request.insert(Difficulty::Easy, &entry(1, Difficulty::Easy, "a")).unwrap();
        for tier in Difficulty::ALL {
            request.top(tier, 50).unwrap();
        }
        assert_eq!(flaky.probes.load(Ordering::SeqCst), 1);

        // Going down after the probe does not split the request
        flaky.down.store(true, Ordering::SeqCst);
        assert_eq!(request.top(Difficulty::Easy, 50).unwrap().len(), 1);
        assert_eq!(request.name(), "flaky");
    }
}
