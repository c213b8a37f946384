// # Memory Standings Store
//
// In-memory implementation of StandingsStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for testing, embedded usage, or deployments that reseed from the
// outcome backlog on startup anyway.
//
// ## Locking
//
// Each league lives behind its own RwLock; the outer map lock is held only
// long enough to find or create a league entry. Writes to different leagues
// never contend, a match's two-row fold happens under one league write
// guard, and readers snapshot a league in one read guard.
//
// ## Crash Behavior
//
// - All rows are lost on restart/crash
// - First run after a crash starts from zeroed standings
// - Recovery path is a full rebuild from the outcome backlog

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::model::{MatchOutcome, StandingsRecord, Venue, fold_outcome};
use crate::traits::standings_store::{StandingsStore, StandingsStoreFactory};

/// Rows and write-version for one league
#[derive(Debug, Default)]
struct LeagueState {
    records: HashMap<String, StandingsRecord>,
    version: u64,
}

/// In-memory standings store implementation
///
/// # Example
///
/// ```rust,no_run
/// use standings_core::store::MemoryStandingsStore;
/// use standings_core::traits::StandingsStore;
/// use standings_core::MatchOutcome;
/// use chrono::Utc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStandingsStore::new();
///
///     let outcome = MatchOutcome::new("league-1", "Alpha", "Beta", 2, 1, Utc::now())?;
///     store.apply_outcome(&outcome).await?;
///
///     let alpha = store.get("league-1", "Alpha").await?.unwrap();
///     assert_eq!(alpha.points, 3);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStandingsStore {
    leagues: Arc<RwLock<HashMap<String, Arc<RwLock<LeagueState>>>>>,
}

impl MemoryStandingsStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of leagues in the store
    pub async fn len(&self) -> usize {
        self.leagues.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.leagues.read().await.is_empty()
    }

    /// Look up a league entry without creating it
    async fn league(&self, league_id: &str) -> Option<Arc<RwLock<LeagueState>>> {
        self.leagues.read().await.get(league_id).cloned()
    }

    /// Look up or create a league entry
    async fn league_or_default(&self, league_id: &str) -> Arc<RwLock<LeagueState>> {
        let mut guard = self.leagues.write().await;
        guard.entry(league_id.to_string()).or_default().clone()
    }
}

#[async_trait]
impl StandingsStore for MemoryStandingsStore {
    async fn get(&self, league_id: &str, team: &str) -> Result<Option<StandingsRecord>, Error> {
        match self.league(league_id).await {
            Some(league) => Ok(league.read().await.records.get(team).cloned()),
            None => Ok(None),
        }
    }

    async fn list_league(&self, league_id: &str) -> Result<Vec<StandingsRecord>, Error> {
        match self.league(league_id).await {
            Some(league) => Ok(league.read().await.records.values().cloned().collect()),
            None => Ok(Vec::new()),
        }
    }

    async fn league_version(&self, league_id: &str) -> Result<u64, Error> {
        match self.league(league_id).await {
            Some(league) => Ok(league.read().await.version),
            None => Ok(0),
        }
    }

    async fn apply_outcome(&self, outcome: &MatchOutcome) -> Result<(), Error> {
        let league = self.league_or_default(&outcome.league_id).await;
        let mut state = league.write().await;

        // Both rows fold under one write guard: no reader can observe the
        // home side updated with the away side stale.
        for venue in [Venue::Home, Venue::Away] {
            let team = outcome.team_for(venue);
            let record = state
                .records
                .entry(team.to_string())
                .or_insert_with(|| StandingsRecord::new(&outcome.league_id, team));
            fold_outcome(record, outcome, venue);
        }
        state.version += 1;

        Ok(())
    }

    async fn replace_league(
        &self,
        league_id: &str,
        records: Vec<StandingsRecord>,
        expected_version: u64,
    ) -> Result<(), Error> {
        let league = self.league_or_default(league_id).await;
        let mut state = league.write().await;

        if state.version != expected_version {
            return Err(Error::consistency(format!(
                "League {} moved from version {} to {} during recalculation",
                league_id, expected_version, state.version
            )));
        }

        state.records = records
            .into_iter()
            .map(|record| (record.team.clone(), record))
            .collect();
        state.version += 1;

        Ok(())
    }

    async fn delete_league(&self, league_id: &str) -> Result<(), Error> {
        let mut guard = self.leagues.write().await;
        guard.remove(league_id);
        Ok(())
    }

    async fn list_leagues(&self) -> Result<Vec<String>, Error> {
        let guard = self.leagues.read().await;
        Ok(guard.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        // No-op for memory store (everything is already "persisted")
        Ok(())
    }
}

/// Factory for creating memory standings stores
pub struct MemoryStandingsStoreFactory;

#[async_trait]
impl StandingsStoreFactory for MemoryStandingsStoreFactory {
    async fn create(&self, _config: &serde_json::Value) -> Result<Box<dyn StandingsStore>, Error> {
        Ok(Box::new(MemoryStandingsStore::new()))
    }
}
