// # Standings Store Trait
//
// Defines the repository interface for per-(league, team) aggregate rows.
//
// ## Purpose
//
// The store owns every StandingsRecord and is the only component allowed to
// mutate one. Mutation happens through two operations only:
//
// - `apply_outcome`: fold one match into both affected rows, atomically
// - `replace_league`: wholesale compare-and-swap of a league's rows,
//   used by full recalculation
//
// Callers never read-modify-write records themselves; expressing the match
// delta inside the store is what makes concurrent ingestion within one
// league safe.
//
// ## Consistency model
//
// Each league carries a version counter that every successful write bumps.
// `replace_league` takes the version the caller planned against and fails
// with `Error::Consistency` if any write has landed since, leaving the
// league untouched. Readers always observe a full league snapshot: for one
// match, never one side updated and the other stale.
//
// ## Implementations
//
// - Memory: per-league RwLocks, no persistence
// - File: single JSON state file with atomic writes and backup recovery

use async_trait::async_trait;

use crate::model::{MatchOutcome, StandingsRecord};

/// Trait for standings store implementations
///
/// Leagues are fully independent: an implementation must not serialize
/// writes to one league behind writes to another. Within a league, the
/// two-row update for one match is a single all-or-nothing unit.
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait StandingsStore: Send + Sync {
    /// Get one team's record
    ///
    /// # Returns
    ///
    /// - `Ok(Some(StandingsRecord))`: The team's current row
    /// - `Ok(None)`: The team has never appeared in this league
    /// - `Err(Error)`: Storage error
    async fn get(
        &self,
        league_id: &str,
        team: &str,
    ) -> Result<Option<StandingsRecord>, crate::Error>;

    /// List every record in a league as one consistent snapshot
    ///
    /// Unknown leagues yield an empty vector, never an error. Ordering is
    /// unspecified; ranking is the reader's concern.
    async fn list_league(&self, league_id: &str) -> Result<Vec<StandingsRecord>, crate::Error>;

    /// Current write-version of a league (0 if never written)
    async fn league_version(&self, league_id: &str) -> Result<u64, crate::Error>;

    /// Fold one finalized match into both affected team rows
    ///
    /// Creates zeroed rows on a team's first appearance. Both rows change
    /// or neither does. Bumps the league version once per match.
    async fn apply_outcome(&self, outcome: &MatchOutcome) -> Result<(), crate::Error>;

    /// Replace a league's rows wholesale, guarded by version compare-and-swap
    ///
    /// # Parameters
    ///
    /// - `league_id`: The league to replace
    /// - `records`: The complete new row set
    /// - `expected_version`: The version the caller computed `records` against
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Rows swapped in, version bumped
    /// - `Err(Error::Consistency)`: A concurrent write moved the version;
    ///   nothing was changed and the caller should recompute and retry
    async fn replace_league(
        &self,
        league_id: &str,
        records: Vec<StandingsRecord>,
        expected_version: u64,
    ) -> Result<(), crate::Error>;

    /// Remove a league and all of its rows
    ///
    /// Cascade hook for the external league-management collaborator.
    /// Deleting an unknown league is a no-op.
    async fn delete_league(&self, league_id: &str) -> Result<(), crate::Error>;

    /// List all league ids present in the store
    async fn list_leagues(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    ///
    /// Some implementations may buffer writes. This ensures
    /// all changes are flushed to persistent storage.
    async fn flush(&self) -> Result<(), crate::Error>;
}

/// Helper trait for constructing standings stores from configuration
#[async_trait]
pub trait StandingsStoreFactory: Send + Sync {
    /// Create a StandingsStore instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this store type, as JSON
    ///
    /// # Returns
    ///
    /// A boxed StandingsStore trait object
    async fn create(
        &self,
        config: &serde_json::Value,
    ) -> Result<Box<dyn StandingsStore>, crate::Error>;
}
