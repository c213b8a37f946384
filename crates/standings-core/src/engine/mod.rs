//! Core standings engine
//!
//! The StandingsEngine is responsible for:
//! - Consuming finalized match outcomes from an OutcomeSource
//! - Validating them against the configured league set
//! - Applying each outcome to both team rows via the StandingsStore
//! - Rebuilding whole leagues from history (corrections, seeding)
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐
//! │ OutcomeSource │─── MatchOutcome ────┐
//! └───────────────┘                     │
//!                                       ▼
//!                             ┌──────────────────┐
//!                             │ StandingsEngine  │
//!                             └──────────────────┘
//!                                       │
//!          ┌────────────────────────────┼────────────────────────────┐
//!          │                            │                            │
//!          ▼                            ▼                            ▼
//! ┌────────────────┐          ┌──────────────────┐          ┌─────────────┐
//! │ StandingsStore │          │ StandingsQueries │          │   Events    │
//! │ (fold rows)    │          │ (read views)     │          │  (notify)   │
//! └────────────────┘          └──────────────────┘          └─────────────┘
//! ```
//!
//! ## Event Flow
//!
//! 1. Fixture completes, source yields a MatchOutcome
//! 2. Engine validates it (known league, sane identifiers); rejects touch nothing
//! 3. Store folds the outcome into both team rows as one atomic unit
//! 4. Emit event for monitoring/logging
//!
//! Full recalculation runs out-of-band: the league is refolded from its
//! complete history in memory, through the exact same per-match fold, and
//! swapped in with a version compare-and-swap. A lost race surfaces as a
//! consistency conflict and is retried.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::config::{LeagueConfig, StandingsConfig};
use crate::error::{Error, Result};
use crate::model::{MatchOutcome, StandingsRecord, Venue, fold_outcome};
use crate::query::StandingsQueries;
use crate::traits::{OutcomeSource, StandingsStore};

/// Events emitted by the StandingsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// An outcome was folded into both team rows
    OutcomeApplied {
        league_id: String,
        home_team: String,
        away_team: String,
        home_goals: u32,
        away_goals: u32,
    },

    /// An outcome failed validation; nothing was mutated
    OutcomeRejected { league_id: String, reason: String },

    /// A league was rebuilt from its match history
    LeagueRebuilt {
        league_id: String,
        matches_replayed: usize,
        teams: usize,
    },

    /// A league rebuild gave up after exhausting its retries
    RebuildFailed {
        league_id: String,
        error: String,
        retry_count: usize,
    },

    /// Engine started
    Started { leagues_count: usize },

    /// Engine stopped
    Stopped { reason: String },
}

/// Core standings engine
///
/// The engine orchestrates the finalized-outcome → standings-row flow.
/// It runs continuously, ingesting outcomes as fixtures complete.
///
/// ## Lifecycle
///
/// 1. Create with [`StandingsEngine::new()`]
/// 2. Start with [`StandingsEngine::run()`]
/// 3. Engine runs until shutdown signal received
/// 4. Drop to cleanup
///
/// ## Concurrency
///
/// `ingest` and every read view may be called concurrently; per-league
/// atomicity is the store's contract. A rebuild never blocks ingestion;
/// it plans against a league version and retries if a write slips in.
///
/// ## Load Resistance
///
/// - **Bounded event channel**: Prevents unbounded memory growth
/// - **Event dropping**: When the channel is full, events are dropped (logged)
pub struct StandingsEngine {
    /// Feed of finalized match outcomes
    source: Box<dyn OutcomeSource>,

    /// Repository for standings rows
    store: Arc<dyn StandingsStore>,

    /// Leagues this engine maintains
    leagues: Vec<LeagueConfig>,

    /// Maximum retry attempts for rebuild version conflicts
    max_retries: usize,

    /// Delay between rebuild retries (in seconds)
    retry_delay_secs: u64,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl StandingsEngine {
    /// Create a new standings engine
    ///
    /// # Parameters
    ///
    /// - `source`: Outcome source implementation
    /// - `store`: Standings store implementation
    /// - `config`: Standings configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        source: Box<dyn OutcomeSource>,
        store: Box<dyn StandingsStore>,
        config: StandingsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            source,
            store: Arc::from(store),
            leagues: config.leagues,
            max_retries: config.engine.max_retries,
            retry_delay_secs: config.engine.retry_delay_secs,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Get a read-only query facade sharing this engine's store
    pub fn queries(&self) -> StandingsQueries {
        StandingsQueries::new(Arc::clone(&self.store))
    }

    /// Run the engine
    ///
    /// Seeds every configured league from the source backlog, then ingests
    /// outcomes from the watch stream until a shutdown signal is received.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Fatal error
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Internal run implementation that accepts an optional shutdown signal
    ///
    /// # Parameters
    ///
    /// - `shutdown_rx`: Optional oneshot receiver to trigger shutdown (for testing)
    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            leagues_count: self.leagues.len(),
        });

        self.seed_from_backlog().await?;

        // Watch for newly finalized outcomes
        let mut outcome_stream = self.source.watch();

        // Main event loop
        if let Some(mut rx) = shutdown_rx {
            // Test mode: wait for provided shutdown signal
            loop {
                tokio::select! {
                    Some(outcome) = outcome_stream.next() => {
                        if let Err(e) = self.ingest(&outcome).await {
                            error!("Failed to ingest outcome: {}", e);
                        }
                    }

                    _ = &mut rx => {
                        info!("Shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "Shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            // Production mode: wait for SIGINT/SIGTERM
            loop {
                tokio::select! {
                    Some(outcome) = outcome_stream.next() => {
                        if let Err(e) = self.ingest(&outcome).await {
                            error!("Failed to ingest outcome: {}", e);
                            // Continue running despite errors
                        }
                    }

                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "Shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        }

        // Flush standings before exiting
        self.store.flush().await?;
        info!("Standings flushed, engine stopped");

        Ok(())
    }

    /// Seed configured leagues from the outcome backlog
    ///
    /// Leagues with no backlog entries are left untouched: a durable store
    /// may already hold their rows, and a rebuild from an empty history
    /// would wipe them.
    async fn seed_from_backlog(&self) -> Result<()> {
        let backlog = self.source.backlog().await?;
        if backlog.is_empty() {
            debug!("No backlog to seed from");
            return Ok(());
        }

        let mut by_league: HashMap<String, Vec<MatchOutcome>> = HashMap::new();
        for outcome in backlog {
            by_league
                .entry(outcome.league_id.clone())
                .or_default()
                .push(outcome);
        }

        for league in &self.leagues {
            if !league.enabled {
                debug!("League {} is disabled, skipping seed", league.id);
                continue;
            }
            let Some(history) = by_league.remove(&league.id) else {
                continue;
            };
            info!(
                "Seeding league {} from {} backlog outcome(s)",
                league.id,
                history.len()
            );
            self.rebuild(&league.id, &history).await?;
        }

        for league_id in by_league.keys() {
            warn!("Backlog contains outcomes for unconfigured league {}", league_id);
        }

        Ok(())
    }

    /// Ingest one finalized match outcome (the incremental update path)
    ///
    /// Validation failures are rejected synchronously with no side effect;
    /// on success both team rows change as a single unit.
    pub async fn ingest(&self, outcome: &MatchOutcome) -> Result<()> {
        if let Err(e) = self.validate_outcome(outcome) {
            self.emit_event(EngineEvent::OutcomeRejected {
                league_id: outcome.league_id.clone(),
                reason: e.to_string(),
            });
            return Err(e);
        }

        self.store.apply_outcome(outcome).await?;

        debug!(
            "Applied {} {}-{} {} in league {}",
            outcome.home_team,
            outcome.home_goals,
            outcome.away_goals,
            outcome.away_team,
            outcome.league_id
        );

        self.emit_event(EngineEvent::OutcomeApplied {
            league_id: outcome.league_id.clone(),
            home_team: outcome.home_team.clone(),
            away_team: outcome.away_team.clone(),
            home_goals: outcome.home_goals,
            away_goals: outcome.away_goals,
        });

        Ok(())
    }

    /// Rebuild a league from its complete match history (full recalculation)
    ///
    /// Resets the league and refolds every match, in date order, through
    /// the same per-match fold as [`StandingsEngine::ingest`]: for any
    /// history, the resulting rows equal what sequential ingestion would
    /// have produced. Used for corrections, reconciliation after manual
    /// edits, and seeding.
    ///
    /// The swap is guarded by the league's write-version. If ingestion for
    /// the same league lands while the replacement is being computed, the
    /// conflict is retried up to the configured limit and then propagated
    /// as `Error::Consistency`.
    pub async fn rebuild(&self, league_id: &str, history: &[MatchOutcome]) -> Result<()> {
        self.validate_league(league_id)?;
        for outcome in history {
            if outcome.league_id != league_id {
                return Err(Error::validation(format!(
                    "History for league {} contains an outcome for league {}",
                    league_id, outcome.league_id
                )));
            }
        }

        let mut attempt = 0;
        loop {
            match self.try_rebuild(league_id, history).await {
                Ok(teams) => {
                    info!(
                        "Rebuilt league {} from {} match(es), {} team(s)",
                        league_id,
                        history.len(),
                        teams
                    );
                    self.emit_event(EngineEvent::LeagueRebuilt {
                        league_id: league_id.to_string(),
                        matches_replayed: history.len(),
                        teams,
                    });
                    return Ok(());
                }
                Err(e) if e.is_consistency() && attempt < self.max_retries => {
                    warn!(
                        "Rebuild attempt {} for league {} lost a version race: {}",
                        attempt, league_id, e
                    );
                    attempt += 1;
                    tokio::time::sleep(tokio::time::Duration::from_secs(self.retry_delay_secs))
                        .await;
                }
                Err(e) => {
                    self.emit_event(EngineEvent::RebuildFailed {
                        league_id: league_id.to_string(),
                        error: e.to_string(),
                        retry_count: attempt,
                    });
                    return Err(e);
                }
            }
        }
    }

    /// One rebuild attempt: fold in memory, then compare-and-swap
    async fn try_rebuild(&self, league_id: &str, history: &[MatchOutcome]) -> Result<usize> {
        let expected_version = self.store.league_version(league_id).await?;

        // Stable sort: same-instant matches keep their feed order
        let mut ordered: Vec<&MatchOutcome> = history.iter().collect();
        ordered.sort_by_key(|outcome| outcome.date);

        let mut records: HashMap<String, StandingsRecord> = HashMap::new();
        for outcome in ordered {
            for venue in [Venue::Home, Venue::Away] {
                let team = outcome.team_for(venue);
                let record = records
                    .entry(team.to_string())
                    .or_insert_with(|| StandingsRecord::new(league_id, team));
                fold_outcome(record, outcome, venue);
            }
        }

        let teams = records.len();
        self.store
            .replace_league(league_id, records.into_values().collect(), expected_version)
            .await?;

        Ok(teams)
    }

    /// Validate an outcome against the configured league set
    fn validate_outcome(&self, outcome: &MatchOutcome) -> Result<()> {
        if outcome.home_team.trim().is_empty() || outcome.away_team.trim().is_empty() {
            return Err(Error::validation("Team names cannot be empty"));
        }
        self.validate_league(&outcome.league_id)
    }

    /// Check that a league is configured and enabled
    fn validate_league(&self, league_id: &str) -> Result<()> {
        match self.leagues.iter().find(|league| league.id == league_id) {
            Some(league) if league.enabled => Ok(()),
            Some(_) => Err(Error::validation(format!(
                "League {} is disabled",
                league_id
            ))),
            None => Err(Error::validation(format!("Unknown league: {}", league_id))),
        }
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        // Send event, logging a warning if the channel is full (backpressure)
        if self.event_tx.try_send(event).is_err() {
            warn!(
                "Event channel full, dropping event. Consider increasing \
                event_channel_capacity or reducing result churn."
            );
        }
    }

    /// Test-only helper to run the engine with a controlled shutdown signal
    ///
    /// # Visibility
    ///
    /// This is `pub` for testing purposes only.
    ///
    /// **TESTING ONLY**: Architecture contract tests require controlled shutdown.
    /// Production daemon code should use `run()` instead, which manages shutdown
    /// via OS signals rather than programmatic channels.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_event_equality() {
        let event = EngineEvent::OutcomeApplied {
            league_id: "league-1".to_string(),
            home_team: "Alpha".to_string(),
            away_team: "Beta".to_string(),
            home_goals: 2,
            away_goals: 1,
        };

        // Just test that events can be created and cloned
        let _ = event.clone();
        assert_eq!(event.clone(), event);
    }
}
