//! Test doubles and common utilities for architecture contract tests
//!
//! This module provides minimal test doubles that verify architectural
//! constraints without implementing real functionality.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::mpsc;
use tokio_stream::Stream;

use standings_core::error::Result;
use standings_core::model::{MatchOutcome, StandingsRecord, Venue, fold_outcome};
use standings_core::traits::{OutcomeSource, StandingsStore};

/// Build a match date on a given day of March 2025
pub fn match_date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, 15, 0, 0).unwrap()
}

/// Build a valid outcome for tests
pub fn outcome(
    league: &str,
    home: &str,
    away: &str,
    home_goals: i64,
    away_goals: i64,
    day: u32,
) -> MatchOutcome {
    MatchOutcome::new(league, home, away, home_goals, away_goals, match_date(day))
        .expect("test outcome is valid")
}

/// A controlled OutcomeSource that can emit outcomes on demand
pub struct ControlledOutcomeSource {
    /// Sender for the test to push outcomes
    test_tx: mpsc::UnboundedSender<MatchOutcome>,
    /// Receiver for the engine's watch stream
    engine_rx: Arc<std::sync::Mutex<Option<mpsc::UnboundedReceiver<MatchOutcome>>>>,
    /// Backlog returned at engine startup
    backlog: Vec<MatchOutcome>,
    /// Call counter for backlog()
    backlog_call_count: Arc<AtomicUsize>,
    /// Call counter for watch()
    watch_call_count: Arc<AtomicUsize>,
}

impl ControlledOutcomeSource {
    /// Create a new controlled source with a fixed backlog
    pub fn new(backlog: Vec<MatchOutcome>) -> (Self, mpsc::UnboundedSender<MatchOutcome>) {
        let (test_tx, engine_rx) = mpsc::unbounded_channel();

        let source = Self {
            test_tx: test_tx.clone(),
            engine_rx: Arc::new(std::sync::Mutex::new(Some(engine_rx))),
            backlog,
            backlog_call_count: Arc::new(AtomicUsize::new(0)),
            watch_call_count: Arc::new(AtomicUsize::new(0)),
        };

        (source, test_tx)
    }

    /// Get the number of times backlog() was called
    pub fn backlog_call_count(&self) -> usize {
        self.backlog_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times watch() was called
    pub fn watch_call_count(&self) -> usize {
        self.watch_call_count.load(Ordering::SeqCst)
    }

    /// Emit an outcome (convenience method for tests)
    pub fn emit(&self, outcome: MatchOutcome) {
        let _ = self.test_tx.send(outcome);
    }
}

#[async_trait::async_trait]
impl OutcomeSource for ControlledOutcomeSource {
    async fn backlog(&self) -> Result<Vec<MatchOutcome>> {
        self.backlog_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.backlog.clone())
    }

    fn watch(&self) -> Pin<Box<dyn Stream<Item = MatchOutcome> + Send + 'static>> {
        self.watch_call_count.fetch_add(1, Ordering::SeqCst);

        // Take the receiver (only called once)
        let rx = self
            .engine_rx
            .lock()
            .unwrap()
            .take()
            .expect("watch() can only be called once");

        let stream = tokio_stream::wrappers::UnboundedReceiverStream::new(rx);
        Box::pin(stream)
    }
}

/// A mock StandingsStore that tracks calls
///
/// Rows are folded with the same shared fold as the real stores, so the
/// contract tests can assert on resulting values as well as call counts.
pub struct MockStandingsStore {
    /// Call counter for apply_outcome()
    apply_call_count: Arc<AtomicUsize>,
    /// Call counter for replace_league()
    replace_call_count: Arc<AtomicUsize>,
    /// Call counter for flush()
    flush_call_count: Arc<AtomicUsize>,
    /// When set, every replace_league() fails with a consistency conflict
    always_conflict: Arc<AtomicBool>,
    /// Stored rows, league -> team -> record
    state: Arc<std::sync::Mutex<HashMap<String, HashMap<String, StandingsRecord>>>>,
    /// Per-league versions
    versions: Arc<std::sync::Mutex<HashMap<String, u64>>>,
}

impl MockStandingsStore {
    pub fn new() -> Self {
        Self {
            apply_call_count: Arc::new(AtomicUsize::new(0)),
            replace_call_count: Arc::new(AtomicUsize::new(0)),
            flush_call_count: Arc::new(AtomicUsize::new(0)),
            always_conflict: Arc::new(AtomicBool::new(false)),
            state: Arc::new(std::sync::Mutex::new(HashMap::new())),
            versions: Arc::new(std::sync::Mutex::new(HashMap::new())),
        }
    }

    /// A store whose replace_league() always loses the version race
    pub fn always_conflicting() -> Self {
        let store = Self::new();
        store.always_conflict.store(true, Ordering::SeqCst);
        store
    }

    /// Get the number of times apply_outcome() was called
    pub fn apply_call_count(&self) -> usize {
        self.apply_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times replace_league() was called
    pub fn replace_call_count(&self) -> usize {
        self.replace_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times flush() was called
    pub fn flush_call_count(&self) -> usize {
        self.flush_call_count.load(Ordering::SeqCst)
    }

    /// Create a new MockStandingsStore that shares counters and state
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            apply_call_count: Arc::clone(&other.apply_call_count),
            replace_call_count: Arc::clone(&other.replace_call_count),
            flush_call_count: Arc::clone(&other.flush_call_count),
            always_conflict: Arc::clone(&other.always_conflict),
            state: Arc::clone(&other.state),
            versions: Arc::clone(&other.versions),
        }
    }
}

#[async_trait::async_trait]
impl StandingsStore for MockStandingsStore {
    async fn get(&self, league_id: &str, team: &str) -> Result<Option<StandingsRecord>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .get(league_id)
            .and_then(|league| league.get(team))
            .cloned())
    }

    async fn list_league(&self, league_id: &str) -> Result<Vec<StandingsRecord>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .get(league_id)
            .map(|league| league.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn league_version(&self, league_id: &str) -> Result<u64> {
        Ok(*self.versions.lock().unwrap().get(league_id).unwrap_or(&0))
    }

    async fn apply_outcome(&self, outcome: &MatchOutcome) -> Result<()> {
        self.apply_call_count.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock().unwrap();
        let league = state.entry(outcome.league_id.clone()).or_default();
        for venue in [Venue::Home, Venue::Away] {
            let team = outcome.team_for(venue);
            let record = league
                .entry(team.to_string())
                .or_insert_with(|| StandingsRecord::new(&outcome.league_id, team));
            fold_outcome(record, outcome, venue);
        }
        drop(state);

        *self
            .versions
            .lock()
            .unwrap()
            .entry(outcome.league_id.clone())
            .or_insert(0) += 1;
        Ok(())
    }

    async fn replace_league(
        &self,
        league_id: &str,
        records: Vec<StandingsRecord>,
        expected_version: u64,
    ) -> Result<()> {
        self.replace_call_count.fetch_add(1, Ordering::SeqCst);

        if self.always_conflict.load(Ordering::SeqCst) {
            return Err(standings_core::Error::consistency(format!(
                "Injected conflict for league {}",
                league_id
            )));
        }

        let mut versions = self.versions.lock().unwrap();
        let version = versions.entry(league_id.to_string()).or_insert(0);
        if *version != expected_version {
            return Err(standings_core::Error::consistency(format!(
                "League {} moved from version {} to {}",
                league_id, expected_version, version
            )));
        }
        *version += 1;
        drop(versions);

        self.state.lock().unwrap().insert(
            league_id.to_string(),
            records
                .into_iter()
                .map(|record| (record.team.clone(), record))
                .collect(),
        );
        Ok(())
    }

    async fn delete_league(&self, league_id: &str) -> Result<()> {
        self.state.lock().unwrap().remove(league_id);
        self.versions.lock().unwrap().remove(league_id);
        Ok(())
    }

    async fn list_leagues(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().keys().cloned().collect())
    }

    async fn flush(&self) -> Result<()> {
        self.flush_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Helper to create a minimal StandingsConfig for testing
pub fn minimal_config(league_id: &str) -> standings_core::config::StandingsConfig {
    standings_core::config::StandingsConfig {
        source: standings_core::config::OutcomeSourceConfig::Custom {
            factory: "controlled".to_string(),
            config: serde_json::json!({}),
        },
        store: standings_core::config::StoreConfig::Memory,
        leagues: vec![standings_core::config::LeagueConfig::new(league_id)],
        engine: standings_core::config::EngineConfig {
            max_retries: 3,
            retry_delay_secs: 0, // No backoff in tests
            event_channel_capacity: 100,
            metadata: std::collections::HashMap::new(),
        },
    }
}
