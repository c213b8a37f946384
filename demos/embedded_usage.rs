//! Minimal embedding example for standings-core
//!
//! This example demonstrates using standings-core as a library in a custom
//! application: outcomes are ingested directly through the engine API and
//! the read views are queried in-process, with no daemon and no feed file.

use std::pin::Pin;

use chrono::{TimeZone, Utc};
use tokio_stream::Stream;

use standings_core::config::{LeagueConfig, OutcomeSourceConfig, StandingsConfig, StoreConfig};
use standings_core::store::MemoryStandingsStore;
use standings_core::traits::OutcomeSource;
use standings_core::{MatchOutcome, Result, StandingsEngine};

/// An outcome source with no feed behind it
///
/// Embedded applications that push outcomes through `ingest()` themselves
/// still need to satisfy the engine's source seam.
struct SilentOutcomeSource;

#[async_trait::async_trait]
impl OutcomeSource for SilentOutcomeSource {
    async fn backlog(&self) -> Result<Vec<MatchOutcome>> {
        Ok(Vec::new())
    }

    fn watch(&self) -> Pin<Box<dyn Stream<Item = MatchOutcome> + Send + 'static>> {
        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
        Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = StandingsConfig {
        source: OutcomeSourceConfig::Custom {
            factory: "silent".to_string(),
            config: serde_json::json!({}),
        },
        store: StoreConfig::Memory,
        leagues: vec![LeagueConfig::new("demo-league").with_name("Demo League")],
        engine: Default::default(),
    };

    let (engine, _event_rx) = StandingsEngine::new(
        Box::new(SilentOutcomeSource),
        Box::new(MemoryStandingsStore::new()),
        config,
    )?;

    let date = |day| Utc.with_ymd_and_hms(2025, 3, day, 15, 0, 0).unwrap();
    let fixtures = [
        ("Alpha", "Beta", 2, 1, 1),
        ("Beta", "Alpha", 0, 0, 8),
        ("Charlie", "Alpha", 1, 3, 15),
        ("Beta", "Charlie", 2, 0, 22),
    ];

    for (home, away, hg, ag, day) in fixtures {
        let outcome = MatchOutcome::new("demo-league", home, away, hg, ag, date(day))?;
        engine.ingest(&outcome).await?;
    }

    let queries = engine.queries();

    println!("Demo League\n");
    println!("Pos Team      Pld  W  D  L  GF  GA  GD Pts Form");
    for entry in queries.standings("demo-league").await? {
        let r = &entry.record;
        println!(
            "{:>3} {:<9} {:>3} {:>2} {:>2} {:>2} {:>3} {:>3} {:>3} {:>3} {}",
            entry.position,
            r.team,
            r.matches_played,
            r.wins,
            r.draws,
            r.losses,
            r.goals_for,
            r.goals_against,
            r.goal_difference,
            r.points,
            r.form_string(),
        );
    }

    let summary = queries.league_summary("demo-league").await?;
    println!(
        "\n{} matches, {} goals ({} per match)",
        summary.total_matches, summary.total_goals, summary.average_goals_per_match
    );
    println!(
        "Top scorers: {}; best defense: {}; most clean sheets: {}",
        summary.highest_scoring_team, summary.best_defense_team, summary.most_clean_sheets
    );

    Ok(())
}
