//! Read-only query facade over the standings store
//!
//! Every view here is side-effect-free and safe to run concurrently with
//! ingestion; each call reads one consistent league snapshot from the store
//! and derives the view in memory. Queries against a league the store has
//! never seen return empty or defaulted results, never an error; an empty
//! league is a normal state, not an exceptional one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{StandingsRecord, round2};
use crate::ranking::{self, TableEntry};
use crate::traits::StandingsStore;

/// Value used for team-name fields of an empty league summary
const NO_TEAM: &str = "N/A";

/// Per-team home/away goal split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeAwaySplit {
    pub team: String,
    pub home_goals_for: u32,
    pub home_goals_against: u32,
    pub home_goal_difference: i64,
    pub away_goals_for: u32,
    pub away_goals_against: u32,
    pub away_goal_difference: i64,
}

/// League-wide aggregate summary
///
/// `total_matches` counts physical matches: the per-row `matches_played`
/// sum is halved, since every match contributes to exactly two rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSummary {
    pub total_goals: u64,
    pub average_goals_per_match: f64,
    pub total_matches: u64,
    pub total_teams: u64,
    pub highest_scoring_team: String,
    pub best_defense_team: String,
    pub most_clean_sheets: String,
}

impl LeagueSummary {
    fn empty() -> Self {
        Self {
            total_goals: 0,
            average_goals_per_match: 0.0,
            total_matches: 0,
            total_teams: 0,
            highest_scoring_team: NO_TEAM.to_string(),
            best_defense_team: NO_TEAM.to_string(),
            most_clean_sheets: NO_TEAM.to_string(),
        }
    }
}

/// Read-only views over one standings store
#[derive(Clone)]
pub struct StandingsQueries {
    store: Arc<dyn StandingsStore>,
}

impl StandingsQueries {
    /// Create a facade over a store
    pub fn new(store: Arc<dyn StandingsStore>) -> Self {
        Self { store }
    }

    /// The ranked league table
    pub async fn standings(&self, league_id: &str) -> Result<Vec<TableEntry>> {
        let records = self.store.list_league(league_id).await?;
        Ok(ranking::rank(records))
    }

    /// One team's aggregate statistics
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the team has no record in the league.
    pub async fn team_statistics(&self, league_id: &str, team: &str) -> Result<StandingsRecord> {
        self.store
            .get(league_id, team)
            .await?
            .ok_or_else(|| Error::not_found(format!("No record for team {} in {}", team, league_id)))
    }

    /// Teams ordered by goals scored, best first
    pub async fn top_scorers(&self, league_id: &str, limit: usize) -> Result<Vec<StandingsRecord>> {
        let mut records = self.store.list_league(league_id).await?;
        records.sort_by(|a, b| {
            b.goals_for
                .cmp(&a.goals_for)
                .then_with(|| a.team.cmp(&b.team))
        });
        records.truncate(limit);
        Ok(records)
    }

    /// Teams ordered by goals conceded, fewest first
    pub async fn top_defenses(
        &self,
        league_id: &str,
        limit: usize,
    ) -> Result<Vec<StandingsRecord>> {
        let mut records = self.store.list_league(league_id).await?;
        records.sort_by(|a, b| {
            a.goals_against
                .cmp(&b.goals_against)
                .then_with(|| a.team.cmp(&b.team))
        });
        records.truncate(limit);
        Ok(records)
    }

    /// Per-team home and away goal splits, alphabetical
    pub async fn home_away_stats(&self, league_id: &str) -> Result<Vec<HomeAwaySplit>> {
        let records = self.store.list_league(league_id).await?;
        let mut splits: Vec<HomeAwaySplit> = records
            .into_iter()
            .map(|record| HomeAwaySplit {
                home_goal_difference: i64::from(record.home_goals_for)
                    - i64::from(record.home_goals_against),
                away_goal_difference: i64::from(record.away_goals_for)
                    - i64::from(record.away_goals_against),
                team: record.team,
                home_goals_for: record.home_goals_for,
                home_goals_against: record.home_goals_against,
                away_goals_for: record.away_goals_for,
                away_goals_against: record.away_goals_against,
            })
            .collect();
        splits.sort_by(|a, b| a.team.cmp(&b.team));
        Ok(splits)
    }

    /// Teams with a non-empty recent-results sequence, best run first
    pub async fn form_table(&self, league_id: &str) -> Result<Vec<StandingsRecord>> {
        let records = self.store.list_league(league_id).await?;
        Ok(ranking::form_table(records))
    }

    /// League-wide totals and superlatives
    pub async fn league_summary(&self, league_id: &str) -> Result<LeagueSummary> {
        let records = self.store.list_league(league_id).await?;
        if records.is_empty() {
            return Ok(LeagueSummary::empty());
        }

        let total_goals: u64 = records.iter().map(|r| u64::from(r.goals_for)).sum();
        let played_rows: u64 = records.iter().map(|r| u64::from(r.matches_played)).sum();
        // Each match shows up in both teams' rows
        let total_matches = played_rows / 2;

        let average_goals_per_match = if total_matches > 0 {
            round2(total_goals as f64 / total_matches as f64)
        } else {
            0.0
        };

        let highest_scoring_team = records
            .iter()
            .max_by(|a, b| {
                a.goals_for
                    .cmp(&b.goals_for)
                    .then_with(|| b.team.cmp(&a.team))
            })
            .map(|r| r.team.clone())
            .unwrap_or_else(|| NO_TEAM.to_string());

        let best_defense_team = records
            .iter()
            .min_by(|a, b| {
                a.goals_against
                    .cmp(&b.goals_against)
                    .then_with(|| a.team.cmp(&b.team))
            })
            .map(|r| r.team.clone())
            .unwrap_or_else(|| NO_TEAM.to_string());

        let most_clean_sheets = records
            .iter()
            .max_by(|a, b| {
                a.clean_sheets
                    .cmp(&b.clean_sheets)
                    .then_with(|| b.team.cmp(&a.team))
            })
            .map(|r| r.team.clone())
            .unwrap_or_else(|| NO_TEAM.to_string());

        Ok(LeagueSummary {
            total_goals,
            average_goals_per_match,
            total_matches,
            total_teams: records.len() as u64,
            highest_scoring_team,
            best_defense_team,
            most_clean_sheets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MatchOutcome;
    use crate::store::MemoryStandingsStore;
    use chrono::{TimeZone, Utc};

    async fn seeded_store() -> Arc<dyn StandingsStore> {
        let store = MemoryStandingsStore::new();
        let date = |day| Utc.with_ymd_and_hms(2025, 3, day, 15, 0, 0).unwrap();

        // Alpha 2-1 Beta, Beta 0-0 Alpha, Gamma 0-3 Alpha
        for (home, away, hg, ag, day) in [
            ("Alpha", "Beta", 2, 1, 1),
            ("Beta", "Alpha", 0, 0, 2),
            ("Gamma", "Alpha", 0, 3, 3),
        ] {
            let outcome = MatchOutcome::new("league-1", home, away, hg, ag, date(day)).unwrap();
            store.apply_outcome(&outcome).await.unwrap();
        }

        Arc::new(store)
    }

    #[tokio::test]
    async fn standings_rank_and_position() {
        let queries = StandingsQueries::new(seeded_store().await);
        let table = queries.standings("league-1").await.unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table[0].record.team, "Alpha");
        assert_eq!(table[0].position, 1);
        assert_eq!(table[0].record.points, 7);
        assert_eq!(table[1].record.team, "Beta");
        assert_eq!(table[2].record.team, "Gamma");
    }

    #[tokio::test]
    async fn team_statistics_not_found() {
        let queries = StandingsQueries::new(seeded_store().await);

        let alpha = queries.team_statistics("league-1", "Alpha").await.unwrap();
        assert_eq!(alpha.goals_for, 5);

        let missing = queries.team_statistics("league-1", "Delta").await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn top_scorers_and_defenses() {
        let queries = StandingsQueries::new(seeded_store().await);

        let scorers = queries.top_scorers("league-1", 2).await.unwrap();
        assert_eq!(scorers.len(), 2);
        assert_eq!(scorers[0].team, "Alpha");
        assert_eq!(scorers[1].team, "Beta");

        let defenses = queries.top_defenses("league-1", 1).await.unwrap();
        assert_eq!(defenses[0].team, "Alpha");
        assert_eq!(defenses[0].goals_against, 1);
    }

    #[tokio::test]
    async fn home_away_split_directions() {
        let queries = StandingsQueries::new(seeded_store().await);
        let splits = queries.home_away_stats("league-1").await.unwrap();

        let alpha = splits.iter().find(|s| s.team == "Alpha").unwrap();
        assert_eq!(alpha.home_goals_for, 2);
        assert_eq!(alpha.home_goals_against, 1);
        assert_eq!(alpha.home_goal_difference, 1);
        assert_eq!(alpha.away_goals_for, 3);
        assert_eq!(alpha.away_goals_against, 0);
        assert_eq!(alpha.away_goal_difference, 3);
    }

    #[tokio::test]
    async fn summary_counts_each_match_once() {
        let queries = StandingsQueries::new(seeded_store().await);
        let summary = queries.league_summary("league-1").await.unwrap();

        assert_eq!(summary.total_matches, 3);
        assert_eq!(summary.total_goals, 6);
        assert_eq!(summary.average_goals_per_match, 2.0);
        assert_eq!(summary.total_teams, 3);
        assert_eq!(summary.highest_scoring_team, "Alpha");
        assert_eq!(summary.best_defense_team, "Alpha");
        assert_eq!(summary.most_clean_sheets, "Alpha");
    }

    #[tokio::test]
    async fn empty_league_returns_defaults() {
        let store: Arc<dyn StandingsStore> = Arc::new(MemoryStandingsStore::new());
        let queries = StandingsQueries::new(store);

        let summary = queries.league_summary("nowhere").await.unwrap();
        assert_eq!(summary.total_goals, 0);
        assert_eq!(summary.average_goals_per_match, 0.0);
        assert_eq!(summary.total_matches, 0);
        assert_eq!(summary.total_teams, 0);
        assert_eq!(summary.highest_scoring_team, "N/A");
        assert_eq!(summary.best_defense_team, "N/A");
        assert_eq!(summary.most_clean_sheets, "N/A");

        assert!(queries.standings("nowhere").await.unwrap().is_empty());
        assert!(queries.top_scorers("nowhere", 5).await.unwrap().is_empty());
        assert!(queries.form_table("nowhere").await.unwrap().is_empty());
    }
}
