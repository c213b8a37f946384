//! Domain model for league standings
//!
//! Two kinds of values live here:
//!
//! - [`StandingsRecord`]: the per-(league, team) aggregate row that the
//!   store persists and the read views are derived from.
//! - [`MatchOutcome`]: the transient input describing one finalized match.
//!
//! The only way a record changes is [`fold_outcome`]: one pure per-match
//! fold shared by the incremental updater and the full recalculation path.
//! Keeping a single fold makes their equivalence structural instead of a
//! property that two formula sets have to keep re-proving.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of results kept in a team's form sequence
pub const FORM_LIMIT: usize = 5;

/// Result of one match from one team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "L")]
    Loss,
}

impl TeamResult {
    /// One-letter symbol used in form strings
    pub fn symbol(&self) -> char {
        match self {
            TeamResult::Win => 'W',
            TeamResult::Draw => 'D',
            TeamResult::Loss => 'L',
        }
    }
}

/// Which side of the fixture a team played on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    Home,
    Away,
}

/// A single finalized match result
///
/// Supplied exactly once per completed fixture by the external
/// match-lifecycle collaborator. This engine does not deduplicate repeated
/// delivery; a second delivery of the same outcome double-applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Opaque league identifier
    pub league_id: String,
    /// Home team name (unique within the league)
    pub home_team: String,
    /// Away team name
    pub away_team: String,
    /// Goals scored by the home side
    pub home_goals: u32,
    /// Goals scored by the away side
    pub away_goals: u32,
    /// When the match was played; orders full-history replays
    pub date: DateTime<Utc>,
}

impl MatchOutcome {
    /// Create a validated match outcome
    ///
    /// Goal counts are taken as `i64` so that callers assembling outcomes
    /// from untyped inputs get a [`Error::Validation`] for negative counts
    /// instead of a panic or a silent wrap.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` if the league id or either team name is blank
    /// - `Error::Validation` if either goal count is negative
    pub fn new(
        league_id: impl Into<String>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_goals: i64,
        away_goals: i64,
        date: DateTime<Utc>,
    ) -> Result<Self> {
        let league_id = league_id.into();
        let home_team = home_team.into();
        let away_team = away_team.into();

        if league_id.trim().is_empty() {
            return Err(Error::validation("League id cannot be empty"));
        }
        if home_team.trim().is_empty() || away_team.trim().is_empty() {
            return Err(Error::validation("Team names cannot be empty"));
        }
        if home_goals < 0 || away_goals < 0 {
            return Err(Error::validation(format!(
                "Goal counts cannot be negative (home: {}, away: {})",
                home_goals, away_goals
            )));
        }

        Ok(Self {
            league_id,
            home_team,
            away_team,
            home_goals: home_goals as u32,
            away_goals: away_goals as u32,
            date,
        })
    }

    /// Derive the result symbol for one side of this match
    pub fn result_for(&self, venue: Venue) -> TeamResult {
        let (scored, conceded) = self.goals_for(venue);
        if scored > conceded {
            TeamResult::Win
        } else if scored < conceded {
            TeamResult::Loss
        } else {
            TeamResult::Draw
        }
    }

    /// (scored, conceded) goal counts for one side
    pub fn goals_for(&self, venue: Venue) -> (u32, u32) {
        match venue {
            Venue::Home => (self.home_goals, self.away_goals),
            Venue::Away => (self.away_goals, self.home_goals),
        }
    }

    /// Team name for one side
    pub fn team_for(&self, venue: Venue) -> &str {
        match venue {
            Venue::Home => &self.home_team,
            Venue::Away => &self.away_team,
        }
    }
}

/// Aggregate standings row for one team in one league
///
/// Identity is `(league_id, team)`, unique per league. A record is created
/// zeroed the first time a team appears in a league and is only ever
/// mutated through [`fold_outcome`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsRecord {
    pub league_id: String,
    pub team: String,

    pub matches_played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,

    pub goals_for: u32,
    pub goals_against: u32,
    /// Always `goals_for - goals_against`
    pub goal_difference: i64,
    /// Always `wins * 3 + draws`
    pub points: u32,

    pub home_goals_for: u32,
    pub home_goals_against: u32,
    pub away_goals_for: u32,
    pub away_goals_against: u32,

    /// Most-recent-first result sequence, at most [`FORM_LIMIT`] entries
    pub form: Vec<TeamResult>,

    /// Matches in which the team conceded zero goals
    pub clean_sheets: u32,
    /// Matches in which the team scored zero goals
    pub failed_to_score: u32,

    /// `goals_for / matches_played`, rounded to 2 decimals, 0 when unplayed
    pub avg_goals_per_match: f64,
    /// `goals_against / matches_played`, rounded to 2 decimals, 0 when unplayed
    pub avg_goals_conceded_per_match: f64,

    pub last_match_date: Option<DateTime<Utc>>,
}

impl StandingsRecord {
    /// Create a zeroed record for a team's first appearance in a league
    pub fn new(league_id: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            league_id: league_id.into(),
            team: team.into(),
            matches_played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
            home_goals_for: 0,
            home_goals_against: 0,
            away_goals_for: 0,
            away_goals_against: 0,
            form: Vec::new(),
            clean_sheets: 0,
            failed_to_score: 0,
            avg_goals_per_match: 0.0,
            avg_goals_conceded_per_match: 0.0,
            last_match_date: None,
        }
    }

    /// Render the form sequence as a most-recent-first string, e.g. `"WDL"`
    pub fn form_string(&self) -> String {
        self.form.iter().map(TeamResult::symbol).collect()
    }
}

/// Round to two decimal places
///
/// The rounded averages are part of the read-view compatibility contract,
/// so every caller must go through the same helper.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fold one match outcome into one team's standings record
///
/// This is the single shared per-match update used by both the incremental
/// updater and the full recalculator. Base counters are incremented first,
/// then every derived field (`goal_difference`, `points`, the averages) is
/// recomputed from the new totals, so the arithmetic invariants hold after
/// every call by construction.
pub fn fold_outcome(record: &mut StandingsRecord, outcome: &MatchOutcome, venue: Venue) {
    let (scored, conceded) = outcome.goals_for(venue);
    let result = outcome.result_for(venue);

    record.matches_played += 1;
    record.goals_for += scored;
    record.goals_against += conceded;

    match result {
        TeamResult::Win => record.wins += 1,
        TeamResult::Draw => record.draws += 1,
        TeamResult::Loss => record.losses += 1,
    }

    match venue {
        Venue::Home => {
            record.home_goals_for += scored;
            record.home_goals_against += conceded;
        }
        Venue::Away => {
            record.away_goals_for += scored;
            record.away_goals_against += conceded;
        }
    }

    if conceded == 0 {
        record.clean_sheets += 1;
    }
    if scored == 0 {
        record.failed_to_score += 1;
    }

    record.goal_difference = i64::from(record.goals_for) - i64::from(record.goals_against);
    record.points = record.wins * 3 + record.draws;

    let played = f64::from(record.matches_played);
    record.avg_goals_per_match = round2(f64::from(record.goals_for) / played);
    record.avg_goals_conceded_per_match = round2(f64::from(record.goals_against) / played);

    record.last_match_date = Some(outcome.date);

    record.form.insert(0, result);
    record.form.truncate(FORM_LIMIT);
}
