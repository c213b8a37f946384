//! Deterministic ranking of standings records
//!
//! Pure functions: same input, same table, every time. The tie-break chain
//! is part of the compatibility contract: points, then goal difference,
//! then goals scored, then team name ascending. Team names are unique
//! within a league, so the chain is a total order and no two teams can be
//! ranked ambiguously.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::StandingsRecord;

/// One row of a ranked league table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    /// 1-based table position
    pub position: u32,
    #[serde(flatten)]
    pub record: StandingsRecord,
}

/// Compare two records by the table tie-break chain
fn table_order(a: &StandingsRecord, b: &StandingsRecord) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_difference.cmp(&a.goal_difference))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
        .then_with(|| a.team.cmp(&b.team))
}

/// Rank a league's records into a table with assigned positions
pub fn rank(mut records: Vec<StandingsRecord>) -> Vec<TableEntry> {
    records.sort_by(table_order);
    records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| TableEntry {
            position: idx as u32 + 1,
            record,
        })
        .collect()
}

/// Build the form table: teams with recent results, best current run first
///
/// Sorted by points, then by most recent activity; team name breaks any
/// remaining tie so the order stays total.
pub fn form_table(records: Vec<StandingsRecord>) -> Vec<StandingsRecord> {
    let mut with_form: Vec<StandingsRecord> = records
        .into_iter()
        .filter(|record| !record.form.is_empty())
        .collect();

    with_form.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.last_match_date.cmp(&a.last_match_date))
            .then_with(|| a.team.cmp(&b.team))
    });

    with_form
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TeamResult;
    use chrono::{TimeZone, Utc};

    fn record(team: &str, points: u32, gd: i64, gf: u32) -> StandingsRecord {
        let mut r = StandingsRecord::new("league-1", team);
        r.points = points;
        r.goal_difference = gd;
        r.goals_for = gf;
        r
    }

    #[test]
    fn ranks_by_points_first() {
        let table = rank(vec![record("Beta", 1, -1, 1), record("Alpha", 4, 1, 2)]);

        assert_eq!(table[0].position, 1);
        assert_eq!(table[0].record.team, "Alpha");
        assert_eq!(table[1].position, 2);
        assert_eq!(table[1].record.team, "Beta");
    }

    #[test]
    fn falls_through_goal_difference_and_goals_for() {
        let table = rank(vec![
            record("Alpha", 10, 5, 12),
            record("Beta", 10, 7, 9),
            record("Gamma", 10, 5, 15),
        ]);

        let order: Vec<&str> = table.iter().map(|e| e.record.team.as_str()).collect();
        assert_eq!(order, vec!["Beta", "Gamma", "Alpha"]);
    }

    #[test]
    fn name_is_the_final_tie_break() {
        // Charlie equals Alpha on points, goal difference and goals scored;
        // Alpha ranks above purely by name.
        let table = rank(vec![record("Charlie", 4, 1, 2), record("Alpha", 4, 1, 2)]);

        assert_eq!(table[0].record.team, "Alpha");
        assert_eq!(table[0].position, 1);
        assert_eq!(table[1].record.team, "Charlie");
        assert_eq!(table[1].position, 2);
    }

    #[test]
    fn ranking_is_deterministic() {
        let records = vec![
            record("Gamma", 7, 2, 8),
            record("Alpha", 7, 2, 8),
            record("Beta", 9, -1, 3),
        ];

        let first = rank(records.clone());
        let second = rank(records);
        assert_eq!(first, second);
    }

    #[test]
    fn form_table_excludes_teams_without_results() {
        let date = |day| Utc.with_ymd_and_hms(2025, 3, day, 15, 0, 0).unwrap();

        let mut active = record("Alpha", 6, 3, 5);
        active.form = vec![TeamResult::Win, TeamResult::Win];
        active.last_match_date = Some(date(2));

        let mut recent = record("Beta", 6, 0, 4);
        recent.form = vec![TeamResult::Draw];
        recent.last_match_date = Some(date(5));

        let idle = record("Gamma", 0, 0, 0);

        let table = form_table(vec![active.clone(), idle, recent.clone()]);
        // Equal points: Beta played more recently, so it leads
        assert_eq!(table, vec![recent, active]);
    }
}
