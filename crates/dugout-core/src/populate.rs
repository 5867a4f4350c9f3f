// One populate pass: teams, then the schedule window, then statistics for
// every stored team. Each unit of work is independent; a failed fetch or
// batch is logged and recorded, and the run moves on.

use tracing::{error, info, warn};

use crate::db::{Database, IngestSkip};
use crate::sportradar::{ScheduleWindow, StatsSource};

/// A unit of work that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// What was being fetched or stored, e.g. `"statistics for team T1"`.
    pub unit: String,
    pub message: String,
}

/// Counts and problems from one populate pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub teams_stored: usize,
    /// Team-list entries that are not clubs.
    pub teams_skipped: Vec<IngestSkip>,
    pub games_stored: usize,
    pub games_skipped: Vec<IngestSkip>,
    pub stats_stored: usize,
    pub stats_skipped: Vec<IngestSkip>,
    pub failures: Vec<Failure>,
}

impl RunSummary {
    /// True when every unit of work completed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, unit: impl Into<String>, message: impl Into<String>) {
        self.failures.push(Failure {
            unit: unit.into(),
            message: message.into(),
        });
    }
}

/// Run a full populate pass against `db`.
///
/// Requests are issued one at a time. The schema is assumed to exist already
/// (`Database::open` creates it).
pub async fn run(
    source: &dyn StatsSource,
    db: &Database,
    window: &ScheduleWindow,
) -> RunSummary {
    let mut summary = RunSummary::default();

    populate_teams(source, db, &mut summary).await;
    populate_schedule(source, db, window, &mut summary).await;
    populate_statistics(source, db, &mut summary).await;

    info!(
        teams = summary.teams_stored,
        games = summary.games_stored,
        stats = summary.stats_stored,
        failures = summary.failures.len(),
        "populate run finished"
    );
    summary
}

async fn populate_teams(source: &dyn StatsSource, db: &Database, summary: &mut RunSummary) {
    let list = match source.fetch_teams().await {
        Ok(list) => list,
        Err(e) => {
            warn!(kind = e.kind(), "{e}");
            summary.fail(e.entity(), e.to_string());
            return;
        }
    };

    for skipped in &list.skipped {
        warn!(
            "Skipping team {} ({}): {}",
            skipped.id, skipped.name, skipped.reason
        );
        summary.teams_skipped.push(IngestSkip {
            id: skipped.id.clone(),
            reason: skipped.reason.to_string(),
        });
    }

    match db.ingest_teams(&list.teams) {
        Ok(report) => {
            info!("Imported {} teams", report.stored);
            summary.teams_stored += report.stored;
        }
        Err(e) => {
            error!("Teams batch rolled back: {e:#}");
            summary.fail("teams", format!("{e:#}"));
        }
    }
}

async fn populate_schedule(
    source: &dyn StatsSource,
    db: &Database,
    window: &ScheduleWindow,
    summary: &mut RunSummary,
) {
    let games = match source.fetch_schedule(window).await {
        Ok(games) => games,
        Err(e) => {
            warn!(kind = e.kind(), "{e}");
            summary.fail(e.entity(), e.to_string());
            return;
        }
    };

    match db.ingest_schedule(&games) {
        Ok(report) => {
            for skip in &report.skipped {
                warn!("Skipping game {}: {}", skip.id, skip.reason);
            }
            info!("Imported {} games for {window}", report.stored);
            summary.games_stored += report.stored;
            summary.games_skipped.extend(report.skipped);
        }
        Err(e) => {
            error!("Schedule batch for {window} rolled back: {e:#}");
            summary.fail(format!("schedule for {window}"), format!("{e:#}"));
        }
    }
}

async fn populate_statistics(source: &dyn StatsSource, db: &Database, summary: &mut RunSummary) {
    let team_ids = match db.team_ids() {
        Ok(ids) => ids,
        Err(e) => {
            error!("Could not list stored teams: {e:#}");
            summary.fail("statistics", format!("{e:#}"));
            return;
        }
    };

    for team_id in team_ids {
        let stats = match source.fetch_team_statistics(&team_id).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(kind = e.kind(), "{e}");
                summary.fail(e.entity(), e.to_string());
                continue;
            }
        };

        match db.ingest_statistics(&stats) {
            Ok(report) => {
                for skip in &report.skipped {
                    warn!("Skipping statistics for {}: {}", skip.id, skip.reason);
                }
                summary.stats_stored += report.stored;
                summary.stats_skipped.extend(report.skipped);
            }
            Err(e) => {
                error!("Statistics for team {team_id} rolled back: {e:#}");
                summary.fail(format!("statistics for team {team_id}"), format!("{e:#}"));
            }
        }
    }

    info!("Imported statistics for {} teams", summary.stats_stored);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ScheduledGame, SkippedTeam, Team, TeamList, TeamSkipReason, TeamStatistics,
    };
    use crate::sportradar::FetchError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::collections::HashMap;

    /// Canned source: `None` for a resource means the request fails.
    #[derive(Default)]
    struct FakeSource {
        teams: Option<TeamList>,
        games: Option<Vec<ScheduledGame>>,
        stats: HashMap<String, TeamStatistics>,
    }

    #[async_trait]
    impl StatsSource for FakeSource {
        async fn fetch_teams(&self) -> Result<TeamList, FetchError> {
            self.teams.clone().ok_or_else(|| FetchError::Status {
                entity: "teams".into(),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            })
        }

        async fn fetch_team_statistics(
            &self,
            team_id: &str,
        ) -> Result<TeamStatistics, FetchError> {
            self.stats
                .get(team_id)
                .cloned()
                .ok_or_else(|| FetchError::MissingField {
                    entity: format!("statistics for team {team_id}"),
                    detail: "missing field `statistics`".into(),
                })
        }

        async fn fetch_schedule(
            &self,
            window: &ScheduleWindow,
        ) -> Result<Vec<ScheduledGame>, FetchError> {
            self.games.clone().ok_or_else(|| FetchError::Status {
                entity: format!("schedule for {window}"),
                status: reqwest::StatusCode::NOT_FOUND,
            })
        }
    }

    fn team(id: &str, name: &str, market: &str, abbr: &str) -> Team {
        Team {
            id: id.into(),
            name: name.into(),
            market: market.into(),
            abbr: abbr.into(),
        }
    }

    fn team_list() -> TeamList {
        TeamList {
            teams: vec![
                team("T1", "Brewers", "Milwaukee", "MIL"),
                team("T2", "Cubs", "Chicago", "CHC"),
            ],
            skipped: vec![SkippedTeam {
                id: "L1".into(),
                name: "American League".into(),
                reason: TeamSkipReason::MissingMarket,
            }],
        }
    }

    fn game(id: &str, home: &str, away: &str) -> ScheduledGame {
        ScheduledGame {
            game_id: id.into(),
            date: day(),
            scheduled_time: "2025-07-18T18:10:00Z".into(),
            home_team_id: home.into(),
            away_team_id: away.into(),
            venue_name: "Wrigley Field".into(),
            home_team_abbr: "CHC".into(),
            away_team_abbr: "MIL".into(),
            status: "scheduled".into(),
        }
    }

    fn stats(team_id: &str) -> TeamStatistics {
        TeamStatistics {
            team_id: team_id.into(),
            season_id: "s".into(),
            year: 2025,
            season_type: "REG".into(),
            hitting_overall: json!({}),
            pitching_overall: json!({}),
            fielding_overall: json!({}),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 18).unwrap()
    }

    #[tokio::test]
    async fn full_run_stores_everything() {
        let db = Database::open(":memory:").unwrap();
        let source = FakeSource {
            teams: Some(team_list()),
            games: Some(vec![game("G1", "T2", "T1")]),
            stats: [("T1".to_string(), stats("T1")), ("T2".to_string(), stats("T2"))]
                .into_iter()
                .collect(),
        };

        let summary = run(&source, &db, &ScheduleWindow::Day(day())).await;

        assert!(summary.is_clean(), "{:?}", summary.failures);
        assert_eq!(summary.teams_stored, 2);
        assert_eq!(
            summary.teams_skipped,
            vec![IngestSkip {
                id: "L1".to_string(),
                reason: "missing market".to_string(),
            }]
        );
        assert_eq!(summary.games_stored, 1);
        assert_eq!(summary.stats_stored, 2);
        assert_eq!(db.games_on(day()).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn team_fetch_failure_does_not_stop_the_run() {
        let db = Database::open(":memory:").unwrap();
        db.ingest_teams(&team_list().teams).unwrap();

        let source = FakeSource {
            teams: None,
            games: Some(vec![game("G1", "T2", "T1")]),
            stats: [("T1".to_string(), stats("T1"))].into_iter().collect(),
        };

        let summary = run(&source, &db, &ScheduleWindow::Day(day())).await;

        assert_eq!(summary.teams_stored, 0);
        assert_eq!(summary.games_stored, 1);
        assert_eq!(summary.stats_stored, 1);

        // teams failed, and T2's statistics are missing
        let units: Vec<&str> = summary.failures.iter().map(|f| f.unit.as_str()).collect();
        assert_eq!(units, vec!["teams", "statistics for team T2"]);
    }

    #[tokio::test]
    async fn schedule_failure_is_recorded_and_stats_still_run() {
        let db = Database::open(":memory:").unwrap();
        let source = FakeSource {
            teams: Some(team_list()),
            games: None,
            stats: [("T1".to_string(), stats("T1")), ("T2".to_string(), stats("T2"))]
                .into_iter()
                .collect(),
        };

        let summary = run(&source, &db, &ScheduleWindow::Day(day())).await;

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].unit, "schedule for 2025-07-18");
        assert_eq!(summary.stats_stored, 2);
    }

    #[tokio::test]
    async fn games_for_unknown_teams_are_reported_as_skips() {
        let db = Database::open(":memory:").unwrap();
        let source = FakeSource {
            teams: Some(team_list()),
            games: Some(vec![game("G1", "T2", "T1"), game("G2", "T2", "T77")]),
            stats: HashMap::new(),
        };

        let summary = run(&source, &db, &ScheduleWindow::Day(day())).await;

        assert_eq!(summary.games_stored, 1);
        assert_eq!(summary.games_skipped.len(), 1);
        assert_eq!(summary.games_skipped[0].id, "G2");
    }

    #[tokio::test]
    async fn rerunning_is_idempotent() {
        let db = Database::open(":memory:").unwrap();
        let source = FakeSource {
            teams: Some(team_list()),
            games: Some(vec![game("G1", "T2", "T1")]),
            stats: [("T1".to_string(), stats("T1"))].into_iter().collect(),
        };

        run(&source, &db, &ScheduleWindow::Day(day())).await;
        run(&source, &db, &ScheduleWindow::Day(day())).await;

        assert_eq!(db.list_teams().unwrap().len(), 2);
        assert_eq!(db.games_on(day()).unwrap().len(), 1);
        assert_eq!(db.all_team_stats().unwrap().len(), 1);
    }
}
