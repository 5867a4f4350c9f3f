// Batch upserts for teams, schedule and statistics.
//
// Each public method runs its whole batch in one transaction. If any statement
// fails the transaction is dropped without commit, so nothing from that batch
// is kept.

use anyhow::{Context, Result};
use rusqlite::{params, Transaction};
use tracing::debug;

use super::Database;
use crate::models::{ScheduledGame, Team, TeamStatistics};

/// Outcome of one ingest batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Rows inserted or overwritten.
    pub stored: usize,
    /// Records rejected before reaching the table.
    pub skipped: Vec<IngestSkip>,
}

/// A record the batch refused to store, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSkip {
    pub id: String,
    pub reason: String,
}

impl Database {
    /// Upsert every team in `teams`, keyed by team id. Existing rows are
    /// overwritten field by field with the incoming values.
    pub fn ingest_teams(&self, teams: &[Team]) -> Result<IngestReport> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin teams transaction")?;

        let mut report = IngestReport::default();
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO teams (id, name, market, abbr)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                        name   = excluded.name,
                        market = excluded.market,
                        abbr   = excluded.abbr",
                )
                .context("failed to prepare team upsert")?;

            for team in teams {
                stmt.execute(params![team.id, team.name, team.market, team.abbr])
                    .with_context(|| format!("failed to upsert team {}", team.id))?;
                report.stored += 1;
            }
        }

        tx.commit().context("failed to commit teams")?;
        debug!(stored = report.stored, "teams batch committed");
        Ok(report)
    }

    /// Upsert one team's season statistics. The three blobs are stored as
    /// serialized JSON. A team that is not in `teams` is skipped, not stored.
    pub fn ingest_statistics(&self, stats: &TeamStatistics) -> Result<IngestReport> {
        let hitting = serde_json::to_string(&stats.hitting_overall)
            .context("failed to serialize hitting stats")?;
        let pitching = serde_json::to_string(&stats.pitching_overall)
            .context("failed to serialize pitching stats")?;
        let fielding = serde_json::to_string(&stats.fielding_overall)
            .context("failed to serialize fielding stats")?;

        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin statistics transaction")?;

        let mut report = IngestReport::default();
        if !team_exists(&tx, &stats.team_id)? {
            report.skipped.push(IngestSkip {
                id: stats.team_id.clone(),
                reason: format!("team {} is not stored", stats.team_id),
            });
            return Ok(report);
        }

        tx.execute(
            "INSERT INTO statistics
                (team_id, season_id, year, season_type, hitting_overall, pitching_overall, fielding_overall)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(team_id) DO UPDATE SET
                season_id        = excluded.season_id,
                year             = excluded.year,
                season_type      = excluded.season_type,
                hitting_overall  = excluded.hitting_overall,
                pitching_overall = excluded.pitching_overall,
                fielding_overall = excluded.fielding_overall",
            params![
                stats.team_id,
                stats.season_id,
                stats.year,
                stats.season_type,
                hitting,
                pitching,
                fielding,
            ],
        )
        .with_context(|| format!("failed to upsert statistics for team {}", stats.team_id))?;
        report.stored = 1;

        tx.commit().context("failed to commit statistics")?;
        Ok(report)
    }

    /// Upsert a schedule window's games, keyed by game id. Games whose home or
    /// away team is not stored are skipped and reported; the rest commit
    /// together.
    pub fn ingest_schedule(&self, games: &[ScheduledGame]) -> Result<IngestReport> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin schedule transaction")?;

        let mut report = IngestReport::default();
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO schedule
                        (game_id, date, scheduled_time, home_team_id, away_team_id,
                         venue_name, home_team_abbr, away_team_abbr, status)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                     ON CONFLICT(game_id) DO UPDATE SET
                        date           = excluded.date,
                        scheduled_time = excluded.scheduled_time,
                        home_team_id   = excluded.home_team_id,
                        away_team_id   = excluded.away_team_id,
                        venue_name     = excluded.venue_name,
                        home_team_abbr = excluded.home_team_abbr,
                        away_team_abbr = excluded.away_team_abbr,
                        status         = excluded.status",
                )
                .context("failed to prepare schedule upsert")?;

            for game in games {
                if let Some(reason) = missing_team(&tx, game)? {
                    report.skipped.push(IngestSkip {
                        id: game.game_id.clone(),
                        reason,
                    });
                    continue;
                }

                stmt.execute(params![
                    game.game_id,
                    game.date.format("%Y-%m-%d").to_string(),
                    game.scheduled_time,
                    game.home_team_id,
                    game.away_team_id,
                    game.venue_name,
                    game.home_team_abbr,
                    game.away_team_abbr,
                    game.status,
                ])
                .with_context(|| format!("failed to upsert game {}", game.game_id))?;
                report.stored += 1;
            }
        }

        tx.commit().context("failed to commit schedule")?;
        debug!(
            stored = report.stored,
            skipped = report.skipped.len(),
            "schedule batch committed"
        );
        Ok(report)
    }
}

fn team_exists(tx: &Transaction<'_>, team_id: &str) -> Result<bool> {
    tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM teams WHERE id = ?1)",
        params![team_id],
        |row| row.get(0),
    )
    .with_context(|| format!("failed to look up team {team_id}"))
}

/// Describes the first side of `game` whose team row is absent, if any.
fn missing_team(tx: &Transaction<'_>, game: &ScheduledGame) -> Result<Option<String>> {
    for (side, team_id) in [("home", &game.home_team_id), ("away", &game.away_team_id)] {
        if !team_exists(tx, team_id)? {
            return Ok(Some(format!("{side} team {team_id} is not stored")));
        }
    }
    Ok(None)
}
