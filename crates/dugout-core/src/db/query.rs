// Read-only accessors used by the CLI. Every query returns an empty result
// rather than an error when nothing matches.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::models::{normalize_abbr, ScheduledGame, Team, TeamStatistics, TeamWithStats};

impl Database {
    /// All stored teams, ordered by market then name.
    pub fn list_teams(&self) -> Result<Vec<Team>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, name, market, abbr FROM teams ORDER BY market, name")
            .context("failed to prepare list_teams query")?;

        let teams = stmt
            .query_map([], team_from_row)
            .context("failed to query teams")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map team rows")?;

        Ok(teams)
    }

    /// Ids of every stored team, in id order.
    pub fn team_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id FROM teams ORDER BY id")
            .context("failed to prepare team_ids query")?;

        let ids = stmt
            .query_map([], |row| row.get(0))
            .context("failed to query team ids")?
            .collect::<std::result::Result<Vec<String>, _>>()
            .context("failed to map team id rows")?;

        Ok(ids)
    }

    /// Look up a team by abbreviation (case-insensitive) together with its
    /// stored statistics. `Ok(None)` when no team has that abbreviation;
    /// `stats` is `None` when the team exists but has no statistics row.
    pub fn team_stats(&self, abbr: &str) -> Result<Option<TeamWithStats>> {
        let abbr = normalize_abbr(abbr);
        let conn = self.conn();

        let found = conn
            .query_row(
                "SELECT t.id, t.name, t.market, t.abbr,
                        s.season_id, s.year, s.season_type,
                        s.hitting_overall, s.pitching_overall, s.fielding_overall
                 FROM teams t
                 LEFT JOIN statistics s ON t.id = s.team_id
                 WHERE t.abbr = ?1
                 ORDER BY t.id
                 LIMIT 1",
                params![abbr],
                |row| {
                    let team = team_from_row(row)?;
                    let season_id: Option<String> = row.get(4)?;
                    let stats = match season_id {
                        Some(season_id) => Some(TeamStatistics {
                            team_id: team.id.clone(),
                            season_id,
                            year: row.get(5)?,
                            season_type: row.get(6)?,
                            hitting_overall: json_column(row, 7)?,
                            pitching_overall: json_column(row, 8)?,
                            fielding_overall: json_column(row, 9)?,
                        }),
                        None => None,
                    };
                    Ok(TeamWithStats { team, stats })
                },
            )
            .optional()
            .with_context(|| format!("failed to query stats for {abbr}"))?;

        Ok(found)
    }

    /// Every team that has a statistics row, ordered by abbreviation.
    pub fn all_team_stats(&self) -> Result<Vec<TeamWithStats>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT t.id, t.name, t.market, t.abbr,
                        s.season_id, s.year, s.season_type,
                        s.hitting_overall, s.pitching_overall, s.fielding_overall
                 FROM teams t
                 JOIN statistics s ON t.id = s.team_id
                 ORDER BY t.abbr, t.id",
            )
            .context("failed to prepare all_team_stats query")?;

        let rows = stmt
            .query_map([], |row| {
                let team = team_from_row(row)?;
                let stats = TeamStatistics {
                    team_id: team.id.clone(),
                    season_id: row.get(4)?,
                    year: row.get(5)?,
                    season_type: row.get(6)?,
                    hitting_overall: json_column(row, 7)?,
                    pitching_overall: json_column(row, 8)?,
                    fielding_overall: json_column(row, 9)?,
                };
                Ok(TeamWithStats {
                    team,
                    stats: Some(stats),
                })
            })
            .context("failed to query team statistics")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map team statistics rows")?;

        Ok(rows)
    }

    /// Games filed under `date`, ordered by scheduled time.
    pub fn games_on(&self, date: NaiveDate) -> Result<Vec<ScheduledGame>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT game_id, date, scheduled_time, home_team_id, away_team_id,
                        venue_name, home_team_abbr, away_team_abbr, status
                 FROM schedule
                 WHERE date = ?1
                 ORDER BY scheduled_time, game_id",
            )
            .context("failed to prepare games_on query")?;

        let games = stmt
            .query_map(params![date.format("%Y-%m-%d").to_string()], |row| {
                Ok(ScheduledGame {
                    game_id: row.get(0)?,
                    date: date_column(row, 1)?,
                    scheduled_time: row.get(2)?,
                    home_team_id: row.get(3)?,
                    away_team_id: row.get(4)?,
                    venue_name: row.get(5)?,
                    home_team_abbr: row.get(6)?,
                    away_team_abbr: row.get(7)?,
                    status: row.get(8)?,
                })
            })
            .context("failed to query schedule")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map schedule rows")?;

        Ok(games)
    }

    /// Games filed under today's local date.
    pub fn games_today(&self) -> Result<Vec<ScheduledGame>> {
        self.games_on(chrono::Local::now().date_naive())
    }
}

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        market: row.get(2)?,
        abbr: row.get(3)?,
    })
}

fn json_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<serde_json::Value> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
