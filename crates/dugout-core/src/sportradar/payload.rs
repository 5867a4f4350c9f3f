// JSON payload decoding for the three Sportradar endpoints.
//
// Decoding is two-step so failures can be classified: the body must first be
// valid JSON (otherwise `MalformedJson`), then it must have the expected shape
// (otherwise `MissingField`).

use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::FetchError;
use crate::models::{
    normalize_abbr, ScheduledGame, SkippedTeam, Team, TeamList, TeamSkipReason, TeamStatistics,
};

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawTeamList {
    teams: Vec<RawTeam>,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    id: String,
    #[serde(default)]
    name: String,
    market: Option<String>,
    abbr: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStatistics {
    season: RawSeason,
    statistics: RawStatBlocks,
}

#[derive(Debug, Deserialize)]
struct RawSeason {
    id: String,
    year: i32,
    #[serde(rename = "type")]
    season_type: String,
}

#[derive(Debug, Deserialize)]
struct RawStatBlocks {
    hitting: RawOverall,
    pitching: RawOverall,
    fielding: RawOverall,
}

#[derive(Debug, Deserialize)]
struct RawOverall {
    overall: Value,
}

#[derive(Debug, Deserialize)]
struct RawSchedule {
    /// Present on the daily endpoint only.
    date: Option<NaiveDate>,
    games: Vec<RawGame>,
}

#[derive(Debug, Deserialize)]
struct RawGame {
    id: String,
    scheduled: String,
    home: RawSide,
    away: RawSide,
    venue: RawVenue,
    status: String,
}

#[derive(Debug, Deserialize)]
struct RawSide {
    id: String,
    abbr: String,
}

#[derive(Debug, Deserialize)]
struct RawVenue {
    name: String,
}

// ---------------------------------------------------------------------------
// Decoders
// ---------------------------------------------------------------------------

/// Decode a league team list, separating clubs from league/division nodes.
pub fn parse_teams(entity: &str, body: &str) -> Result<TeamList, FetchError> {
    let raw: RawTeamList = decode(entity, body)?;

    let mut list = TeamList::default();
    for team in raw.teams {
        let market = non_blank(team.market);
        let abbr = non_blank(team.abbr);
        match (market, abbr) {
            (Some(market), Some(abbr)) => list.teams.push(Team {
                id: team.id,
                name: team.name,
                market,
                abbr: normalize_abbr(&abbr),
            }),
            (None, _) => list.skipped.push(SkippedTeam {
                id: team.id,
                name: team.name,
                reason: TeamSkipReason::MissingMarket,
            }),
            (Some(_), None) => list.skipped.push(SkippedTeam {
                id: team.id,
                name: team.name,
                reason: TeamSkipReason::MissingAbbr,
            }),
        }
    }
    Ok(list)
}

/// Decode a team's seasonal statistics. `team_id` is the id the request was
/// made for.
pub fn parse_statistics(
    entity: &str,
    team_id: &str,
    body: &str,
) -> Result<TeamStatistics, FetchError> {
    let raw: RawStatistics = decode(entity, body)?;
    Ok(TeamStatistics {
        team_id: team_id.to_string(),
        season_id: raw.season.id,
        year: raw.season.year,
        season_type: raw.season.season_type,
        hitting_overall: raw.statistics.hitting.overall,
        pitching_overall: raw.statistics.pitching.overall,
        fielding_overall: raw.statistics.fielding.overall,
    })
}

/// Decode a daily or season schedule.
///
/// A root `date` files every game under that day. Without one, each game is
/// filed under the date portion of its own `scheduled` timestamp.
pub fn parse_schedule(entity: &str, body: &str) -> Result<Vec<ScheduledGame>, FetchError> {
    let raw: RawSchedule = decode(entity, body)?;

    raw.games
        .into_iter()
        .map(|game| -> Result<ScheduledGame, FetchError> {
            let date = match raw.date {
                Some(date) => date,
                None => scheduled_date(&game.scheduled).ok_or_else(|| FetchError::MissingField {
                    entity: entity.to_string(),
                    detail: format!(
                        "game {} has unparseable scheduled timestamp {:?}",
                        game.id, game.scheduled
                    ),
                })?,
            };
            Ok(ScheduledGame {
                game_id: game.id,
                date,
                scheduled_time: game.scheduled,
                home_team_id: game.home.id,
                away_team_id: game.away.id,
                venue_name: game.venue.name,
                home_team_abbr: game.home.abbr.to_uppercase(),
                away_team_abbr: game.away.abbr.to_uppercase(),
                status: game.status,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn decode<T: DeserializeOwned>(entity: &str, body: &str) -> Result<T, FetchError> {
    let value: Value = serde_json::from_str(body).map_err(|e| FetchError::MalformedJson {
        entity: entity.to_string(),
        source: e,
    })?;
    serde_json::from_value(value).map_err(|e| FetchError::MissingField {
        entity: entity.to_string(),
        detail: e.to_string(),
    })
}

/// Calendar date of a `scheduled` timestamp. A full RFC 3339 value is read in
/// its own offset; anything else falls back to a leading `YYYY-MM-DD`.
fn scheduled_date(scheduled: &str) -> Option<NaiveDate> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(scheduled) {
        return Some(ts.date_naive());
    }
    scheduled
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
