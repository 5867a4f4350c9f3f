// Domain rows shared by the Sportradar client, the ingest layer, and the
// query facade.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

/// A club as stored in the `teams` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    /// Sportradar team id.
    pub id: String,
    pub name: String,
    /// City or region, e.g. "Milwaukee".
    pub market: String,
    /// Short code such as "MIL". Stored uppercase.
    pub abbr: String,
}

impl Team {
    /// "Milwaukee Brewers"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.market, self.name)
    }
}

/// Canonical form of a user-supplied abbreviation: trimmed and uppercased,
/// matching how abbreviations are stored.
pub fn normalize_abbr(abbr: &str) -> String {
    abbr.trim().to_uppercase()
}

/// One row of the `schedule` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledGame {
    pub game_id: String,
    /// Nominal calendar date the game is filed under.
    pub date: NaiveDate,
    /// Scheduled first pitch exactly as sent by the API (RFC 3339).
    pub scheduled_time: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub venue_name: String,
    pub home_team_abbr: String,
    pub away_team_abbr: String,
    pub status: String,
}

/// Season totals for one team. The three `*_overall` blobs keep the nested
/// JSON shape the API returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStatistics {
    pub team_id: String,
    pub season_id: String,
    pub year: i32,
    pub season_type: String,
    pub hitting_overall: Value,
    pub pitching_overall: Value,
    pub fielding_overall: Value,
}

/// A team looked up by abbreviation, with its stats if any have been stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamWithStats {
    pub team: Team,
    pub stats: Option<TeamStatistics>,
}

/// Why a team entry from the team list was not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamSkipReason {
    MissingMarket,
    MissingAbbr,
}

impl std::fmt::Display for TeamSkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamSkipReason::MissingMarket => write!(f, "missing market"),
            TeamSkipReason::MissingAbbr => write!(f, "missing abbr"),
        }
    }
}

/// A team-list entry that is not a club (league or division node).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTeam {
    pub id: String,
    pub name: String,
    pub reason: TeamSkipReason,
}

/// Result of a team-list fetch: clubs to store plus the entries filtered out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamList {
    pub teams: Vec<Team>,
    pub skipped: Vec<SkippedTeam>,
}
