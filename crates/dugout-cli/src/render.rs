// Plain-text rendering of query results and populate summaries.

use std::fmt::Write;

use chrono::NaiveDate;
use serde_json::Value;

use dugout_core::models::{normalize_abbr, ScheduledGame, Team, TeamWithStats};
use dugout_core::populate::RunSummary;

pub fn teams(teams: &[Team]) -> String {
    if teams.is_empty() {
        return "No teams found in the database.\n".to_string();
    }
    let mut out = String::from("All Teams:\n");
    for team in teams {
        let _ = writeln!(out, "{} ({})", team.display_name(), team.abbr);
    }
    out
}

pub fn team_stats(abbr: &str, found: Option<&TeamWithStats>) -> String {
    let Some(found) = found else {
        return format!("No team found with abbreviation {}.\n", normalize_abbr(abbr));
    };

    let mut out = format!(
        "Stats for {} ({}):\n",
        found.team.display_name(),
        found.team.abbr
    );
    match &found.stats {
        Some(stats) => {
            let _ = writeln!(out, "Season: {} {}", stats.year, stats.season_type);
            let _ = writeln!(out, "Hitting Overall: {}", compact(&stats.hitting_overall));
            let _ = writeln!(out, "Pitching Overall: {}", compact(&stats.pitching_overall));
            let _ = writeln!(out, "Fielding Overall: {}", compact(&stats.fielding_overall));
        }
        None => out.push_str("No statistics stored.\n"),
    }
    out
}

pub fn games(date: NaiveDate, games: &[ScheduledGame]) -> String {
    if games.is_empty() {
        return format!("No games scheduled for {date}.\n");
    }
    let mut out = format!("Games for {date}:\n");
    for game in games {
        let _ = writeln!(
            out,
            "Game ID: {}, Time: {}, {} vs {} at {} [{}]",
            game.game_id,
            game.scheduled_time,
            game.home_team_abbr,
            game.away_team_abbr,
            game.venue_name,
            game.status
        );
    }
    out
}

pub fn run_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Teams: {} stored, {} skipped",
        summary.teams_stored,
        summary.teams_skipped.len()
    );
    for skip in &summary.teams_skipped {
        let _ = writeln!(out, "  skipped team {}: {}", skip.id, skip.reason);
    }
    let _ = writeln!(
        out,
        "Games: {} stored, {} skipped",
        summary.games_stored,
        summary.games_skipped.len()
    );
    for skip in &summary.games_skipped {
        let _ = writeln!(out, "  skipped game {}: {}", skip.id, skip.reason);
    }
    let _ = writeln!(
        out,
        "Statistics: {} stored, {} skipped",
        summary.stats_stored,
        summary.stats_skipped.len()
    );
    for skip in &summary.stats_skipped {
        let _ = writeln!(out, "  skipped statistics {}: {}", skip.id, skip.reason);
    }
    if !summary.failures.is_empty() {
        let _ = writeln!(out, "Failures: {}", summary.failures.len());
        for failure in &summary.failures {
            let _ = writeln!(out, "  {}: {}", failure.unit, failure.message);
        }
    }
    out
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}
