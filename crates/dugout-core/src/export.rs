// Flatten stored team statistics into a CSV summary (one row per team).

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::db::Database;
use crate::models::TeamWithStats;

/// Column names, in `TeamStatsRow` field order.
pub const HEADER: [&str; 10] = [
    "team", "abbr", "year", "avg", "obp", "slg", "ops", "era", "whip", "fpct",
];

/// One CSV row. Rate stats are `None` when the blob does not carry them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStatsRow {
    pub team: String,
    pub abbr: String,
    pub year: i32,
    pub avg: Option<f64>,
    pub obp: Option<f64>,
    pub slg: Option<f64>,
    pub ops: Option<f64>,
    pub era: Option<f64>,
    pub whip: Option<f64>,
    pub fpct: Option<f64>,
}

impl TeamStatsRow {
    /// Build a row from a team and its stats; `None` if no stats are stored.
    pub fn from_team(entry: &TeamWithStats) -> Option<Self> {
        let stats = entry.stats.as_ref()?;
        let hitting = &stats.hitting_overall;
        let pitching = &stats.pitching_overall;
        Some(Self {
            team: entry.team.display_name(),
            abbr: entry.team.abbr.clone(),
            year: stats.year,
            avg: number(hitting, "avg"),
            obp: number(hitting, "obp"),
            slg: number(hitting, "slg"),
            ops: number(hitting, "ops"),
            era: number(pitching, "era"),
            whip: number(pitching, "whip"),
            fpct: number(&stats.fielding_overall, "fpct"),
        })
    }
}

/// Write every team with stored statistics to `writer`, sorted by
/// abbreviation. The header is always written, so an empty export is still
/// a valid CSV. Returns the number of data rows written.
pub fn write_team_stats<W: Write>(db: &Database, writer: W) -> Result<usize> {
    let entries = db.all_team_stats()?;
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(HEADER)
        .context("failed to write CSV header")?;

    let mut written = 0;
    for row in entries.iter().filter_map(TeamStatsRow::from_team) {
        csv.serialize(&row)
            .with_context(|| format!("failed to write CSV row for {}", row.abbr))?;
        written += 1;
    }
    csv.flush().context("failed to flush CSV output")?;
    Ok(written)
}

/// Write the team statistics CSV to `path`, replacing any existing file.
pub fn export_team_stats(db: &Database, path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_team_stats(db, file)
}

/// Read a rate stat that may arrive as a JSON number or a numeric string
/// such as `".254"`.
fn number(blob: &Value, key: &str) -> Option<f64> {
    match blob.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
