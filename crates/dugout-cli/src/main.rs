// dugout entry point.
//
// Startup sequence:
// 1. Load .env, initialize tracing (stderr)
// 2. Parse arguments
// 3. Load config
// 4. For `populate`: build the API client (fails fast without a key), then
//    open the database and run one pass
// 5. For query commands: open the database and print results

mod render;

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use dugout_core::config;
use dugout_core::db::Database;
use dugout_core::export;
use dugout_core::populate;
use dugout_core::sportradar::{ScheduleWindow, SportradarClient};

#[derive(Parser, Debug)]
#[command(name = "dugout", version, about = "MLB teams, schedule and team stats in a local SQLite database")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch teams, a schedule window and team statistics from Sportradar.
    Populate {
        /// Daily schedule for this date (YYYY-MM-DD). Defaults to today.
        #[arg(long, conflicts_with = "season")]
        date: Option<NaiveDate>,
        /// Fetch the configured season's full schedule instead of one day.
        #[arg(long)]
        season: bool,
    },
    /// List all teams.
    Teams,
    /// Show stored statistics for a team abbreviation (e.g. MIL).
    Stats { abbr: String },
    /// List games on a date (YYYY-MM-DD). Defaults to today.
    Games {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Write a per-team stats summary CSV.
    ExportStats {
        #[arg(long, default_value = "team_stats.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing()?;

    let cli = Cli::parse();
    let config = config::load_config().context("failed to load configuration")?;

    match cli.command {
        Command::Populate { date, season } => {
            let client = SportradarClient::from_config(&config)
                .context("cannot populate without API credentials")?;
            let db = open_db(&config.db_path)?;

            let window = if season {
                ScheduleWindow::season(&config.season)
            } else {
                ScheduleWindow::Day(date.unwrap_or_else(today))
            };

            let summary = populate::run(&client, &db, &window).await;
            print!("{}", render::run_summary(&summary));
        }
        Command::Teams => {
            let db = open_db(&config.db_path)?;
            print!("{}", render::teams(&db.list_teams()?));
        }
        Command::Stats { abbr } => {
            let db = open_db(&config.db_path)?;
            print!("{}", render::team_stats(&abbr, db.team_stats(&abbr)?.as_ref()));
        }
        Command::Games { date } => {
            let db = open_db(&config.db_path)?;
            let (date, games) = match date {
                Some(date) => (date, db.games_on(date)?),
                None => (today(), db.games_today()?),
            };
            print!("{}", render::games(date, &games));
        }
        Command::ExportStats { out } => {
            let db = open_db(&config.db_path)?;
            let written = export::export_team_stats(&db, &out)?;
            println!("Saved {written} teams to {}", out.display());
        }
    }

    Ok(())
}

fn open_db(path: &str) -> anyhow::Result<Database> {
    let db = Database::open(path).context("failed to open database")?;
    info!("Using database: {path}");
    Ok(db)
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Initialize tracing to stderr so stdout carries only command output.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dugout_core=info,dugout_cli=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
