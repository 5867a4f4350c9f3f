// Sportradar MLB v8 client: team list, team season statistics, schedules.

pub mod payload;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Config, ConfigError, SeasonConfig};
use crate::models::{ScheduledGame, TeamList, TeamStatistics};

/// Major version of the Sportradar MLB API this client speaks.
const API_VERSION: &str = "v8";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A failed fetch, tagged with the entity that was being fetched
/// (e.g. `"teams"`, `"statistics for team T1"`).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS, TLS, timeout, or body read failure.
    #[error("request for {entity} failed: {source}")]
    Transport {
        entity: String,
        source: reqwest::Error,
    },

    #[error("request for {entity} returned HTTP {status}")]
    Status {
        entity: String,
        status: reqwest::StatusCode,
    },

    #[error("response for {entity} is not valid JSON: {source}")]
    MalformedJson {
        entity: String,
        source: serde_json::Error,
    },

    /// Valid JSON that lacks a field the decoder needs.
    #[error("response for {entity} is missing expected data: {detail}")]
    MissingField { entity: String, detail: String },
}

impl FetchError {
    /// The entity label the failing request was for.
    pub fn entity(&self) -> &str {
        match self {
            FetchError::Transport { entity, .. }
            | FetchError::Status { entity, .. }
            | FetchError::MalformedJson { entity, .. }
            | FetchError::MissingField { entity, .. } => entity,
        }
    }

    /// Short class name used in logs and run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "transport",
            FetchError::Status { .. } => "http-status",
            FetchError::MalformedJson { .. } => "malformed-json",
            FetchError::MissingField { .. } => "missing-field",
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule windows
// ---------------------------------------------------------------------------

/// Span of games requested from the schedule endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleWindow {
    /// One calendar day (daily schedule endpoint).
    Day(NaiveDate),
    /// A whole season (season schedule endpoint).
    Season { year: i32, season_type: String },
}

impl ScheduleWindow {
    /// The configured season as a window.
    pub fn season(season: &SeasonConfig) -> Self {
        ScheduleWindow::Season {
            year: season.year,
            season_type: season.season_type.clone(),
        }
    }

    fn path(&self) -> String {
        match self {
            ScheduleWindow::Day(date) => date.format("games/%Y/%m/%d/schedule.json").to_string(),
            ScheduleWindow::Season { year, season_type } => {
                format!("games/{year}/{season_type}/schedule.json")
            }
        }
    }
}

impl fmt::Display for ScheduleWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleWindow::Day(date) => write!(f, "{date}"),
            ScheduleWindow::Season { year, season_type } => write!(f, "{year} {season_type} season"),
        }
    }
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Where the populate run gets its data. Implemented by [`SportradarClient`];
/// tests substitute canned sources.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// League team list, with non-club entries split out as skips.
    async fn fetch_teams(&self) -> Result<TeamList, FetchError>;

    /// Season statistics for one team.
    async fn fetch_team_statistics(&self, team_id: &str) -> Result<TeamStatistics, FetchError>;

    /// Games in `window`, each with its nominal date resolved.
    async fn fetch_schedule(
        &self,
        window: &ScheduleWindow,
    ) -> Result<Vec<ScheduledGame>, FetchError>;
}

// ---------------------------------------------------------------------------
// SportradarClient
// ---------------------------------------------------------------------------

/// HTTP client for the Sportradar MLB API. The key is sent as the `api_key`
/// query parameter on every request.
pub struct SportradarClient {
    http: reqwest::Client,
    base_url: String,
    access_level: String,
    language: String,
    season: SeasonConfig,
    api_key: String,
}

impl SportradarClient {
    /// Build a client from the application config.
    ///
    /// Fails with `ConfigError::MissingCredential` when no API key is
    /// configured, before any request is made.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let api_key = config.api_key()?.to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()
            .map_err(|e| ConfigError::ValidationError {
                field: "api".into(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            access_level: config.api.access_level.clone(),
            language: config.api.language.clone(),
            season: config.season.clone(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/mlb/{}/{API_VERSION}/{}/{path}",
            self.base_url, self.access_level, self.language
        )
    }

    /// GET `path` and return the body text of a 2xx response.
    async fn get_body(&self, entity: &str, path: &str) -> Result<String, FetchError> {
        let url = self.endpoint(path);
        debug!(entity, path, "GET");

        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                entity: entity.to_string(),
                source: e.without_url(),
            })?;

        let status = response.status();
        info!("Fetching {entity}, status {status}");
        if !status.is_success() {
            return Err(FetchError::Status {
                entity: entity.to_string(),
                status,
            });
        }

        response.text().await.map_err(|e| FetchError::Transport {
            entity: entity.to_string(),
            source: e.without_url(),
        })
    }
}

#[async_trait]
impl StatsSource for SportradarClient {
    async fn fetch_teams(&self) -> Result<TeamList, FetchError> {
        let entity = "teams";
        let body = self.get_body(entity, "league/teams.json").await?;
        payload::parse_teams(entity, &body)
    }

    async fn fetch_team_statistics(&self, team_id: &str) -> Result<TeamStatistics, FetchError> {
        let entity = format!("statistics for team {team_id}");
        let path = format!(
            "seasons/{}/{}/teams/{team_id}/statistics.json",
            self.season.year, self.season.season_type
        );
        let body = self.get_body(&entity, &path).await?;
        payload::parse_statistics(&entity, team_id, &body)
    }

    async fn fetch_schedule(
        &self,
        window: &ScheduleWindow,
    ) -> Result<Vec<ScheduledGame>, FetchError> {
        let entity = format!("schedule for {window}");
        let body = self.get_body(&entity, &window.path()).await?;
        payload::parse_schedule(&entity, &body)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, CredentialsConfig};
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn make_test_config(base_url: &str, api_key: Option<&str>) -> Config {
        Config {
            db_path: ":memory:".to_string(),
            api: ApiConfig {
                base_url: base_url.to_string(),
                access_level: "trial".to_string(),
                language: "en".to_string(),
                timeout_secs: 10,
            },
            season: SeasonConfig {
                year: 2025,
                season_type: "REG".to_string(),
            },
            credentials: CredentialsConfig {
                sportradar_api_key: api_key.map(str::to_string),
            },
        }
    }

    /// Serve one HTTP response on a local port and record the request line.
    async fn serve_once(response: String) -> (String, Arc<Mutex<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let request_line = Arc::new(Mutex::new(String::new()));
        let seen = request_line.clone();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            *seen.lock().unwrap() = request.lines().next().unwrap_or_default().to_string();

            socket.write_all(response.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
        });

        (format!("http://{addr}"), request_line)
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[test]
    fn from_config_without_key_is_missing_credential() {
        let config = make_test_config("http://127.0.0.1:9", None);
        assert!(matches!(
            SportradarClient::from_config(&config),
            Err(ConfigError::MissingCredential)
        ));
    }

    #[test]
    fn from_config_with_empty_key_is_missing_credential() {
        let config = make_test_config("http://127.0.0.1:9", Some(""));
        assert!(matches!(
            SportradarClient::from_config(&config),
            Err(ConfigError::MissingCredential)
        ));
    }

    #[test]
    fn endpoints_follow_v8_layout() {
        let config = make_test_config("https://api.sportradar.com/", Some("k"));
        let client = SportradarClient::from_config(&config).unwrap();
        assert_eq!(
            client.endpoint("league/teams.json"),
            "https://api.sportradar.com/mlb/trial/v8/en/league/teams.json"
        );
    }

    #[test]
    fn schedule_window_paths() {
        let day = ScheduleWindow::Day(NaiveDate::from_ymd_opt(2025, 7, 8).unwrap());
        assert_eq!(day.path(), "games/2025/07/08/schedule.json");
        assert_eq!(day.to_string(), "2025-07-08");

        let season = ScheduleWindow::Season {
            year: 2025,
            season_type: "REG".into(),
        };
        assert_eq!(season.path(), "games/2025/REG/schedule.json");
        assert_eq!(season.to_string(), "2025 REG season");
    }

    #[tokio::test]
    async fn fetch_teams_sends_key_and_parses_body() {
        let body = r#"{"teams":[{"id":"T1","name":"Brewers","market":"Milwaukee","abbr":"MIL"},{"id":"L1","name":"American League"}]}"#;
        let (base, request_line) = serve_once(http_response("200 OK", body)).await;
        let client = SportradarClient::from_config(&make_test_config(&base, Some("secret"))).unwrap();

        let list = client.fetch_teams().await.unwrap();
        assert_eq!(list.teams.len(), 1);
        assert_eq!(list.skipped.len(), 1);

        let line = request_line.lock().unwrap().clone();
        assert!(
            line.starts_with("GET /mlb/trial/v8/en/league/teams.json?api_key=secret "),
            "unexpected request line: {line}"
        );
    }

    #[tokio::test]
    async fn fetch_team_statistics_uses_season_path() {
        let body = r#"{"season":{"id":"s","year":2025,"type":"REG"},"statistics":{"hitting":{"overall":{}},"pitching":{"overall":{}},"fielding":{"overall":{}}}}"#;
        let (base, request_line) = serve_once(http_response("200 OK", body)).await;
        let client = SportradarClient::from_config(&make_test_config(&base, Some("k"))).unwrap();

        let stats = client.fetch_team_statistics("T1").await.unwrap();
        assert_eq!(stats.team_id, "T1");

        let line = request_line.lock().unwrap().clone();
        assert!(line.contains("/seasons/2025/REG/teams/T1/statistics.json"), "{line}");
    }

    #[tokio::test]
    async fn non_success_status_is_classified() {
        let (base, _) = serve_once(http_response("403 Forbidden", r#"{"message":"no"}"#)).await;
        let client = SportradarClient::from_config(&make_test_config(&base, Some("k"))).unwrap();

        let err = client.fetch_team_statistics("T1").await.unwrap_err();
        match &err {
            FetchError::Status { entity, status } => {
                assert_eq!(entity, "statistics for team T1");
                assert_eq!(status.as_u16(), 403);
            }
            other => panic!("expected Status, got {other:?}"),
        }
        assert_eq!(err.kind(), "http-status");
    }

    #[tokio::test]
    async fn malformed_body_is_classified() {
        let (base, _) = serve_once(http_response("200 OK", "not json at all")).await;
        let client = SportradarClient::from_config(&make_test_config(&base, Some("k"))).unwrap();

        let window = ScheduleWindow::Day(NaiveDate::from_ymd_opt(2025, 7, 18).unwrap());
        let err = client.fetch_schedule(&window).await.unwrap_err();
        assert!(matches!(err, FetchError::MalformedJson { .. }));
        assert_eq!(err.entity(), "schedule for 2025-07-18");
    }

    #[tokio::test]
    async fn unresponsive_server_times_out_as_transport_error() {
        // Accept the connection and hold it open without ever answering.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let mut config = make_test_config(&format!("http://{addr}"), Some("k"));
        config.api.timeout_secs = 1;
        let client = SportradarClient::from_config(&config).unwrap();

        let started = std::time::Instant::now();
        let err = client.fetch_teams().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }), "{err:?}");
        assert_eq!(err.entity(), "teams");
        assert_eq!(err.kind(), "transport");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        // Bind then drop to get a port nobody is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            SportradarClient::from_config(&make_test_config(&format!("http://{addr}"), Some("k")))
                .unwrap();
        let err = client.fetch_teams().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
        assert_eq!(err.entity(), "teams");
        // The key travels in the URL; it must not leak into the message.
        assert!(!err.to_string().contains("api_key"));
    }
}
