// Configuration loading and parsing (dugout.toml, credentials.toml, environment).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Environment variable that overrides `sportradar_api_key` from credentials.toml.
pub const API_KEY_ENV: &str = "SPORTRADAR_API_KEY";

const SEASON_TYPES: &[&str] = &["PRE", "REG", "PST"];

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },

    #[error(
        "Sportradar API key not found; set SPORTRADAR_API_KEY (or add it to .env) \
         or add sportradar_api_key to config/credentials.toml"
    )]
    MissingCredential,
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

/// Process-wide settings. Built once at startup and only read afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub api: ApiConfig,
    pub season: SeasonConfig,
    pub credentials: CredentialsConfig,
}

impl Config {
    /// The configured API key, or `MissingCredential` when none is set.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        match self.credentials.sportradar_api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::MissingCredential),
        }
    }
}

// ---------------------------------------------------------------------------
// dugout.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire dugout.toml file.
#[derive(Debug, Clone, Deserialize)]
struct DugoutFile {
    database: DatabaseSection,
    api: ApiConfig,
    season: SeasonConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub access_level: String,
    pub language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonConfig {
    pub year: i32,
    pub season_type: String,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub sportradar_api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/dugout.toml` and (optionally)
/// `config/credentials.toml`, relative to `base_dir`. `env_api_key` is the
/// value of [`API_KEY_ENV`] as seen by the caller and takes precedence over
/// the credentials file.
///
/// Does not copy defaults; prefer `load_config()`.
pub fn load_config_from(
    base_dir: &Path,
    env_api_key: Option<String>,
) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- dugout.toml (required) ---
    let dugout_path = config_dir.join("dugout.toml");
    let dugout_text = read_file(&dugout_path)?;
    let dugout_file: DugoutFile =
        toml::from_str(&dugout_text).map_err(|e| ConfigError::ParseError {
            path: dugout_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let file_credentials: CredentialsConfig = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let credentials = CredentialsConfig {
        sportradar_api_key: resolve_api_key(file_credentials.sportradar_api_key, env_api_key),
    };

    let config = Config {
        db_path: dugout_file.database.path,
        api: dugout_file.api,
        season: dugout_file.season,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Pick the effective API key: a non-empty environment value wins over a
/// non-empty file value. Empty strings count as unset.
pub fn resolve_api_key(file_value: Option<String>, env_value: Option<String>) -> Option<String> {
    let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    non_empty(env_value).or_else(|| non_empty(file_value))
}

/// Seed `config/` from `defaults/`: every default file that has no
/// counterpart in `config/` yet is copied over. Existing files are left
/// untouched and `*.example` templates are never copied. Returns the paths
/// that were created, in file-name order.
///
/// A missing `defaults/` is fine as long as `config/` exists (an installed
/// copy may ship only its own config).
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(vec![]);
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither defaults/ nor config/ found in {}; run dugout from the \
                 directory that holds them",
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(copy_error(format!("cannot create {}", config_dir.display())))?;

    let mut copied = Vec::new();
    for source in default_files(&defaults_dir)? {
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);
        if copy_if_absent(&source, &target)? {
            info!("Created {} from defaults", target.display());
            copied.push(target);
        }
    }

    Ok(copied)
}

/// Regular files in `defaults_dir`, minus `*.example` templates, sorted.
fn default_files(defaults_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let listing_error = || copy_error(format!("cannot list {}", defaults_dir.display()));

    let mut files = Vec::new();
    for entry in std::fs::read_dir(defaults_dir).map_err(listing_error())? {
        let path = entry.map_err(listing_error())?.path();
        let is_template = path.extension().is_some_and(|ext| ext == "example");
        if path.is_file() && !is_template {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Copy `source` to `target` unless `target` already exists. `create_new`
/// makes the existence check and the create a single step.
fn copy_if_absent(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_error(format!("cannot create {}", target.display()))(e)),
    };

    let content =
        std::fs::read(source).map_err(copy_error(format!("cannot read {}", source.display())))?;
    std::io::Write::write_all(&mut dest, &content)
        .map_err(copy_error(format!("cannot write {}", target.display())))?;
    Ok(true)
}

fn copy_error(context: String) -> impl Fn(std::io::Error) -> ConfigError {
    move |e| ConfigError::DefaultsCopyError {
        message: format!("{context}: {e}"),
    }
}

/// Convenience wrapper: loads config relative to the current working
/// directory, reading the API key override from the process environment.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd, std::env::var(API_KEY_ENV).ok())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "api.base_url".into(),
            message: "must not be empty".into(),
        });
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "api.timeout_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    if !(1876..=2100).contains(&config.season.year) {
        return Err(ConfigError::ValidationError {
            field: "season.year".into(),
            message: format!("must be between 1876 and 2100, got {}", config.season.year),
        });
    }

    if !SEASON_TYPES.contains(&config.season.season_type.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "season.season_type".into(),
            message: format!(
                "must be one of {}, got {:?}",
                SEASON_TYPES.join(", "),
                config.season.season_type
            ),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
