// Configuration loading and parsing (client.toml, credentials.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::draft::order::{DraftSettings, DraftType};
use crate::{LeagueId, TeamId};

const APP_QUALIFIER: &str = "org";
const APP_AUTHOR: &str = "leaguedraft";
const APP_NAME: &str = "draftroom";

/// The shipped `client.toml`, written to `config/` when none exists yet.
pub const DEFAULT_CLIENT_TOML: &str = include_str!("../../../defaults/client.toml");

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

    #[error("failed to write default config to {path}: {source}")]
    Seed {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub api: ApiConfig,
    pub draft: DraftConfig,
    pub push: PushConfig,
    pub credentials: CredentialsConfig,
}

// ---------------------------------------------------------------------------
// client.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct ClientFile {
    league: LeagueConfig,
    api: ApiConfig,
    #[serde(default)]
    draft: DraftConfig,
    #[serde(default)]
    push: PushConfig,
}

/// Which league and franchise this client drafts for.
#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub league_id: LeagueId,
    pub team_id: TeamId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_degraded_after_failures")]
    pub degraded_after_failures: u32,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    #[serde(default = "default_draft_type")]
    pub draft_type: String,
    #[serde(default = "default_time_per_pick")]
    pub time_per_pick: u32,
}

impl Default for DraftConfig {
    fn default() -> Self {
        DraftConfig {
            poll_interval_ms: default_poll_interval_ms(),
            degraded_after_failures: default_degraded_after_failures(),
            rounds: default_rounds(),
            draft_type: default_draft_type(),
            time_per_pick: default_time_per_pick(),
        }
    }
}

impl DraftConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The settings sent with `initialize-draft`. Call after validation; an
    /// unknown draft type falls back to snake.
    pub fn settings(&self) -> DraftSettings {
        DraftSettings {
            rounds: self.rounds,
            draft_type: DraftType::from_str_type(&self.draft_type).unwrap_or_default(),
            time_per_pick: self.time_per_pick,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    3_000
}

fn default_degraded_after_failures() -> u32 {
    3
}

fn default_rounds() -> u32 {
    25
}

fn default_draft_type() -> String {
    "snake".into()
}

fn default_time_per_pick() -> u32 {
    90
}

/// Push channel settings. Without an explicit `enabled`, push is on exactly
/// when a url is configured.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub url: String,
    pub enabled: Option<bool>,
}

impl PushConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(!self.url.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// credentials.toml
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    pub api_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/client.toml` and (optionally)
/// `config/credentials.toml`, relative to `base_dir`. Does not seed defaults.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let client_path = config_dir.join("client.toml");
    let client_text = read_file(&client_path)?;
    let client: ClientFile = toml::from_str(&client_text).map_err(|e| ConfigError::ParseError {
        path: client_path.clone(),
        source: e,
    })?;

    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let text = read_file(&credentials_path)?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        league: client.league,
        api: client.api,
        draft: client.draft,
        push: client.push,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Write the shipped `client.toml` into `base_dir/config/` unless one is
/// already there. Returns the path when a file was written.
pub fn seed_client_config(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    let target = config_dir.join("client.toml");
    let seed_err = |source: std::io::Error| ConfigError::Seed {
        path: target.clone(),
        source,
    };

    std::fs::create_dir_all(&config_dir).map_err(seed_err)?;
    let mut file = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => return Err(seed_err(e)),
    };
    std::io::Write::write_all(&mut file, DEFAULT_CLIENT_TOML.as_bytes()).map_err(seed_err)?;
    Ok(Some(target))
}

/// The directory holding `config/` (and possibly `defaults/`): the working
/// directory when it has either, otherwise the per-user config directory.
pub fn config_base_dir() -> Result<PathBuf, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if cwd.join("defaults").exists() || cwd.join("config").exists() {
        return Ok(cwd);
    }
    ProjectDirs::from(APP_QUALIFIER, APP_AUTHOR, APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(ConfigError::FileNotFound { path: cwd })
}

/// Seed missing config files, then load and validate.
pub fn load_config() -> Result<Config, ConfigError> {
    let base = config_base_dir()?;
    if let Some(path) = seed_client_config(&base)? {
        tracing::info!("Wrote default config to {}", path.display());
    }
    load_config_from(&base)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.league_id == 0 {
        return Err(invalid("league.league_id", "must be greater than 0"));
    }
    if config.league.team_id == 0 {
        return Err(invalid("league.team_id", "must be greater than 0"));
    }

    if config.api.base_url.trim().is_empty() {
        return Err(invalid("api.base_url", "must not be empty"));
    }
    if config.api.request_timeout_ms == 0 {
        return Err(invalid("api.request_timeout_ms", "must be greater than 0"));
    }

    let draft = &config.draft;
    let counters: &[(&str, u64)] = &[
        ("draft.poll_interval_ms", draft.poll_interval_ms),
        ("draft.degraded_after_failures", draft.degraded_after_failures as u64),
        ("draft.rounds", draft.rounds as u64),
    ];
    for (name, val) in counters {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }
    if DraftType::from_str_type(&draft.draft_type).is_none() {
        return Err(invalid(
            "draft.draft_type",
            format!("expected \"snake\" or \"linear\", got {:?}", draft.draft_type),
        ));
    }

    if config.push.enabled == Some(true) && config.push.url.trim().is_empty() {
        return Err(invalid("push.url", "must not be empty while push is enabled"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
