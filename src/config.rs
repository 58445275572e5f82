use std::env;

use thiserror::Error;

use crate::domain::solver_factory::SolverType;

const DEFAULT_PORT: u16 = 9000;
const DEFAULT_JSON_LIMIT: usize = 2 * 1024 * 1024; // 2 MB
const DEFAULT_CACHE_SIZE: usize = 128;
const DEFAULT_MAX_SAMPLE_CELLS: usize = 10_000_000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Unknown solver: {0}")]
    UnknownSolver(String),

    #[error("PROTECT is enabled but API_KEY is not set")]
    MissingApiKey,
}

/// Server settings, read from the environment (and `.env` via dotenv).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub json_limit: usize,
    pub solver: SolverType,
    pub protect: bool,
    pub api_key: Option<String>,
    /// Number of cached responses; 0 disables caching
    pub cache_size: usize,
    /// Upper bound on periods x samples for one stochastic request
    pub max_sample_cells: usize,
    pub sentry_dsn: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: DEFAULT_PORT,
            json_limit: DEFAULT_JSON_LIMIT,
            solver: SolverType::default(),
            protect: false,
            api_key: None,
            cache_size: DEFAULT_CACHE_SIZE,
            max_sample_cells: DEFAULT_MAX_SAMPLE_CELLS,
            sentry_dsn: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let port = parse_or(&lookup, "PORT", defaults.port)?;
        let json_limit = parse_or(&lookup, "JSON_PAYLOAD_LIMIT", defaults.json_limit)?;
        let cache_size = parse_or(&lookup, "CACHE_SIZE", defaults.cache_size)?;
        let protect = parse_or(&lookup, "PROTECT", defaults.protect)?;
        let max_sample_cells =
            parse_or(&lookup, "MAX_SAMPLE_CELLS", defaults.max_sample_cells)?;

        let solver = match lookup("SOLVER") {
            Some(name) => SolverType::from_str(&name).ok_or(ConfigError::UnknownSolver(name))?,
            None => defaults.solver,
        };

        let api_key = lookup("API_KEY").filter(|k| !k.is_empty());
        if protect && api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(AppConfig {
            port,
            json_limit,
            solver,
            protect,
            api_key,
            cache_size,
            max_sample_cells,
            sentry_dsn: lookup("SENTRY_DSN").filter(|d| !d.is_empty()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}
