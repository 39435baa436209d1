//! Server configuration.
//!
//! Resolution order, lowest to highest priority:
//! 1. [`ServerConfig::default()`]
//! 2. `TODO_*` environment variables ([`ServerConfig::apply_env_overrides`])
//! 3. command-line flags, applied by the binary
//!
//! Environment values that do not parse or fall outside their range are
//! ignored with a warning.

use std::path::PathBuf;

pub const ENV_HOST: &str = "TODO_HOST";
pub const ENV_PORT: &str = "TODO_PORT";
pub const ENV_DB_FILE: &str = "TODO_DBFILE";
pub const ENV_WEB_DIR: &str = "TODO_WEBDIR";
pub const ENV_LIST_LIMIT: &str = "TODO_LIST_LIMIT";
pub const ENV_LOG_JSON: &str = "TODO_LOG_JSON";

/// Accepted bounds for the task listing cap, from any source.
pub const MIN_LIST_LIMIT: usize = 1;
pub const MAX_LIST_LIMIT: usize = 10_000;

/// Configuration for the scheduler server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host to bind (default `"0.0.0.0"`).
    pub host: String,
    /// Port to bind (default `7540`; `0` picks a free port).
    pub port: u16,
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Directory of static front-end files.
    pub web_dir: PathBuf,
    /// Maximum tasks returned by `GET /api/tasks`.
    pub list_limit: usize,
    /// Emit JSON log lines.
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 7540,
            db_path: PathBuf::from("scheduler.db"),
            web_dir: PathBuf::from("./web"),
            list_limit: 50,
            log_json: false,
        }
    }
}

impl ServerConfig {
    /// Defaults with process environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from a key lookup. Takes a closure so tests do not
    /// have to mutate the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = read(ENV_HOST) {
            self.host = v;
        }
        if let Some(v) = read(ENV_PORT) {
            match parse_u16_range(&v, 1, u16::MAX) {
                Some(port) => self.port = port,
                None => tracing::warn!(key = ENV_PORT, value = %v, "invalid port, ignoring"),
            }
        }
        if let Some(v) = read(ENV_DB_FILE) {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = read(ENV_WEB_DIR) {
            self.web_dir = PathBuf::from(v);
        }
        if let Some(v) = read(ENV_LIST_LIMIT) {
            match parse_usize_range(&v, MIN_LIST_LIMIT, MAX_LIST_LIMIT) {
                Some(limit) => self.list_limit = limit,
                None => tracing::warn!(key = ENV_LIST_LIMIT, value = %v, "invalid list limit, ignoring"),
            }
        }
        if let Some(v) = read(ENV_LOG_JSON) {
            match parse_bool(&v) {
                Some(json) => self.log_json = json,
                None => tracing::warn!(key = ENV_LOG_JSON, value = %v, "invalid boolean, ignoring"),
            }
        }
    }

    /// `host:port` string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}
