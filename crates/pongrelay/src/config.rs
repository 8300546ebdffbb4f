//! Process configuration, loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const ENV_ADDR: &str = "PONGRELAY_ADDR";
pub const ENV_LEADERBOARD: &str = "PONGRELAY_LEADERBOARD";
pub const ENV_NAME_TIMEOUT: &str = "PONGRELAY_NAME_TIMEOUT_SECS";
pub const ENV_ROUND_TIMEOUT: &str = "PONGRELAY_ROUND_TIMEOUT_SECS";
pub const ENV_LOG: &str = "PONGRELAY_LOG";

/// Server-wide settings. Per-match rules live in `MatchConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// `host:port` to listen on.
    pub bind_addr: String,
    /// Where cumulative standings are kept between runs.
    pub leaderboard_path: PathBuf,
    /// How long a new connection has to declare its name.
    pub name_timeout: Duration,
    /// How long a playing client may go without sending an update before
    /// it is treated as disconnected.
    pub round_timeout: Duration,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7777".to_string(),
            leaderboard_path: PathBuf::from("leaderboard.json"),
            name_timeout: Duration::from_secs(5),
            round_timeout: Duration::from_secs(15),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from the process environment, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = match lookup(ENV_ADDR) {
            Some(addr) => validate_addr(addr)?,
            None => defaults.bind_addr,
        };
        let leaderboard_path = lookup(ENV_LEADERBOARD)
            .map(PathBuf::from)
            .unwrap_or(defaults.leaderboard_path);
        let name_timeout = match lookup(ENV_NAME_TIMEOUT) {
            Some(raw) => parse_secs(ENV_NAME_TIMEOUT, &raw)?,
            None => defaults.name_timeout,
        };
        let round_timeout = match lookup(ENV_ROUND_TIMEOUT) {
            Some(raw) => parse_secs(ENV_ROUND_TIMEOUT, &raw)?,
            None => defaults.round_timeout,
        };
        let log_level = lookup(ENV_LOG).unwrap_or(defaults.log_level);

        Ok(Self {
            bind_addr,
            leaderboard_path,
            name_timeout,
            round_timeout,
            log_level,
        })
    }
}

fn validate_addr(addr: String) -> Result<String, ConfigError> {
    let valid = addr
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
    if valid {
        Ok(addr)
    } else {
        Err(ConfigError::InvalidAddress(addr))
    }
}

fn parse_secs(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.to_string(),
    })?;
    if secs == 0 {
        return Err(ConfigError::ZeroTimeout(var));
    }
    Ok(Duration::from_secs(secs))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid bind address {0:?}, expected host:port")]
    InvalidAddress(String),

    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr, "127.0.0.1:7777");
        assert_eq!(config.leaderboard_path, PathBuf::from("leaderboard.json"));
        assert_eq!(config.name_timeout, Duration::from_secs(5));
        assert_eq!(config.round_timeout, Duration::from_secs(15));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (ENV_ADDR, "0.0.0.0:9000"),
            (ENV_LEADERBOARD, "/tmp/board.json"),
            (ENV_NAME_TIMEOUT, "2"),
            (ENV_ROUND_TIMEOUT, " 30 "),
            (ENV_LOG, "pongrelay=debug"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.leaderboard_path, PathBuf::from("/tmp/board.json"));
        assert_eq!(config.name_timeout, Duration::from_secs(2));
        assert_eq!(config.round_timeout, Duration::from_secs(30));
        assert_eq!(config.log_level, "pongrelay=debug");
    }

    #[test]
    fn test_hostname_address_accepted() {
        let config = load(&[(ENV_ADDR, "localhost:7777")]).unwrap();
        assert_eq!(config.bind_addr, "localhost:7777");
    }

    #[test]
    fn test_address_without_port_rejected() {
        let err = load(&[(ENV_ADDR, "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress(a) if a == "localhost"));

        let err = load(&[(ENV_ADDR, "host:99999")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress(_)));
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let err = load(&[(ENV_ROUND_TIMEOUT, "soon")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber { var: ENV_ROUND_TIMEOUT, .. }
        ));

        let err = load(&[(ENV_NAME_TIMEOUT, "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout(ENV_NAME_TIMEOUT)));
    }
}
