use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_NAME_CACHE: &str = "impostor_player_names.json";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TICK_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// `None` keeps the roster in memory only.
    pub name_cache_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub tick_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            name_cache_path: Some(PathBuf::from(DEFAULT_NAME_CACHE)),
            seed: None,
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("IMPOSTOR_BIND={0:?} is not a socket address")]
    InvalidBind(String),
    #[error("IMPOSTOR_SEED={0:?} is not an unsigned integer")]
    InvalidSeed(String),
    #[error("IMPOSTOR_TICK_MS={0:?} must be a positive number of milliseconds")]
    InvalidTick(String),
}

pub fn load_config() -> Result<Config, ConfigError> {
    config_from(|key| std::env::var(key).ok())
}

pub fn config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
    let mut config = Config::default();

    if let Some(v) = lookup("IMPOSTOR_BIND") {
        config.bind_addr = v.trim().parse().map_err(|_| ConfigError::InvalidBind(v))?;
    }

    if let Some(v) = lookup("IMPOSTOR_NAME_CACHE") {
        let v = v.trim();
        config.name_cache_path = if v.is_empty() {
            None
        } else {
            Some(PathBuf::from(v))
        };
    }

    if let Some(v) = lookup("IMPOSTOR_SEED") {
        let seed = v.trim().parse().map_err(|_| ConfigError::InvalidSeed(v))?;
        config.seed = Some(seed);
    }

    if let Some(v) = lookup("IMPOSTOR_TICK_MS") {
        match v.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => config.tick_interval = Duration::from_millis(ms),
            _ => return Err(ConfigError::InvalidTick(v)),
        }
    }

    Ok(config)
}
