use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn app_dir() -> PathBuf {
    home_dir().join(".infinitive")
}

pub fn config_path() -> PathBuf {
    app_dir().join("config.json")
}

/// Tick timings for the typing animation, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingTimings {
    pub grow_tick_ms: u64,
    pub shrink_tick_ms: u64,
    pub pause_ms: u64,
}

impl Default for TypingTimings {
    fn default() -> Self {
        Self {
            grow_tick_ms: 150,
            shrink_tick_ms: 50,
            pause_ms: 1500,
        }
    }
}

impl TypingTimings {
    pub fn grow_tick(&self) -> Duration {
        Duration::from_millis(self.grow_tick_ms)
    }

    pub fn shrink_tick(&self) -> Duration {
        Duration::from_millis(self.shrink_tick_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub save_debounce_ms: u64,
    pub typing: TypingTimings,
    pub headline_phrases: Vec<String>,
    pub data_dir: PathBuf,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_debounce_ms: 500,
            typing: TypingTimings::default(),
            headline_phrases: ["web apps.", "eCommerce stores.", "games.", "portfolios."]
                .into_iter()
                .map(str::to_string)
                .collect(),
            data_dir: app_dir().join("data"),
            log_filter: "infinitive=info".to_string(),
        }
    }
}

impl Config {
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    /// Loads the config at `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_path())
    }
}
