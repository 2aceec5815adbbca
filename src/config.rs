//! Configuration loaded from `config.toml`.
//!
//! The file lives at `$CHORESTAR_CONFIG` or `~/.config/chorestar/config.toml`.
//! A missing file yields the defaults.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::UserProfile;
use crate::stars::DAILY_SALARY_TARGET;

/// How the daily payout target is determined.
///
/// `Fixed` is the default and ignores a customised weekly salary. `Weekly`
/// derives `floor(weekly_base_salary / 7)` from the profile instead.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DailyTarget {
    Fixed { amount: u64 },
    Weekly,
}

impl Default for DailyTarget {
    fn default() -> Self {
        DailyTarget::Fixed { amount: DAILY_SALARY_TARGET }
    }
}

impl DailyTarget {
    pub fn resolve(self, profile: &UserProfile) -> u64 {
        match self {
            DailyTarget::Fixed { amount } => amount,
            DailyTarget::Weekly => profile.weekly_base_salary / 7,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default)]
    pub daily_target: DailyTarget,
    /// User operated on when no token is given.
    #[serde(default = "default_user")]
    pub default_user: String,
    /// Overrides the data directory. `$CHORESTAR_DATA` takes precedence.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Attempts made when the profile changes underneath a write.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Opaque token to user id.
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

fn default_user() -> String {
    "kid_001".to_string()
}

fn default_max_retries() -> u32 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Config {
            daily_target: DailyTarget::default(),
            default_user: default_user(),
            data_dir: None,
            max_retries: default_max_retries(),
            tokens: HashMap::new(),
        }
    }
}

impl Config {
    /// Path of the config file.
    pub fn path() -> PathBuf {
        std::env::var("CHORESTAR_CONFIG").map(PathBuf::from).unwrap_or_else(|_| {
            let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
            p.push("chorestar");
            p.push("config.toml");
            p
        })
    }

    /// Loads the config file, falling back to defaults when it does not exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Self::path();
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let s = fs::read_to_string(&path).map_err(|source| ConfigError::Io { path: path.clone(), source })?;
        Self::parse(&s).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn parse(s: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(s)
    }

    /// Directory holding per-user data.
    ///
    /// Resolved from `$CHORESTAR_DATA`, then `data_dir`, then the local data dir.
    pub fn data_dir(&self) -> PathBuf {
        if let Ok(p) = std::env::var("CHORESTAR_DATA") {
            return PathBuf::from(p);
        }
        if let Some(p) = &self.data_dir {
            return p.clone();
        }
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("chorestar");
        p
    }
}
