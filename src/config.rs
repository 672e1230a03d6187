//! Crate-wide settings, read from environment variables.
//!
//! | Variable                       | Default                                           |
//! |--------------------------------|---------------------------------------------------|
//! | `OPENWEATHER_OUTPUTS_DIR`      | `<downloads>/OpenWeather`, else `./outputs`       |
//! | `NSRDB_API_BASE_URL`           | `https://developer.nrel.gov/api/nsrdb/v2/solar/`  |
//! | `NSRDB_MAPS_API_URL`           | `https://maps-api.nrel.gov/bigdata/v2/sample-code`|
//! | `OPENWEATHER_REQUEST_DELAY_MS` | `1000`                                            |
//! | `LOG_LEVEL`                    | `info`                                            |

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "https://developer.nrel.gov/api/nsrdb/v2/solar/";
pub const DEFAULT_MAPS_API_URL: &str = "https://maps-api.nrel.gov/bigdata/v2/sample-code";
const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;
const OUTPUTS_DIR_NAME: &str = "OpenWeather";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {var} has invalid value '{value}'")]
    InvalidNumber {
        var: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Unknown log level '{0}'")]
    InvalidLogLevel(String),
}

fn default_outputs_dir() -> PathBuf {
    dirs::download_dir()
        .map(|dir| dir.join(OUTPUTS_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("outputs"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory that job directories are created in.
    pub outputs_dir: PathBuf,
    pub api_base_url: String,
    pub maps_api_url: String,
    /// Pause between consecutive downloads, to stay under the NSRDB rate limit.
    pub request_delay_ms: u64,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            outputs_dir: default_outputs_dir(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            maps_api_url: DEFAULT_MAPS_API_URL.to_string(),
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds settings from any variable source; unset or blank variables keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());
        let mut settings = Settings::default();

        if let Some(dir) = get("OPENWEATHER_OUTPUTS_DIR") {
            settings.outputs_dir = PathBuf::from(dir);
        }
        if let Some(url) = get("NSRDB_API_BASE_URL") {
            settings.api_base_url = url;
        }
        if let Some(url) = get("NSRDB_MAPS_API_URL") {
            settings.maps_api_url = url;
        }
        if let Some(value) = get("OPENWEATHER_REQUEST_DELAY_MS") {
            settings.request_delay_ms =
                value
                    .trim()
                    .parse()
                    .map_err(|source| ConfigError::InvalidNumber {
                        var: "OPENWEATHER_REQUEST_DELAY_MS",
                        value,
                        source,
                    })?;
        }
        if let Some(level) = get("LOG_LEVEL") {
            LevelFilter::from_str(level.trim())
                .map_err(|_| ConfigError::InvalidLogLevel(level.clone()))?;
            settings.log_level = level.trim().to_lowercase();
        }
        Ok(settings)
    }

    pub fn log_level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}
