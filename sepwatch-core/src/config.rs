//! Configuration file management for sepwatch.
//!
//! Reads/writes `~/.sepwatch/config.yaml`: reference point, detector and
//! alert thresholds, history window, weather sampling limits, default
//! filter, server binding, and collaborator URLs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::alert::AlertThresholds;
use crate::conflict::{DEFAULT_HORIZONTAL_NM, DEFAULT_STEP_S, DEFAULT_VERTICAL_FT};
use crate::history::{DEFAULT_MAX_POINTS, DEFAULT_WINDOW_S};
use crate::stream::AlertFilter;
use crate::types::{EngineError, GeoPoint, Result};

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reference: GeoPoint,
    pub detector: DetectorConfig,
    pub history: HistoryConfig,
    pub alerts: AlertThresholds,
    pub weather: WeatherConfig,
    pub filter: AlertFilter,
    pub server: ServerConfig,
    pub projector_url: Option<String>,
    pub sampler_url: Option<String>,
    pub webhook: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub horizontal_nm: f64,
    pub vertical_ft: f64,
    pub default_step_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub window_s: f64,
    pub max_points: usize,
}

/// Pacing for the external intensity sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Delay between consecutive sampler calls within one tick.
    pub throttle_ms: u64,
    /// Per-call timeout.
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token required on the ingest endpoint, if set.
    pub auth_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reference: GeoPoint::new(35.4362, -82.5418),
            detector: DetectorConfig::default(),
            history: HistoryConfig::default(),
            alerts: AlertThresholds::default(),
            weather: WeatherConfig::default(),
            filter: AlertFilter::default(),
            server: ServerConfig::default(),
            projector_url: None,
            sampler_url: None,
            webhook: None,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            horizontal_nm: DEFAULT_HORIZONTAL_NM,
            vertical_ft: DEFAULT_VERTICAL_FT,
            default_step_s: DEFAULT_STEP_S,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            window_s: DEFAULT_WINDOW_S,
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        WeatherConfig {
            throttle_ms: 0,
            timeout_ms: 2000,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 8080,
            auth_token: None,
        }
    }
}

/// Get the config directory path (`~/.sepwatch/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".sepwatch")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.sepwatch/config.yaml`.
///
/// Returns default config if the file doesn't exist or can't be parsed.
pub fn load_config() -> Config {
    let path = config_file();
    if !path.exists() {
        return Config::default();
    }
    match load_config_from(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            Config::default()
        }
    }
}

/// Load config from an explicit path. Missing keys take their defaults.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}

/// Save config to `~/.sepwatch/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir).map_err(|e| EngineError::Config(e.to_string()))?;

    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    let text = serialize_config(config)?;
    std::fs::write(path, text).map_err(|e| EngineError::Config(e.to_string()))
}

fn parse_config(text: &str) -> Result<Config> {
    let blank = text
        .lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with('#'));
    if blank {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(text)?)
}

fn serialize_config(config: &Config) -> Result<String> {
    let body = serde_yaml::to_string(config)?;
    Ok(format!("# sepwatch configuration\n\n{body}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
