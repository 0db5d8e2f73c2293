//! Defines all configuration structures for the Cadence engine.
//!
//! `CadenceConfig` is the user-facing settings file. It is deserialized with
//! `serde` from an optional TOML file layered with `CADENCE_*` environment
//! variables, then normalized so that missing or non-positive values fall back
//! to the classic 25/5 rhythm. `TimerConfig` is the validated form handed to
//! the state machine.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_WORK_MINUTES: i64 = 25;
pub const DEFAULT_BREAK_MINUTES: i64 = 5;
pub const DEFAULT_WORK_PHASES: i64 = 4;
pub const DEFAULT_TICK_INTERVAL_MS: i64 = 250;

/// Longest accepted phase, one day.
pub const MAX_PHASE_MINUTES: i64 = 24 * 60;
pub const MAX_WORK_PHASES: i64 = 100;
pub const MAX_TICK_INTERVAL_MS: i64 = 60_000;

/// Prefix for environment variable overrides, e.g. `CADENCE_WORK_MINUTES`.
pub const ENV_PREFIX: &str = "CADENCE";

/// The durations and phase count the state machine runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    pub work_duration: Duration,
    pub break_duration: Duration,
    /// Number of work phases. The sequence ends after the last one, without a
    /// trailing break.
    pub work_phases: usize,
}

impl Default for TimerConfig {
    fn default() -> Self {
        CadenceConfig::default().timer_config()
    }
}

/// The top-level user configuration.
///
/// Typically loaded from `<config dir>/cadence/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadenceConfig {
    /// Length of each work phase in minutes.
    #[serde(default = "default_work_minutes")]
    pub work_minutes: i64,

    /// Length of each break phase in minutes.
    #[serde(default = "default_break_minutes")]
    pub break_minutes: i64,

    /// How many work phases make up a full session.
    #[serde(default = "default_work_phases")]
    pub work_phases: i64,

    /// How often the engine samples the clock while running.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: i64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            work_phases: DEFAULT_WORK_PHASES,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl CadenceConfig {
    /// Replaces every non-positive or out-of-range value with its default.
    pub fn normalized(mut self) -> Self {
        if !(1..=MAX_PHASE_MINUTES).contains(&self.work_minutes) {
            self.work_minutes = DEFAULT_WORK_MINUTES;
        }
        if !(1..=MAX_PHASE_MINUTES).contains(&self.break_minutes) {
            self.break_minutes = DEFAULT_BREAK_MINUTES;
        }
        if !(1..=MAX_WORK_PHASES).contains(&self.work_phases) {
            self.work_phases = DEFAULT_WORK_PHASES;
        }
        if !(1..=MAX_TICK_INTERVAL_MS).contains(&self.tick_interval_ms) {
            self.tick_interval_ms = DEFAULT_TICK_INTERVAL_MS;
        }
        self
    }

    /// Applies command-line overrides. Non-positive overrides are ignored.
    pub fn apply_overrides(mut self, work_minutes: i64, break_minutes: i64) -> Self {
        if work_minutes > 0 {
            self.work_minutes = work_minutes;
        }
        if break_minutes > 0 {
            self.break_minutes = break_minutes;
        }
        self.normalized()
    }

    pub fn timer_config(&self) -> TimerConfig {
        let cfg = self.clone().normalized();
        TimerConfig {
            work_duration: minutes(cfg.work_minutes),
            break_duration: minutes(cfg.break_minutes),
            work_phases: cfg.work_phases as usize,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        let cfg = self.clone().normalized();
        Duration::from_millis(cfg.tick_interval_ms as u64)
    }
}

/// Returns `<config dir>/cadence/config.toml`.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join("cadence").join("config.toml"))
}

/// Loads the configuration from the default location.
pub fn load() -> Result<CadenceConfig, ConfigError> {
    load_from(&default_path()?)
}

/// Loads the configuration from `path`, layered with environment overrides.
///
/// A missing file is not an error; defaults are used instead.
pub fn load_from(path: &Path) -> Result<CadenceConfig, ConfigError> {
    let settings = ::config::Config::builder()
        .add_source(::config::File::from(path).required(false))
        .add_source(::config::Environment::with_prefix(ENV_PREFIX))
        .build()?;
    let cfg: CadenceConfig = settings.try_deserialize()?;
    Ok(cfg.normalized())
}

/// Loads the configuration and applies command-line overrides.
///
/// On failure the defaults (with overrides) are returned alongside the error
/// so the caller can log it and carry on.
pub fn load_with_overrides(
    work_minutes: i64,
    break_minutes: i64,
) -> (CadenceConfig, Option<ConfigError>) {
    match load() {
        Ok(cfg) => (cfg.apply_overrides(work_minutes, break_minutes), None),
        Err(e) => (
            CadenceConfig::default().apply_overrides(work_minutes, break_minutes),
            Some(e),
        ),
    }
}

/// Saves the configuration to the default location.
pub fn save(cfg: &CadenceConfig) -> Result<PathBuf, ConfigError> {
    let path = default_path()?;
    save_to(cfg, &path)?;
    Ok(path)
}

/// Writes the normalized configuration to `path`, creating parent directories.
pub fn save_to(cfg: &CadenceConfig, path: &Path) -> Result<(), ConfigError> {
    let encoded = toml::to_string_pretty(&cfg.clone().normalized())?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, encoded).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn minutes(value: i64) -> Duration {
    Duration::from_secs(u64::try_from(value).unwrap_or(0).saturating_mul(60))
}

// --- Default value functions for serde ---

fn default_work_minutes() -> i64 {
    DEFAULT_WORK_MINUTES
}

fn default_break_minutes() -> i64 {
    DEFAULT_BREAK_MINUTES
}

fn default_work_phases() -> i64 {
    DEFAULT_WORK_PHASES
}

fn default_tick_interval_ms() -> i64 {
    DEFAULT_TICK_INTERVAL_MS
}
