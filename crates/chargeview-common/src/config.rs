//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Shared primitives and utilities for chargeview binaries."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::logging::LogFormat;

fn default_point_count() -> u32 {
    10
}

fn default_arrival_multiplier() -> f64 {
    1.0
}

fn default_charging_power_kw() -> f64 {
    11.0
}

fn default_simulation_seed() -> u64 {
    0x5EED_F00D
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

fn default_calendar_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default()
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Primary configuration object for chargeview binaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "CHARGEVIEW_CONFIG";

    /// Load configuration from disk, respecting the `CHARGEVIEW_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        Self::load_optional(candidates)?.ok_or_else(|| {
            anyhow!(
                "no configuration files found. inspected: {}",
                candidates
                    .iter()
                    .map(|p| p.as_ref().display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
    }

    /// Like [`AppConfig::load_with_source`] but `None` when no candidate exists.
    /// A path named by `CHARGEVIEW_CONFIG` must exist.
    pub fn load_optional<P: AsRef<Path>>(candidates: &[P]) -> Result<Option<LoadedAppConfig>> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(Some(LoadedAppConfig {
                    config,
                    source: path,
                }));
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_path(path)?;
                return Ok(Some(LoadedAppConfig {
                    config,
                    source: path.to_path_buf(),
                }));
            }
        }
        Ok(None)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.calendar.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Default form values and generator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_point_count")]
    pub point_count: u32,
    #[serde(default = "default_arrival_multiplier")]
    pub arrival_multiplier: f64,
    #[serde(default = "default_charging_power_kw")]
    pub charging_power_kw: f64,
    #[serde(default = "default_simulation_seed")]
    pub random_seed: u64,
    /// First simulated calendar day.
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    /// Replay this recorded dataset instead of simulating.
    #[serde(default)]
    pub recorded_dataset: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            point_count: default_point_count(),
            arrival_multiplier: default_arrival_multiplier(),
            charging_power_kw: default_charging_power_kw(),
            random_seed: default_simulation_seed(),
            start_date: default_start_date(),
            recorded_dataset: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.point_count == 0 {
            return Err(anyhow!("simulation.point_count must be greater than zero"));
        }
        if !(self.arrival_multiplier.is_finite() && self.arrival_multiplier > 0.0) {
            return Err(anyhow!(
                "simulation.arrival_multiplier must be positive, got {}",
                self.arrival_multiplier
            ));
        }
        if !(self.charging_power_kw.is_finite() && self.charging_power_kw > 0.0) {
            return Err(anyhow!(
                "simulation.charging_power_kw must be positive, got {}",
                self.charging_power_kw
            ));
        }
        Ok(())
    }
}

/// Date range rendered by the heatmap calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_start_date")]
    pub start: NaiveDate,
    #[serde(default = "default_calendar_end")]
    pub end: NaiveDate,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            start: default_start_date(),
            end: default_calendar_end(),
        }
    }
}

impl CalendarConfig {
    pub fn validate(&self) -> Result<()> {
        if self.end < self.start {
            return Err(anyhow!(
                "calendar.end {} precedes calendar.start {}",
                self.end,
                self.start
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Also write JSON logs to a daily rolling file under `directory`.
    #[serde(default)]
    pub file_output: bool,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_output: false,
            file_prefix: None,
        }
    }
}
