//! Fleet Configuration Module
//!
//! Every tunable that would otherwise be a scattered magic number lives in
//! `FleetConfig`, loaded from a TOML file with built-in defaults.
//!
//! ## Loading Order
//!
//! 1. `AGRIFLEET_CONFIG` environment variable (path to TOML file)
//! 2. `fleet_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The config is passed explicitly to the components that need it — there
//! is no process-wide singleton.

pub mod defaults;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration loading / validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Root configuration for a fleet deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Fuel / usage accounting tunables.
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Store concurrency tunables.
    #[serde(default)]
    pub store: StoreConfig,

    /// Predictive scheduler tunables.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Fuel burned per engine hour, in percentage points.
    pub burn_rate_pct_per_hour: f64,

    /// Daily usage estimate (hours/day) for assets that have none set.
    pub default_daily_average: f64,

    /// Service interval (hours) for new assets that specify none.
    pub default_service_interval: f64,

    /// Machine category for new assets that specify none.
    pub default_kind: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            burn_rate_pct_per_hour: defaults::BURN_RATE_PCT_PER_HOUR,
            default_daily_average: defaults::DEFAULT_DAILY_AVERAGE_HOURS,
            default_service_interval: defaults::DEFAULT_SERVICE_INTERVAL_HOURS,
            default_kind: defaults::DEFAULT_ASSET_KIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum compare-and-swap attempts per `apply`.
    pub apply_max_attempts: u32,

    /// Base backoff between attempts (ms). Doubles per attempt.
    pub apply_backoff_ms: u64,

    /// Cap on a single backoff sleep (ms).
    pub apply_backoff_cap_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            apply_max_attempts: defaults::APPLY_MAX_ATTEMPTS,
            apply_backoff_ms: defaults::APPLY_BACKOFF_BASE_MS,
            apply_backoff_cap_ms: defaults::APPLY_BACKOFF_CAP_MS,
        }
    }
}

impl StoreConfig {
    /// Backoff duration for the given 1-based attempt number, doubling per
    /// attempt and capped.
    pub fn backoff_for_attempt(&self, attempt: u32) -> std::time::Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let ms = self
            .apply_backoff_ms
            .saturating_mul(1u64 << exp)
            .min(self.apply_backoff_cap_ms);
        std::time::Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// A forecast closer than this many days is flagged `Urgent`.
    pub urgent_window_days: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            urgent_window_days: defaults::URGENT_WINDOW_DAYS,
        }
    }
}

impl FleetConfig {
    /// Load configuration using the standard search order:
    /// 1. `AGRIFLEET_CONFIG` environment variable
    /// 2. `./fleet_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("AGRIFLEET_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded fleet config from AGRIFLEET_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from AGRIFLEET_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "AGRIFLEET_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("fleet_config.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded fleet config from ./fleet_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./fleet_config.toml, using defaults");
                }
            }
        }

        Self::default()
    }

    /// Load and validate a config file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: FleetConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the engine's invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telemetry.burn_rate_pct_per_hour <= 0.0 {
            return Err(ConfigError::Invalid(
                "telemetry.burn_rate_pct_per_hour must be positive".into(),
            ));
        }
        if self.telemetry.default_daily_average <= 0.0 {
            return Err(ConfigError::Invalid(
                "telemetry.default_daily_average must be positive".into(),
            ));
        }
        if self.telemetry.default_service_interval <= 0.0 {
            return Err(ConfigError::Invalid(
                "telemetry.default_service_interval must be positive".into(),
            ));
        }
        if self.store.apply_max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "store.apply_max_attempts must be at least 1".into(),
            ));
        }
        if self.scheduler.urgent_window_days < 0 {
            return Err(ConfigError::Invalid(
                "scheduler.urgent_window_days must be non-negative".into(),
            ));
        }
        Ok(())
    }
}
