//! ---
//! im_section: "01-core-functionality"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Shared primitives and utilities for the meter runtime."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMicroSeconds};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::logging::LogFormat;
use crate::time::MICROS_PER_MILLISECOND;

fn default_meter_name() -> String {
    "main-loop".to_owned()
}

fn default_quantum() -> Duration {
    Duration::from_micros(100)
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_core_log_level() -> String {
    "debug".to_owned()
}

fn default_file_sink() -> bool {
    true
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_namespace() -> String {
    "idlemeter".to_owned()
}

fn default_simulation_seed() -> u64 {
    0xA11CEu64
}

/// Primary configuration object for an idlemeter deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub meter: MeterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &'static str = "IDLEMETER_CONFIG";

    /// Load configuration from disk, respecting the `IDLEMETER_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.meter.validate()?;
        self.logging.validate()?;
        self.simulation.validate()?;
        self.metrics.validate()?;
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

/// Settings for a single idle meter instance.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterConfig {
    #[serde(default = "default_meter_name")]
    pub name: String,
    /// Length of one idle quantum. Expressed in whole microseconds on disk.
    #[serde(default = "default_quantum", rename = "quantum_us")]
    #[serde_as(as = "DurationMicroSeconds<u64>")]
    pub quantum: Duration,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            name: default_meter_name(),
            quantum: default_quantum(),
        }
    }
}

impl MeterConfig {
    /// Quantum length in microseconds, saturating at `u64::MAX`.
    pub fn quantum_micros(&self) -> u64 {
        u64::try_from(self.quantum.as_micros()).unwrap_or(u64::MAX)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow!("meter name must not be empty"));
        }
        let quantum = self.quantum_micros();
        let per_ms = u64::from(MICROS_PER_MILLISECOND);
        if quantum == 0 || quantum > per_ms {
            return Err(anyhow!(
                "meter '{}' quantum_us must be within 1..={}, got {}",
                self.name,
                per_ms,
                quantum
            ));
        }
        if per_ms % quantum != 0 {
            return Err(anyhow!(
                "meter '{}' quantum_us {} must divide one millisecond evenly",
                self.name,
                quantum
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
    #[serde(default)]
    pub file_prefix: Option<String>,
    /// Level for everything outside the meter core.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Level for `idlemeter_core`; `trace` logs every idle quantum.
    #[serde(default = "default_core_log_level")]
    pub core_level: String,
    /// Keep a rolling JSON log file under `directory`.
    #[serde(default = "default_file_sink")]
    pub file_sink: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
            level: default_log_level(),
            core_level: default_core_log_level(),
            file_sink: default_file_sink(),
        }
    }
}

impl LoggingConfig {
    /// Filter directive used when no environment override is present.
    pub fn directive(&self) -> String {
        format!("{},idlemeter_core={}", self.level, self.core_level)
    }

    pub fn validate(&self) -> Result<()> {
        EnvFilter::try_new(self.directive()).with_context(|| {
            format!(
                "logging level '{}' / core_level '{}' is not a valid filter",
                self.level, self.core_level
            )
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_namespace")]
    pub namespace: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            namespace: default_metrics_namespace(),
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<()> {
        let valid = !self.namespace.is_empty()
            && self
                .namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if self.enabled && !valid {
            return Err(anyhow!(
                "metrics namespace '{}' must be non-empty ASCII alphanumerics or '_'",
                self.namespace
            ));
        }
        Ok(())
    }
}

/// Upper bound for a simulated clock read. Keeps every simulated step well
/// under one second, so at most one second boundary passes per step.
pub const MAX_READ_COST_MICROS: u32 = MICROS_PER_MILLISECOND;

/// Knobs for the load simulation harness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_simulation_seed")]
    pub random_seed: u64,
    /// Standard deviation of Gaussian noise added to each busy slice.
    #[serde(default)]
    pub busy_jitter_us: f64,
    /// Counter value the simulated clock starts from.
    #[serde(default)]
    pub clock_origin_us: u32,
    /// Clock advance charged to every simulated `now()` read.
    #[serde(default)]
    pub read_cost_us: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            random_seed: default_simulation_seed(),
            busy_jitter_us: 0.0,
            clock_origin_us: 0,
            read_cost_us: 0,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.busy_jitter_us.is_finite() || self.busy_jitter_us < 0.0 {
            return Err(anyhow!(
                "simulation busy_jitter_us must be a finite, non-negative value, got {}",
                self.busy_jitter_us
            ));
        }
        if self.read_cost_us > MAX_READ_COST_MICROS {
            return Err(anyhow!(
                "simulation read_cost_us must not exceed {}us, got {}",
                MAX_READ_COST_MICROS,
                self.read_cost_us
            ));
        }
        Ok(())
    }
}
