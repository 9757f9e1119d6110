//! Configuration loading with hierarchical merging.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::EngineConfig;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A gate threshold fell outside 0..=100.
    #[error("Invalid threshold {name}: {value}. Must be between 0 and 100")]
    InvalidThreshold { name: &'static str, value: f64 },

    /// The anomaly baseline window was zero.
    #[error("Invalid baseline_window: {0}. Must be at least 1")]
    InvalidBaselineWindow(usize),

    /// The anomaly standard-deviation multiplier was not positive.
    #[error("Invalid anomaly_stddev: {0}. Must be positive")]
    InvalidAnomalyStddev(f64),

    /// The concurrency limit fell outside 1..=64.
    #[error("Invalid max_concurrency: {0}. Must be between 1 and 64")]
    InvalidMaxConcurrency(usize),

    /// The per-agent timeout was zero.
    #[error("Invalid agent_timeout_ms: {0}. Must be positive")]
    InvalidAgentTimeout(u64),
}

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (the fixed policy table)
    /// 2. `crucible.yaml` in the working directory
    /// 3. Environment variables (`CRUCIBLE_*` prefix, highest priority)
    pub fn load() -> Result<EngineConfig> {
        let config: EngineConfig = Figment::new()
            .merge(Serialized::defaults(EngineConfig::default()))
            .merge(Yaml::file("crucible.yaml"))
            .merge(Env::prefixed("CRUCIBLE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<EngineConfig> {
        let config: EngineConfig = Figment::new()
            .merge(Serialized::defaults(EngineConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate a configuration.
    pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
        let thresholds = [
            ("red_test_structure_min", config.gates.red_test_structure_min),
            ("coverage_critical", config.gates.coverage_critical),
            ("coverage_high", config.gates.coverage_high),
            ("coverage_medium", config.gates.coverage_medium),
            ("coverage_default", config.gates.coverage_default),
            ("green_quality_min", config.gates.green_quality_min),
            ("refactor_quality_min", config.gates.refactor_quality_min),
            (
                "refactor_performance_min",
                config.gates.refactor_performance_min,
            ),
        ];
        for (name, value) in thresholds {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }

        if config.aggregator.baseline_window == 0 {
            return Err(ConfigError::InvalidBaselineWindow(
                config.aggregator.baseline_window,
            ));
        }
        if config.aggregator.anomaly_stddev <= 0.0 {
            return Err(ConfigError::InvalidAnomalyStddev(
                config.aggregator.anomaly_stddev,
            ));
        }
        if config.execution.max_concurrency == 0 || config.execution.max_concurrency > 64 {
            return Err(ConfigError::InvalidMaxConcurrency(
                config.execution.max_concurrency,
            ));
        }
        if config.execution.agent_timeout_ms == 0 {
            return Err(ConfigError::InvalidAgentTimeout(
                config.execution.agent_timeout_ms,
            ));
        }

        Ok(())
    }
}
