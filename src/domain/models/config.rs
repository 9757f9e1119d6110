//! Engine configuration.
//!
//! Defaults match the fixed policy table the gate evaluator and
//! aggregator are calibrated against; hosts may override any of them
//! through the `ConfigLoader`.

use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quality gate thresholds.
    pub gates: GateConfig,

    /// Result aggregation and anomaly detection tuning.
    pub aggregator: AggregatorConfig,

    /// Agent dispatch limits.
    pub execution: ExecutionConfig,
}

/// Phase gate thresholds, all in 0..=100.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// RED: minimum structural validity of produced tests.
    pub red_test_structure_min: f64,

    /// RED coverage target when criticality is critical.
    pub coverage_critical: f64,

    /// RED coverage target when complexity is high.
    pub coverage_high: f64,

    /// RED coverage target when complexity is medium.
    pub coverage_medium: f64,

    /// RED coverage target otherwise.
    pub coverage_default: f64,

    /// GREEN: minimum implementation quality.
    pub green_quality_min: f64,

    /// REFACTOR: minimum code quality.
    pub refactor_quality_min: f64,

    /// REFACTOR: minimum performance score (100 - allowed degradation).
    pub refactor_performance_min: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            red_test_structure_min: 80.0,
            coverage_critical: 95.0,
            coverage_high: 85.0,
            coverage_medium: 75.0,
            coverage_default: 70.0,
            green_quality_min: 85.0,
            refactor_quality_min: 90.0,
            refactor_performance_min: 85.0,
        }
    }
}

/// Result aggregation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Number of recent cycles forming the rolling baseline.
    pub baseline_window: usize,

    /// Deviation beyond this many standard deviations is anomalous.
    pub anomaly_stddev: f64,

    /// Flat score drop treated as anomalous when history is too short
    /// for a standard deviation.
    pub anomaly_flat_drop: f64,

    /// Trend slope magnitude below which the trend reads as stable.
    pub trend_epsilon: f64,

    /// Occurrences of one issue category before it counts as systemic.
    pub systemic_min_occurrences: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            baseline_window: 10,
            anomaly_stddev: 2.0,
            anomaly_flat_drop: 20.0,
            trend_epsilon: 0.5,
            systemic_min_occurrences: 2,
        }
    }
}

/// Agent dispatch limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Concurrent agent invocations per parallel batch.
    pub max_concurrency: usize,

    /// Per-invocation timeout; expiry yields a zero-score result.
    pub agent_timeout_ms: u64,

    /// Nominal single-agent cost used for plan duration estimates.
    pub agent_base_cost_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            agent_timeout_ms: 120_000,
            agent_base_cost_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_defaults_match_policy_table() {
        let gates = GateConfig::default();
        assert_eq!(gates.red_test_structure_min, 80.0);
        assert_eq!(gates.coverage_critical, 95.0);
        assert_eq!(gates.coverage_high, 85.0);
        assert_eq!(gates.coverage_medium, 75.0);
        assert_eq!(gates.coverage_default, 70.0);
        assert_eq!(gates.green_quality_min, 85.0);
        assert_eq!(gates.refactor_quality_min, 90.0);
        assert_eq!(gates.refactor_performance_min, 85.0);
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.aggregator.baseline_window, 10);
        assert_eq!(back.execution.max_concurrency, 4);
    }
}
