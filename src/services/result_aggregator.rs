//! Result aggregation: composite scoring, systemic-issue detection,
//! anomaly flagging against a rolling baseline, and trend
//! classification.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::domain::models::{
    AggregateReport, AggregatorConfig, AgentResult, Issue, IssueSeverity, ScoreDimension, Trend,
};
use crate::domain::ports::HistoryProvider;

/// Merges agent outputs into a composite report.
pub struct ResultAggregator {
    config: AggregatorConfig,
    history: Option<Arc<dyn HistoryProvider>>,
}

impl ResultAggregator {
    /// Create an aggregator with default tuning and no history.
    pub fn new() -> Self {
        Self {
            config: AggregatorConfig::default(),
            history: None,
        }
    }

    /// Create an aggregator with explicit tuning.
    pub fn with_config(config: AggregatorConfig) -> Self {
        Self {
            config,
            history: None,
        }
    }

    /// Attach a historical store for baseline and trend computation.
    pub fn with_history(mut self, history: Arc<dyn HistoryProvider>) -> Self {
        self.history = Some(history);
        self
    }

    /// Merge agent results into a composite report.
    ///
    /// Total: empty input yields a zero-score report with a single
    /// explanatory issue rather than an error.
    pub fn aggregate(&self, results: &[AgentResult]) -> AggregateReport {
        if results.is_empty() {
            warn!("Aggregating empty agent result set");
            return AggregateReport {
                quality_score: 0.0,
                dimension_scores: BTreeMap::new(),
                issues: vec![Issue::new(
                    "no-results",
                    IssueSeverity::Warning,
                    "no agent results available",
                )],
                systemic_categories: Vec::new(),
                recommendations: vec!["verify that agents were selected and invoked".to_string()],
                anomalous: false,
                baseline: None,
                deviation: None,
                trend: Trend::Stable,
            };
        }

        let dimension_scores = dimension_means(results);
        let quality_score = weighted_composite(&dimension_scores, results);

        let issues: Vec<Issue> = results.iter().flat_map(|r| r.issues.clone()).collect();
        let systemic_categories = self.systemic_categories(results);

        let mut recommendations = Vec::new();
        for category in &systemic_categories {
            recommendations.push(format!(
                "address recurring '{category}' issues reported by multiple agents"
            ));
        }
        for (dimension, mean) in &dimension_scores {
            if *mean < 70.0 {
                recommendations.push(format!("improve {dimension} (currently {mean:.0}/100)"));
            }
        }
        for result in results.iter().filter(|r| !r.success) {
            recommendations.push(format!("re-run or investigate {} failure", result.agent_kind));
        }

        let (anomalous, baseline, deviation) = self.detect_anomaly(quality_score);
        let trend = self.classify_trend();

        AggregateReport {
            quality_score,
            dimension_scores,
            issues,
            systemic_categories,
            recommendations,
            anomalous,
            baseline,
            deviation,
            trend,
        }
    }

    /// Issue categories reported by at least `systemic_min_occurrences`
    /// distinct agents in this cycle.
    fn systemic_categories(&self, results: &[AgentResult]) -> Vec<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for result in results {
            let mut seen = std::collections::BTreeSet::new();
            for issue in &result.issues {
                // Count each category once per agent.
                if seen.insert(issue.category.as_str()) {
                    *counts.entry(issue.category.as_str()).or_default() += 1;
                }
            }
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count >= self.config.systemic_min_occurrences)
            .map(|(category, _)| category.to_string())
            .collect()
    }

    /// Compare the composite score against the rolling baseline.
    ///
    /// With two or more historical scores the deviation is measured in
    /// standard deviations; with fewer, a flat drop beyond the
    /// configured size is anomalous.
    fn detect_anomaly(&self, quality_score: f64) -> (bool, Option<f64>, Option<f64>) {
        let Some(history) = &self.history else {
            return (false, None, None);
        };
        let scores = history.recent_scores(self.config.baseline_window);
        if scores.is_empty() {
            return (false, None, None);
        }

        let baseline = scores.iter().sum::<f64>() / scores.len() as f64;
        let deviation = quality_score - baseline;

        let anomalous = if scores.len() < 2 {
            -deviation > self.config.anomaly_flat_drop
        } else {
            let variance = scores
                .iter()
                .map(|s| (s - baseline).powi(2))
                .sum::<f64>()
                / scores.len() as f64;
            let stddev = variance.sqrt();
            if stddev < f64::EPSILON {
                // Flat history; fall back to the flat-drop rule.
                -deviation > self.config.anomaly_flat_drop
            } else {
                deviation.abs() > self.config.anomaly_stddev * stddev
            }
        };

        (anomalous, Some(baseline), Some(deviation))
    }

    /// Least-squares slope over the recent score window.
    fn classify_trend(&self) -> Trend {
        let Some(history) = &self.history else {
            return Trend::Stable;
        };
        let scores = history.recent_scores(self.config.baseline_window);
        if scores.len() < 2 {
            return Trend::Stable;
        }

        let n = scores.len() as f64;
        let mean_x = (n - 1.0) / 2.0;
        let mean_y = scores.iter().sum::<f64>() / n;
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (i, y) in scores.iter().enumerate() {
            let dx = i as f64 - mean_x;
            numerator += dx * (y - mean_y);
            denominator += dx * dx;
        }
        let slope = numerator / denominator;

        if slope > self.config.trend_epsilon {
            Trend::Improving
        } else if slope < -self.config.trend_epsilon {
            Trend::Degrading
        } else {
            Trend::Stable
        }
    }
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean score per dimension over the results that reported it.
fn dimension_means(results: &[AgentResult]) -> BTreeMap<ScoreDimension, f64> {
    let mut sums: BTreeMap<ScoreDimension, (f64, usize)> = BTreeMap::new();
    for result in results {
        for (dimension, score) in &result.dimension_scores {
            let entry = sums.entry(*dimension).or_insert((0.0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(dimension, (sum, count))| (dimension, sum / count as f64))
        .collect()
}

/// Weighted mean over the dimensions present, weights renormalized to
/// sum to 1. With no dimensions reported at all, the mean overall
/// agent score stands in.
fn weighted_composite(
    dimension_scores: &BTreeMap<ScoreDimension, f64>,
    results: &[AgentResult],
) -> f64 {
    if dimension_scores.is_empty() {
        return results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64;
    }

    let total_weight: f64 = dimension_scores.keys().map(|d| d.weight()).sum();
    dimension_scores
        .iter()
        .map(|(dimension, score)| score * dimension.weight() / total_weight)
        .sum()
}
