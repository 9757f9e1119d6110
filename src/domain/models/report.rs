//! Aggregate quality reporting types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::outcome::Issue;

/// Quality dimensions contributing to the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreDimension {
    /// Code and test quality.
    Quality,
    /// Security posture of the change.
    Security,
    /// Breadth and depth of test coverage.
    TestCoverage,
    /// Runtime and resource behavior.
    Performance,
    /// Regulatory adherence.
    Compliance,
}

impl ScoreDimension {
    /// All dimensions in weight order.
    pub const ALL: [Self; 5] = [
        Self::Quality,
        Self::Security,
        Self::TestCoverage,
        Self::Performance,
        Self::Compliance,
    ];

    /// Nominal weight of this dimension in the composite score.
    ///
    /// Weights over the dimensions actually present are renormalized to
    /// sum to 1.0 before the weighted mean is taken.
    pub const fn weight(self) -> f64 {
        match self {
            Self::Quality => 0.30,
            Self::Security => 0.25,
            Self::TestCoverage => 0.20,
            Self::Performance => 0.15,
            Self::Compliance => 0.10,
        }
    }
}

impl fmt::Display for ScoreDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quality => write!(f, "quality"),
            Self::Security => write!(f, "security"),
            Self::TestCoverage => write!(f, "test_coverage"),
            Self::Performance => write!(f, "performance"),
            Self::Compliance => write!(f, "compliance"),
        }
    }
}

/// Direction of the composite score over the recent history window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Scores trending upward against recent history.
    Improving,
    /// No meaningful movement either way.
    Stable,
    /// Scores trending downward against recent history.
    Degrading,
}

/// Composite view over all agent results of a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Weighted composite score in 0..=100.
    pub quality_score: f64,

    /// Mean score per dimension, over the results that reported it.
    pub dimension_scores: BTreeMap<ScoreDimension, f64>,

    /// Every issue reported by any agent, in agent order.
    pub issues: Vec<Issue>,

    /// Issue categories reported by two or more agents.
    pub systemic_categories: Vec<String>,

    /// Human-readable follow-ups, systemic findings first.
    pub recommendations: Vec<String>,

    /// Whether the composite score deviates abnormally from baseline.
    pub anomalous: bool,

    /// Rolling baseline the score was compared against, when history
    /// was available.
    pub baseline: Option<f64>,

    /// Signed deviation from the baseline (`quality_score - baseline`).
    pub deviation: Option<f64>,

    /// Trend over the recent history window.
    pub trend: Trend,
}
