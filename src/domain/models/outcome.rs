//! Cycle execution outcomes: agent results, gate verdicts, phase and
//! cycle results, and process-lifetime metrics.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

use super::agent::{AgentKind, ComplianceFlags, Phase};
use super::plan::CoordinationPattern;
use super::report::{AggregateReport, ScoreDimension};

/// Severity of a reported issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Observation, no action required.
    Info,
    /// Should be addressed but does not block.
    Warning,
    /// Blocks the finding's dimension from passing.
    Error,
}

/// One finding reported by an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Classification bucket, e.g. "missing-assertion" or "timeout".
    pub category: String,

    /// How serious the finding is.
    pub severity: IssueSeverity,

    /// Human-readable description.
    pub message: String,
}

impl Issue {
    /// Create an issue.
    pub fn new(
        category: impl Into<String>,
        severity: IssueSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            severity,
            message: message.into(),
        }
    }
}

/// Output of one agent invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    /// Which agent produced this result.
    pub agent_kind: AgentKind,

    /// Whether the agent's own check passed.
    pub success: bool,

    /// Overall score in 0..=100.
    pub score: f64,

    /// Findings reported by the agent.
    pub issues: Vec<Issue>,

    /// Wall-clock duration of the invocation.
    pub duration_ms: u64,

    /// Per-dimension scores the agent reported, if any.
    pub dimension_scores: BTreeMap<ScoreDimension, f64>,

    /// Compliance areas the agent verified as satisfied.
    pub compliance_findings: Option<ComplianceFlags>,
}

impl AgentResult {
    /// A passing result with the given score.
    pub fn passed(agent_kind: AgentKind, score: f64, duration_ms: u64) -> Self {
        Self {
            agent_kind,
            success: true,
            score: score.clamp(0.0, 100.0),
            issues: Vec::new(),
            duration_ms,
            dimension_scores: BTreeMap::new(),
            compliance_findings: None,
        }
    }

    /// A failing result carrying a single issue.
    pub fn failed(agent_kind: AgentKind, score: f64, duration_ms: u64, issue: Issue) -> Self {
        Self {
            agent_kind,
            success: false,
            score: score.clamp(0.0, 100.0),
            issues: vec![issue],
            duration_ms,
            dimension_scores: BTreeMap::new(),
            compliance_findings: None,
        }
    }

    /// The zero-score result recorded when an invocation times out.
    pub fn timed_out(agent_kind: AgentKind, timeout_ms: u64) -> Self {
        Self::failed(
            agent_kind,
            0.0,
            timeout_ms,
            Issue::new(
                "timeout",
                IssueSeverity::Error,
                format!("agent {agent_kind} did not complete within {timeout_ms}ms"),
            ),
        )
    }

    /// Attach a per-dimension score.
    pub fn with_dimension(mut self, dimension: ScoreDimension, score: f64) -> Self {
        self.dimension_scores.insert(dimension, score.clamp(0.0, 100.0));
        self
    }

    /// Attach compliance findings.
    pub fn with_compliance_findings(mut self, flags: ComplianceFlags) -> Self {
        self.compliance_findings = Some(flags);
        self
    }
}

/// Verdict of one quality gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    /// Gate identifier, e.g. "coverage".
    pub name: String,

    /// Whether the measured value met the threshold.
    pub passed: bool,

    /// Measured value.
    pub actual: f64,

    /// Minimum value required to pass.
    pub threshold: f64,
}

impl GateResult {
    /// Evaluate a minimum-threshold gate.
    pub fn at_least(name: impl Into<String>, actual: f64, threshold: f64) -> Self {
        Self {
            name: name.into(),
            passed: actual >= threshold,
            actual,
            threshold,
        }
    }
}

/// Outcome of one executed phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    /// Which phase ran.
    pub phase: Phase,

    /// Whether every gate passed.
    pub success: bool,

    /// Topology the agents ran under.
    pub pattern: CoordinationPattern,

    /// Gate verdicts in evaluation order.
    pub gate_results: Vec<GateResult>,

    /// All agent results, including timed-out and errored agents.
    pub agent_results: Vec<AgentResult>,

    /// Wall-clock duration of the phase.
    pub duration_ms: u64,
}

/// Cycle progression state.
///
/// ```text
/// Idle → Red → Green → Refactor → Completed
///          ↘      ↘        ↘ Failed (terminal)
/// ```
///
/// Strictly linear; no backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleState {
    /// No cycle started yet.
    Idle,
    /// Writing failing tests.
    Red,
    /// Producing the minimal passing implementation.
    Green,
    /// Improving quality without behavior change.
    Refactor,
    /// All phases passed their gates. Terminal.
    Completed,
    /// A gate failed or the cycle aborted. Terminal.
    Failed,
}

impl CycleState {
    /// Whether a transition to `next` is legal.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Red)
                | (Self::Red, Self::Green)
                | (Self::Green, Self::Refactor)
                | (Self::Refactor, Self::Completed)
                | (Self::Red | Self::Green | Self::Refactor, Self::Failed)
        )
    }

    /// Transition to `next`, rejecting illegal moves.
    pub fn transition_to(&mut self, next: Self) -> DomainResult<()> {
        if !self.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.to_string(),
                to: next.to_string(),
                reason: "cycle states advance strictly forward".to_string(),
            });
        }
        *self = next;
        Ok(())
    }

    /// Whether the cycle can make no further progress.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Red => write!(f, "red"),
            Self::Green => write!(f, "green"),
            Self::Refactor => write!(f, "refactor"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Compliance validation outcome attached to a cycle.
///
/// Required areas score 33/33/34 when satisfied, so a full pass sums
/// to 100. Areas the context did not require contribute nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceSummary {
    /// Areas the context required.
    pub required: ComplianceFlags,

    /// Areas verified as satisfied by agent findings.
    pub satisfied: ComplianceFlags,

    /// Composite compliance score in 0..=100.
    pub score: u8,
}

impl ComplianceSummary {
    /// Score the satisfied areas against the required set.
    pub fn evaluate(required: ComplianceFlags, satisfied: ComplianceFlags) -> Self {
        let mut score = 0u8;
        if required.data_protection && satisfied.data_protection {
            score += 33;
        }
        if required.device_safety && satisfied.device_safety {
            score += 33;
        }
        if required.professional_ethics && satisfied.professional_ethics {
            score += 34;
        }
        Self {
            required,
            satisfied,
            score,
        }
    }
}

/// Top-level outcome of one full cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleResult {
    /// Globally unique cycle identifier.
    pub cycle_id: Uuid,

    /// Feature the cycle ran for.
    pub feature_name: String,

    /// Whether every executed phase passed its gates.
    pub success: bool,

    /// Phase outcomes in cycle order; only phases that actually ran.
    pub phase_results: Vec<PhaseResult>,

    /// Compliance validation outcome, when the context required it.
    pub compliance_summary: Option<ComplianceSummary>,

    /// Composite quality report over all agent results of the cycle.
    pub aggregate_report: Option<AggregateReport>,

    /// Wall-clock duration of the whole cycle.
    pub duration_ms: u64,

    /// Completion timestamp.
    pub completed_at: DateTime<Utc>,

    /// Description of an unexpected internal error, if one occurred.
    pub error: Option<String>,
}

impl CycleResult {
    /// Result of the named phase, if it executed.
    pub fn phase(&self, phase: Phase) -> Option<&PhaseResult> {
        self.phase_results.iter().find(|p| p.phase == phase)
    }

    /// All agent results across every executed phase.
    pub fn all_agent_results(&self) -> impl Iterator<Item = &AgentResult> {
        self.phase_results.iter().flat_map(|p| p.agent_results.iter())
    }

    /// Serialize the result to pretty-printed JSON for hosts that
    /// persist or ship cycle outcomes.
    pub fn to_json(&self) -> DomainResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Process-lifetime cycle counters, owned by the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleMetrics {
    /// Cycles that reached a terminal state.
    pub total_cycles: u64,

    /// Cycles that completed with all gates passing.
    pub successful_cycles: u64,

    /// Cycles that failed a gate or errored.
    pub failed_cycles: u64,

    /// Running mean duration over all terminal cycles.
    pub average_duration_ms: f64,
}

impl CycleMetrics {
    /// Fold one terminal cycle into the counters.
    pub fn record(&mut self, success: bool, duration_ms: u64) {
        let prior = self.total_cycles as f64;
        self.total_cycles += 1;
        if success {
            self.successful_cycles += 1;
        } else {
            self.failed_cycles += 1;
        }
        self.average_duration_ms =
            (self.average_duration_ms * prior + duration_ms as f64) / self.total_cycles as f64;
    }
}
