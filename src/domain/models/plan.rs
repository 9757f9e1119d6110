//! Coordination patterns and execution plans.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::agent::AgentKind;

/// Concurrency topology used to run a phase's agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinationPattern {
    /// One agent at a time, in selection order.
    Sequential,
    /// All agents dispatched concurrently; fan-out/fan-in.
    Parallel,
    /// Priority tiers; each tier is a parallel batch, tiers run in order.
    Hierarchical,
    /// Sequential with an audit event emitted per agent boundary.
    EventDriven,
}

impl CoordinationPattern {
    /// Whether agents run strictly one at a time under this pattern.
    pub const fn is_serialized(self) -> bool {
        matches!(self, Self::Sequential | Self::EventDriven)
    }
}

impl fmt::Display for CoordinationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel => write!(f, "parallel"),
            Self::Hierarchical => write!(f, "hierarchical"),
            Self::EventDriven => write!(f, "event_driven"),
        }
    }
}

/// Concrete schedule for one phase: which agents run, in what grouping.
///
/// Non-hierarchical patterns always carry a single tier; hierarchical
/// plans carry one tier per populated priority level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Topology the orchestrator will apply.
    pub pattern: CoordinationPattern,

    /// Agent batches in dispatch order.
    pub tiers: Vec<Vec<AgentKind>>,

    /// Rough wall-clock estimate for the whole plan.
    pub estimated_duration_ms: u64,

    /// Mean tier width; 1.0 means fully serialized.
    pub parallelization_factor: f64,
}

impl ExecutionPlan {
    /// Total number of agents across all tiers.
    pub fn agent_count(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }

    /// All agents in dispatch order, tiers flattened.
    pub fn agents(&self) -> impl Iterator<Item = AgentKind> + '_ {
        self.tiers.iter().flatten().copied()
    }

    /// Whether the plan has no agents to run.
    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_serialization() {
        assert_eq!(CoordinationPattern::EventDriven.to_string(), "event_driven");
        assert!(CoordinationPattern::Sequential.is_serialized());
        assert!(CoordinationPattern::EventDriven.is_serialized());
        assert!(!CoordinationPattern::Parallel.is_serialized());
    }

    #[test]
    fn test_plan_flattening() {
        let plan = ExecutionPlan {
            pattern: CoordinationPattern::Hierarchical,
            tiers: vec![
                vec![AgentKind::TestWriter, AgentKind::Implementer],
                vec![AgentKind::SecurityAuditor],
            ],
            estimated_duration_ms: 60_000,
            parallelization_factor: 1.5,
        };
        assert_eq!(plan.agent_count(), 3);
        assert_eq!(
            plan.agents().collect::<Vec<_>>(),
            vec![
                AgentKind::TestWriter,
                AgentKind::Implementer,
                AgentKind::SecurityAuditor
            ]
        );
        assert!(!plan.is_empty());
    }
}
