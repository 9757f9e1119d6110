//! Execution pattern selection.
//!
//! Picks the coordination topology for a phase and expands the chosen
//! agents into a concrete `ExecutionPlan`. Compliance and criticality
//! are safety properties, so their rules are checked before the
//! complexity optimization.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::models::{
    AgentCapability, AgentPriority, Complexity, CoordinationPattern, Criticality, ExecutionConfig,
    ExecutionPlan, OrchestrationContext, Phase,
};

/// Chooses topologies and builds execution plans.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPatternSelector {
    execution: ExecutionConfig,
}

impl ExecutionPatternSelector {
    /// Create a selector with default execution tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a selector with explicit execution tuning.
    pub fn with_config(execution: ExecutionConfig) -> Self {
        Self { execution }
    }

    /// Select the coordination pattern for one phase.
    ///
    /// First matching rule wins; the rules are not combined:
    /// 1. compliance required -> event-driven (total order, auditable)
    /// 2. criticality critical -> sequential (no concurrent mutation)
    /// 3. complexity high -> hierarchical (primary tier gates the rest)
    /// 4. otherwise -> parallel
    pub fn select(&self, context: &OrchestrationContext, phase: Phase) -> CoordinationPattern {
        let pattern = if context.compliance_required {
            CoordinationPattern::EventDriven
        } else if context.criticality == Criticality::Critical {
            CoordinationPattern::Sequential
        } else if context.complexity == Complexity::High {
            CoordinationPattern::Hierarchical
        } else {
            CoordinationPattern::Parallel
        };

        debug!(
            phase = %phase,
            pattern = %pattern,
            criticality = %context.criticality,
            "Selected coordination pattern"
        );
        pattern
    }

    /// Expand selected agents into a concrete plan for the phase.
    ///
    /// Hierarchical plans group agents into priority tiers (primary
    /// first); every other pattern carries a single tier in selection
    /// order.
    pub fn plan(
        &self,
        context: &OrchestrationContext,
        phase: Phase,
        agents: &[AgentCapability],
    ) -> ExecutionPlan {
        let pattern = self.select(context, phase);

        let tiers: Vec<Vec<_>> = if pattern == CoordinationPattern::Hierarchical {
            let mut by_priority: BTreeMap<AgentPriority, Vec<_>> = BTreeMap::new();
            for agent in agents {
                by_priority.entry(agent.priority).or_default().push(agent.kind);
            }
            by_priority.into_values().collect()
        } else {
            vec![agents.iter().map(|a| a.kind).collect()]
        };

        let base = self.execution.agent_base_cost_ms;
        let estimated_duration_ms = match pattern {
            CoordinationPattern::Sequential | CoordinationPattern::EventDriven => {
                base * agents.len() as u64
            }
            // Each parallel batch costs one agent's time.
            CoordinationPattern::Parallel => base * u64::from(!agents.is_empty()),
            CoordinationPattern::Hierarchical => {
                base * tiers.iter().filter(|t| !t.is_empty()).count() as u64
            }
        };

        let tier_count = tiers.iter().filter(|t| !t.is_empty()).count().max(1);
        let parallelization_factor = if pattern.is_serialized() {
            1.0
        } else {
            agents.len() as f64 / tier_count as f64
        };

        ExecutionPlan {
            pattern,
            tiers,
            estimated_duration_ms,
            parallelization_factor,
        }
    }
}
