//! Agent registry: capability catalog, eligibility filtering, and
//! scored selection.
//!
//! The registry is an explicit instance constructed at process start
//! and shared behind `Arc` into orchestrators. Reads are lock-free;
//! `register` takes `&mut self` and must happen before cycles begin
//! (or be externally synchronized).

use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AgentCapability, AgentKind, AgentPriority, ComplianceFlags, Complexity, Criticality,
    OrchestrationContext, Phase,
};

/// Bonus per trigger keyword matched against the feature name or a
/// requirement.
pub const TRIGGER_MATCH_BONUS: f64 = 15.0;

/// Cap on the total trigger bonus.
pub const TRIGGER_BONUS_CAP: f64 = 45.0;

/// Bonus per specialization found in the requirements.
pub const SPECIALIZATION_MATCH_BONUS: f64 = 10.0;

/// Cap on the total specialization bonus.
pub const SPECIALIZATION_BONUS_CAP: f64 = 30.0;

/// Bonus when compliance is required and the agent satisfies every
/// required sub-flag.
pub const COMPLIANCE_BONUS: f64 = 20.0;

/// Bonus for structurally-specialized agents on high-complexity work.
pub const COMPLEXITY_BONUS: f64 = 10.0;

/// Specialization markers that earn the complexity bonus.
const STRUCTURAL_SPECIALIZATIONS: [&str; 2] = ["structural", "architecture"];

/// Compute an agent's selection score for a context.
///
/// Pure function: priority weight dominates (100/60/30), then capped
/// trigger, specialization, compliance, and complexity bonuses. Hard
/// eligibility exclusions live in `agents_for_phase`, not here.
pub fn score(agent: &AgentCapability, context: &OrchestrationContext) -> f64 {
    let mut total = agent.priority.weight();

    let haystacks: Vec<String> = std::iter::once(context.feature_name.to_lowercase())
        .chain(context.requirements.iter().map(|r| r.to_lowercase()))
        .collect();

    let trigger_bonus = agent
        .triggers
        .iter()
        .filter(|trigger| {
            let needle = trigger.to_lowercase();
            haystacks.iter().any(|h| h.contains(&needle))
        })
        .count() as f64
        * TRIGGER_MATCH_BONUS;
    total += trigger_bonus.min(TRIGGER_BONUS_CAP);

    let specialization_bonus = agent
        .specializations
        .iter()
        .filter(|spec| {
            let needle = spec.to_lowercase();
            haystacks[1..].iter().any(|h| h.contains(&needle))
        })
        .count() as f64
        * SPECIALIZATION_MATCH_BONUS;
    total += specialization_bonus.min(SPECIALIZATION_BONUS_CAP);

    if context.compliance_required
        && agent
            .compliance
            .is_some_and(|flags| flags.satisfies(context.compliance_flags))
    {
        total += COMPLIANCE_BONUS;
    }

    if context.complexity == Complexity::High
        && agent.specializations.iter().any(|spec| {
            let spec = spec.to_lowercase();
            STRUCTURAL_SPECIALIZATIONS.iter().any(|m| spec.contains(m))
        })
    {
        total += COMPLEXITY_BONUS;
    }

    total
}

/// Catalog of registered agent capabilities.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    /// Insertion order is the deterministic tie-break for selection.
    agents: Vec<AgentCapability>,
    overwrite_on_register: bool,
}

impl AgentRegistry {
    /// Create an empty registry that rejects duplicate registration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry where re-registering a kind replaces
    /// the previous capability instead of erroring.
    pub fn with_overwrite() -> Self {
        Self {
            agents: Vec::new(),
            overwrite_on_register: true,
        }
    }

    /// Create a registry seeded with the five default agents.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for capability in Self::default_capabilities() {
            // Seeds are distinct kinds; registration cannot fail.
            let _ = registry.register(capability);
        }
        registry
    }

    /// The built-in capability set covering every `AgentKind`.
    pub fn default_capabilities() -> Vec<AgentCapability> {
        vec![
            AgentCapability::new(
                AgentKind::TestWriter,
                "Test Writer",
                "Produces failing tests that pin down the required behavior",
                AgentPriority::Primary,
            )
            .with_phases([Phase::Red])
            .with_capabilities(["test-generation", "coverage-analysis"])
            .with_specializations(["unit-testing", "test-design"])
            .with_triggers(["test", "coverage", "tdd"]),
            AgentCapability::new(
                AgentKind::Implementer,
                "Implementer",
                "Writes the minimal implementation that turns the tests green",
                AgentPriority::Primary,
            )
            .with_phases([Phase::Green])
            .with_capabilities(["implementation", "debugging"])
            .with_specializations(["api-design", "data-modeling"])
            .with_triggers(["implement", "feature", "api"]),
            AgentCapability::new(
                AgentKind::Refactorer,
                "Refactorer",
                "Improves structure and performance without changing behavior",
                AgentPriority::Secondary,
            )
            .with_phases([Phase::Refactor])
            .with_capabilities(["refactoring", "performance-tuning"])
            .with_specializations(["architecture", "structural-cleanup"])
            .with_triggers(["refactor", "cleanup", "performance"]),
            AgentCapability::new(
                AgentKind::SecurityAuditor,
                "Security Auditor",
                "Audits produced code for security weaknesses",
                AgentPriority::Secondary,
            )
            .with_phases([Phase::Green, Phase::Refactor])
            .with_capabilities(["static-analysis", "dependency-audit"])
            .with_specializations(["security-analysis", "threat-modeling"])
            .with_triggers(["security", "auth", "encryption"])
            .with_compliance(ComplianceFlags {
                data_protection: true,
                device_safety: false,
                professional_ethics: false,
            }),
            AgentCapability::new(
                AgentKind::ComplianceValidator,
                "Compliance Validator",
                "Validates regulatory adherence across all phases",
                AgentPriority::Tertiary,
            )
            .with_phases([Phase::Red, Phase::Green, Phase::Refactor])
            .with_capabilities(["regulatory-validation", "audit-trail"])
            .with_specializations(["compliance-review"])
            .with_triggers(["compliance", "audit", "regulatory"])
            .with_compliance(ComplianceFlags::all()),
        ]
    }

    /// Register a capability.
    ///
    /// Fails with `DomainError::DuplicateAgent` when the kind is
    /// already present, unless the registry was constructed with
    /// overwrite semantics. Capabilities must declare at least one
    /// supported phase.
    pub fn register(&mut self, capability: AgentCapability) -> DomainResult<()> {
        if capability.supported_phases.is_empty() {
            return Err(DomainError::EmptySupportedPhases(capability.kind));
        }

        if let Some(existing) = self.agents.iter_mut().find(|a| a.kind == capability.kind) {
            if !self.overwrite_on_register {
                return Err(DomainError::DuplicateAgent(capability.kind));
            }
            debug!(agent = %capability.kind, "Overwriting registered capability");
            *existing = capability;
            return Ok(());
        }

        debug!(agent = %capability.kind, priority = %capability.priority, "Registered agent");
        self.agents.push(capability);
        Ok(())
    }

    /// Look up a capability by kind.
    pub fn get(&self, kind: AgentKind) -> Option<&AgentCapability> {
        self.agents.iter().find(|a| a.kind == kind)
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no capabilities are registered.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents eligible to run in `phase`.
    ///
    /// Fail-open by contract: with no context, every agent supporting
    /// the phase is returned. With a context, agents are additionally
    /// filtered by compliance overlap (when the context requires
    /// compliance) and tertiary agents are dropped for critical work.
    /// Never errors.
    pub fn agents_for_phase(
        &self,
        phase: Phase,
        context: Option<&OrchestrationContext>,
    ) -> Vec<AgentCapability> {
        let mut eligible: Vec<AgentCapability> = self
            .agents
            .iter()
            .filter(|a| a.supports_phase(phase))
            .cloned()
            .collect();

        let Some(ctx) = context else {
            return eligible;
        };

        if ctx.compliance_required && ctx.compliance_flags.any() {
            eligible.retain(|a| {
                a.compliance
                    .is_some_and(|flags| flags.intersects(ctx.compliance_flags))
            });
        }

        if ctx.criticality == Criticality::Critical {
            eligible.retain(|a| a.priority != AgentPriority::Tertiary);
        }

        eligible
    }

    /// All registered agents ranked by descending score.
    ///
    /// Ties keep registration order, so repeated calls with the same
    /// context and registry state return identical sequences.
    pub fn select_optimal(&self, context: &OrchestrationContext) -> Vec<AgentCapability> {
        Self::rank(self.agents.clone(), context)
    }

    /// Phase-eligible agents ranked by descending score.
    pub fn select_for_phase(
        &self,
        phase: Phase,
        context: &OrchestrationContext,
    ) -> Vec<AgentCapability> {
        Self::rank(self.agents_for_phase(phase, Some(context)), context)
    }

    /// Recommended agent ordering over the whole cycle: per-phase
    /// ranked selections concatenated in RED, GREEN, REFACTOR order,
    /// deduplicated keeping the first occurrence.
    pub fn recommended_workflow(&self, context: &OrchestrationContext) -> Vec<AgentKind> {
        let mut workflow = Vec::new();
        for phase in Phase::ALL {
            for capability in self.select_for_phase(phase, context) {
                if !workflow.contains(&capability.kind) {
                    workflow.push(capability.kind);
                }
            }
        }
        workflow
    }

    fn rank(
        candidates: Vec<AgentCapability>,
        context: &OrchestrationContext,
    ) -> Vec<AgentCapability> {
        let mut scored: Vec<(f64, AgentCapability)> = candidates
            .into_iter()
            .map(|a| (score(&a, context), a))
            .collect();
        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(_, a)| a).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Complexity, FeatureContext};

    fn context_for(feature: FeatureContext) -> OrchestrationContext {
        OrchestrationContext::from_feature(&feature)
    }

    fn plain_context(name: &str) -> OrchestrationContext {
        context_for(FeatureContext::new(name, "feature", Complexity::Medium))
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = AgentRegistry::new();
        let cap = AgentCapability::new(
            AgentKind::TestWriter,
            "Test Writer",
            "",
            AgentPriority::Primary,
        )
        .with_phases([Phase::Red]);

        registry.register(cap.clone()).unwrap();
        let err = registry.register(cap).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateAgent(AgentKind::TestWriter)));
    }

    #[test]
    fn test_register_overwrite_mode() {
        let mut registry = AgentRegistry::with_overwrite();
        let cap = AgentCapability::new(
            AgentKind::TestWriter,
            "Test Writer",
            "",
            AgentPriority::Primary,
        )
        .with_phases([Phase::Red]);
        registry.register(cap.clone()).unwrap();
        registry
            .register(cap.with_triggers(["integration"]))
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry
            .get(AgentKind::TestWriter)
            .unwrap()
            .triggers
            .contains("integration"));
    }

    #[test]
    fn test_register_requires_phases() {
        let mut registry = AgentRegistry::new();
        let cap = AgentCapability::new(
            AgentKind::Refactorer,
            "Refactorer",
            "",
            AgentPriority::Secondary,
        );
        assert!(matches!(
            registry.register(cap),
            Err(DomainError::EmptySupportedPhases(AgentKind::Refactorer))
        ));
    }

    #[test]
    fn test_agents_for_phase_fail_open_without_context() {
        let registry = AgentRegistry::with_defaults();
        let agents = registry.agents_for_phase(Phase::Red, None);
        // test-writer and compliance-validator support RED.
        assert_eq!(agents.len(), 2);
    }

    #[test]
    fn test_critical_context_excludes_tertiary() {
        let registry = AgentRegistry::with_defaults();
        let ctx = context_for(
            FeatureContext::new("Dosage engine", "calculation", Complexity::High)
                .with_criticality(Criticality::Critical),
        );
        for phase in Phase::ALL {
            for agent in registry.agents_for_phase(phase, Some(&ctx)) {
                assert_ne!(agent.priority, AgentPriority::Tertiary, "phase {phase}");
            }
        }
    }

    #[test]
    fn test_compliance_filter_keeps_overlapping_agents() {
        let registry = AgentRegistry::with_defaults();
        let ctx = context_for(
            FeatureContext::new("Records export", "export", Complexity::Medium).with_compliance(
                ComplianceFlags {
                    data_protection: true,
                    ..ComplianceFlags::default()
                },
            ),
        );
        let agents = registry.agents_for_phase(Phase::Green, Some(&ctx));
        // Only the security auditor and compliance validator carry
        // data-protection coverage; implementer is filtered out.
        assert!(agents.iter().all(|a| a
            .compliance
            .is_some_and(|f| f.data_protection)));
        assert!(!agents.is_empty());
    }

    #[test]
    fn test_trigger_bonus_ranks_matching_agent_first() {
        let mut registry = AgentRegistry::new();
        registry
            .register(
                AgentCapability::new(AgentKind::SecurityAuditor, "B", "", AgentPriority::Secondary)
                    .with_phases([Phase::Green]),
            )
            .unwrap();
        registry
            .register(
                AgentCapability::new(AgentKind::Implementer, "A", "", AgentPriority::Primary)
                    .with_phases([Phase::Green])
                    .with_triggers(["billing"]),
            )
            .unwrap();

        let ctx = plain_context("Patient Billing Export");
        let ranked = registry.select_optimal(&ctx);
        assert_eq!(ranked[0].kind, AgentKind::Implementer);
        assert_eq!(score(&ranked[0], &ctx), 115.0);
        assert_eq!(score(&ranked[1], &ctx), 60.0);
    }

    #[test]
    fn test_trigger_bonus_capped() {
        let agent = AgentCapability::new(
            AgentKind::TestWriter,
            "Test Writer",
            "",
            AgentPriority::Tertiary,
        )
        .with_phases([Phase::Red])
        .with_triggers(["alpha", "beta", "gamma", "delta"]);

        let ctx = plain_context("alpha beta gamma delta");
        // 30 base + capped 45, four matches would otherwise add 60.
        assert_eq!(score(&agent, &ctx), 75.0);
    }

    #[test]
    fn test_specialization_bonus_matches_requirements_only() {
        let agent = AgentCapability::new(
            AgentKind::Refactorer,
            "Refactorer",
            "",
            AgentPriority::Secondary,
        )
        .with_phases([Phase::Refactor])
        .with_specializations(["caching"]);

        // Specialization in the feature name does not count.
        let by_name = plain_context("caching layer");
        assert_eq!(score(&agent, &by_name), 60.0);

        let by_requirement = context_for(
            FeatureContext::new("Hot path", "feature", Complexity::Medium)
                .with_requirements(["add caching for lookups"]),
        );
        assert_eq!(score(&agent, &by_requirement), 70.0);
    }

    #[test]
    fn test_compliance_bonus_requires_full_coverage() {
        let required = ComplianceFlags {
            data_protection: true,
            device_safety: true,
            professional_ethics: false,
        };
        let ctx = context_for(
            FeatureContext::new("Device telemetry", "ingest", Complexity::Medium)
                .with_compliance(required),
        );

        let partial = AgentCapability::new(
            AgentKind::SecurityAuditor,
            "Partial",
            "",
            AgentPriority::Secondary,
        )
        .with_phases([Phase::Green])
        .with_compliance(ComplianceFlags {
            data_protection: true,
            ..ComplianceFlags::default()
        });
        // Partial coverage scores no bonus but is not excluded here.
        assert_eq!(score(&partial, &ctx), 60.0);

        let full = partial.clone().with_compliance(ComplianceFlags::all());
        assert_eq!(score(&full, &ctx), 80.0);
    }

    #[test]
    fn test_complexity_bonus_for_structural_specialists() {
        let agent = AgentCapability::new(
            AgentKind::Refactorer,
            "Refactorer",
            "",
            AgentPriority::Secondary,
        )
        .with_phases([Phase::Refactor])
        .with_specializations(["architecture"]);

        let high = context_for(FeatureContext::new("Engine split", "rework", Complexity::High));
        assert_eq!(score(&agent, &high), 70.0);

        let medium = plain_context("Engine split");
        assert_eq!(score(&agent, &medium), 60.0);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let registry = AgentRegistry::with_defaults();
        let ctx = context_for(
            FeatureContext::new("Billing API", "api-endpoint", Complexity::High)
                .with_requirements(["security review", "api-design docs"]),
        );
        let first = registry.select_optimal(&ctx);
        let second = registry.select_optimal(&ctx);
        let kinds =
            |caps: &[AgentCapability]| caps.iter().map(|c| c.kind).collect::<Vec<_>>();
        assert_eq!(kinds(&first), kinds(&second));
    }

    #[test]
    fn test_ties_keep_registration_order() {
        let mut registry = AgentRegistry::new();
        // Same priority, no bonuses: scores tie.
        registry
            .register(
                AgentCapability::new(AgentKind::SecurityAuditor, "First", "", AgentPriority::Secondary)
                    .with_phases([Phase::Green]),
            )
            .unwrap();
        registry
            .register(
                AgentCapability::new(AgentKind::Refactorer, "Second", "", AgentPriority::Secondary)
                    .with_phases([Phase::Green]),
            )
            .unwrap();

        let ranked = registry.select_optimal(&plain_context("nothing matches"));
        assert_eq!(ranked[0].kind, AgentKind::SecurityAuditor);
        assert_eq!(ranked[1].kind, AgentKind::Refactorer);
    }

    #[test]
    fn test_recommended_workflow_dedupes_keeping_first() {
        let registry = AgentRegistry::with_defaults();
        let ctx = plain_context("Feature work");
        let workflow = registry.recommended_workflow(&ctx);

        let mut seen = std::collections::BTreeSet::new();
        for kind in &workflow {
            assert!(seen.insert(*kind), "duplicate {kind}");
        }
        // RED selections lead the workflow.
        assert_eq!(workflow[0], AgentKind::TestWriter);
        assert!(workflow.contains(&AgentKind::Implementer));
    }
}
