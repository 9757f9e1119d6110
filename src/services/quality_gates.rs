//! Quality gate evaluation.
//!
//! Pure function of its inputs: the same agent results, phase, context,
//! and thresholds always produce the same verdicts. A phase passes iff
//! every gate passes.

use crate::domain::models::{
    AgentResult, Complexity, Criticality, GateConfig, GateResult, OrchestrationContext, Phase,
    ScoreDimension,
};

/// Applies phase-specific pass/fail criteria to agent outputs.
#[derive(Debug, Clone, Default)]
pub struct QualityGateEvaluator {
    gates: GateConfig,
}

impl QualityGateEvaluator {
    /// Create an evaluator with the default policy table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an evaluator with explicit thresholds.
    pub fn with_config(gates: GateConfig) -> Self {
        Self { gates }
    }

    /// Evaluate the gates for `phase` over the phase's agent outputs.
    ///
    /// Empty outputs evaluate against a measured value of 0, so the
    /// gates fail rather than error.
    pub fn evaluate(
        &self,
        results: &[AgentResult],
        phase: Phase,
        context: &OrchestrationContext,
    ) -> Vec<GateResult> {
        match phase {
            Phase::Red => vec![
                GateResult::at_least(
                    "test-structure",
                    measure(results, ScoreDimension::Quality),
                    self.gates.red_test_structure_min,
                ),
                GateResult::at_least(
                    "coverage",
                    measure(results, ScoreDimension::TestCoverage),
                    self.coverage_target(context),
                ),
            ],
            Phase::Green => vec![
                GateResult::at_least(
                    "implementation-quality",
                    measure(results, ScoreDimension::Quality),
                    self.gates.green_quality_min,
                ),
                GateResult::at_least("tests-pass", success_percent(results), 100.0),
            ],
            Phase::Refactor => vec![
                GateResult::at_least(
                    "code-quality",
                    measure(results, ScoreDimension::Quality),
                    self.gates.refactor_quality_min,
                ),
                GateResult::at_least(
                    "performance",
                    measure(results, ScoreDimension::Performance),
                    self.gates.refactor_performance_min,
                ),
            ],
        }
    }

    /// Coverage target tightens with risk: criticality first, then
    /// complexity.
    fn coverage_target(&self, context: &OrchestrationContext) -> f64 {
        if context.criticality == Criticality::Critical {
            self.gates.coverage_critical
        } else {
            match context.complexity {
                Complexity::High => self.gates.coverage_high,
                Complexity::Medium => self.gates.coverage_medium,
                Complexity::Low => self.gates.coverage_default,
            }
        }
    }
}

/// Mean of the given dimension over results reporting it, falling back
/// to the mean overall score, then to 0 for empty input.
fn measure(results: &[AgentResult], dimension: ScoreDimension) -> f64 {
    let reported: Vec<f64> = results
        .iter()
        .filter_map(|r| r.dimension_scores.get(&dimension).copied())
        .collect();
    if !reported.is_empty() {
        return reported.iter().sum::<f64>() / reported.len() as f64;
    }
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64
}

/// Percentage of agent results that reported success.
fn success_percent(results: &[AgentResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.success).count();
    passed as f64 * 100.0 / results.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{AgentKind, FeatureContext};

    fn ctx(complexity: Complexity) -> OrchestrationContext {
        OrchestrationContext::from_feature(&FeatureContext::new("Feature", "kind", complexity))
    }

    fn critical_ctx() -> OrchestrationContext {
        OrchestrationContext::from_feature(
            &FeatureContext::new("Dosage", "calculation", Complexity::Low)
                .with_criticality(Criticality::Critical),
        )
    }

    #[test]
    fn test_red_gates_pass_at_thresholds() {
        let evaluator = QualityGateEvaluator::new();
        let results = vec![AgentResult::passed(AgentKind::TestWriter, 80.0, 10)
            .with_dimension(ScoreDimension::TestCoverage, 75.0)];

        let gates = evaluator.evaluate(&results, Phase::Red, &ctx(Complexity::Medium));
        assert_eq!(gates.len(), 2);
        assert!(gates.iter().all(|g| g.passed), "{gates:?}");
    }

    #[test]
    fn test_critical_coverage_target_is_95() {
        let evaluator = QualityGateEvaluator::new();
        let results = vec![AgentResult::passed(AgentKind::TestWriter, 90.0, 10)
            .with_dimension(ScoreDimension::TestCoverage, 90.0)];

        let gates = evaluator.evaluate(&results, Phase::Red, &critical_ctx());
        let coverage = gates.iter().find(|g| g.name == "coverage").unwrap();
        assert_eq!(coverage.threshold, 95.0);
        assert!(!coverage.passed);
    }

    #[test]
    fn test_coverage_target_follows_complexity() {
        let evaluator = QualityGateEvaluator::new();
        for (complexity, expected) in [
            (Complexity::High, 85.0),
            (Complexity::Medium, 75.0),
            (Complexity::Low, 70.0),
        ] {
            let gates = evaluator.evaluate(&[], Phase::Red, &ctx(complexity));
            let coverage = gates.iter().find(|g| g.name == "coverage").unwrap();
            assert_eq!(coverage.threshold, expected, "{complexity}");
        }
    }

    #[test]
    fn test_green_requires_all_tests_passing() {
        let evaluator = QualityGateEvaluator::new();
        let results = vec![
            AgentResult::passed(AgentKind::Implementer, 95.0, 10),
            AgentResult::timed_out(AgentKind::SecurityAuditor, 1_000),
        ];

        let gates = evaluator.evaluate(&results, Phase::Green, &ctx(Complexity::Low));
        let tests_pass = gates.iter().find(|g| g.name == "tests-pass").unwrap();
        assert_eq!(tests_pass.actual, 50.0);
        assert!(!tests_pass.passed);
    }

    #[test]
    fn test_refactor_gates_use_dimensions() {
        let evaluator = QualityGateEvaluator::new();
        let results = vec![AgentResult::passed(AgentKind::Refactorer, 70.0, 10)
            .with_dimension(ScoreDimension::Quality, 92.0)
            .with_dimension(ScoreDimension::Performance, 88.0)];

        let gates = evaluator.evaluate(&results, Phase::Refactor, &ctx(Complexity::Medium));
        assert!(gates.iter().all(|g| g.passed), "{gates:?}");
    }

    #[test]
    fn test_empty_results_fail_without_panicking() {
        let evaluator = QualityGateEvaluator::new();
        for phase in Phase::ALL {
            let gates = evaluator.evaluate(&[], phase, &ctx(Complexity::Medium));
            assert!(gates.iter().all(|g| !g.passed && g.actual == 0.0));
        }
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let evaluator = QualityGateEvaluator::new();
        let results = vec![AgentResult::passed(AgentKind::TestWriter, 83.0, 10)];
        let context = ctx(Complexity::Medium);

        let first = evaluator.evaluate(&results, Phase::Red, &context);
        let second = evaluator.evaluate(&results, Phase::Red, &context);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.passed, b.passed);
            assert_eq!(a.actual, b.actual);
        }
    }
}
