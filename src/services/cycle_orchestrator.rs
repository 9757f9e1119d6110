//! Cycle orchestrator.
//!
//! Drives the RED -> GREEN -> REFACTOR state machine for one feature:
//! asks the registry for eligible agents, the pattern selector for the
//! topology, dispatches agents under that topology, and gates each
//! phase before advancing. A gate failure short-circuits the remaining
//! phases; anything unexpected is folded into the `CycleResult` so the
//! host never sees a panic or an error from cycle execution.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{RwLock, Semaphore};
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AgentKind, AgentResult, ComplianceFlags, ComplianceSummary, CoordinationPattern, CycleMetrics,
    CycleResult, CycleState, EngineConfig, ExecutionPlan, FeatureContext, Issue, IssueSeverity,
    OrchestrationContext, Phase, PhaseResult,
};
use crate::domain::ports::{AgentExecutor, HistoryProvider, MetricsSink};
use crate::services::agent_registry::AgentRegistry;
use crate::services::pattern_selector::ExecutionPatternSelector;
use crate::services::quality_gates::QualityGateEvaluator;
use crate::services::result_aggregator::ResultAggregator;

/// Orchestrates full TDD cycles over a shared agent registry.
pub struct CycleOrchestrator {
    registry: Arc<AgentRegistry>,
    executor: Arc<dyn AgentExecutor>,
    selector: ExecutionPatternSelector,
    evaluator: QualityGateEvaluator,
    aggregator: ResultAggregator,
    metrics_sink: Option<Arc<dyn MetricsSink>>,
    config: EngineConfig,
    metrics: RwLock<CycleMetrics>,
}

impl CycleOrchestrator {
    /// Create an orchestrator with default configuration.
    pub fn new(registry: Arc<AgentRegistry>, executor: Arc<dyn AgentExecutor>) -> Self {
        Self::with_config(registry, executor, EngineConfig::default())
    }

    /// Create an orchestrator with explicit configuration.
    pub fn with_config(
        registry: Arc<AgentRegistry>,
        executor: Arc<dyn AgentExecutor>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            executor,
            selector: ExecutionPatternSelector::with_config(config.execution.clone()),
            evaluator: QualityGateEvaluator::with_config(config.gates.clone()),
            aggregator: ResultAggregator::with_config(config.aggregator.clone()),
            metrics_sink: None,
            config,
            metrics: RwLock::new(CycleMetrics::default()),
        }
    }

    /// Attach a metrics sink receiving a snapshot after each cycle.
    pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics_sink = Some(sink);
        self
    }

    /// Attach a historical store for baseline and trend computation.
    pub fn with_history(mut self, history: Arc<dyn HistoryProvider>) -> Self {
        self.aggregator = ResultAggregator::with_config(self.config.aggregator.clone())
            .with_history(history);
        self
    }

    /// Current cycle counters.
    pub async fn metrics(&self) -> CycleMetrics {
        *self.metrics.read().await
    }

    /// Reset the cycle counters. Explicit operator action only.
    pub async fn reset_metrics(&self) {
        *self.metrics.write().await = CycleMetrics::default();
    }

    /// Run one full cycle for a feature.
    ///
    /// Total: always returns a `CycleResult`. Gate failures are routine
    /// output; unexpected internal errors land in `result.error`.
    pub async fn execute_full_cycle(&self, feature: FeatureContext) -> CycleResult {
        let cycle_id = Uuid::new_v4();
        let started = Instant::now();
        let context = OrchestrationContext::from_feature(&feature);

        info!(
            cycle_id = %cycle_id,
            feature = %context.feature_name,
            complexity = %context.complexity,
            criticality = %context.criticality,
            "Cycle started"
        );

        let (phase_results, success, cycle_error) = match self.run_phases(&context).await {
            Ok((phases, success)) => (phases, success, None),
            Err(err) => {
                error!(cycle_id = %cycle_id, error = %err, "Cycle aborted unexpectedly");
                (Vec::new(), false, Some(err.to_string()))
            }
        };

        let compliance_summary = if context.compliance_required {
            Some(self.validate_compliance(&context, &phase_results))
        } else {
            None
        };

        let all_results: Vec<AgentResult> = phase_results
            .iter()
            .flat_map(|p| p.agent_results.iter().cloned())
            .collect();
        let aggregate_report = Some(self.aggregator.aggregate(&all_results));

        let duration_ms = started.elapsed().as_millis() as u64;
        let snapshot = {
            let mut metrics = self.metrics.write().await;
            metrics.record(success, duration_ms);
            *metrics
        };
        if let Some(sink) = &self.metrics_sink {
            sink.record(snapshot).await;
        }

        info!(
            cycle_id = %cycle_id,
            success,
            phases = phase_results.len(),
            duration_ms,
            "Cycle finished"
        );

        CycleResult {
            cycle_id,
            feature_name: context.feature_name,
            success,
            phase_results,
            compliance_summary,
            aggregate_report,
            duration_ms,
            completed_at: chrono::Utc::now(),
            error: cycle_error,
        }
    }

    /// Advance the state machine phase by phase, stopping at the first
    /// gate failure.
    async fn run_phases(
        &self,
        context: &OrchestrationContext,
    ) -> DomainResult<(Vec<PhaseResult>, bool)> {
        let mut state = CycleState::Idle;
        let mut phase_results = Vec::new();

        for phase in Phase::ALL {
            state.transition_to(match phase {
                Phase::Red => CycleState::Red,
                Phase::Green => CycleState::Green,
                Phase::Refactor => CycleState::Refactor,
            })?;

            let result = self.run_phase(phase, context).await;
            let passed = result.success;
            phase_results.push(result);

            if !passed {
                state.transition_to(CycleState::Failed)?;
                return Ok((phase_results, false));
            }
        }

        state.transition_to(CycleState::Completed)?;
        Ok((phase_results, true))
    }

    async fn run_phase(&self, phase: Phase, context: &OrchestrationContext) -> PhaseResult {
        let started = Instant::now();

        let agents = self.registry.select_for_phase(phase, context);
        let plan = self.selector.plan(context, phase, &agents);

        info!(
            phase = %phase,
            pattern = %plan.pattern,
            agents = plan.agent_count(),
            "Phase started"
        );

        let agent_results = self.dispatch(&plan, phase, context).await;
        let gate_results = self.evaluator.evaluate(&agent_results, phase, context);
        let success = gate_results.iter().all(|g| g.passed);

        if !success {
            let failed: Vec<&str> = gate_results
                .iter()
                .filter(|g| !g.passed)
                .map(|g| g.name.as_str())
                .collect();
            warn!(phase = %phase, gates = ?failed, "Phase gates failed");
        }

        PhaseResult {
            phase,
            success,
            pattern: plan.pattern,
            gate_results,
            agent_results,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Run the plan's agents under its topology.
    ///
    /// Serialized patterns award a total order over side effects; batch
    /// patterns fan out and collect every result before returning, so a
    /// failing agent never masks its siblings' output.
    async fn dispatch(
        &self,
        plan: &ExecutionPlan,
        phase: Phase,
        context: &OrchestrationContext,
    ) -> Vec<AgentResult> {
        if plan.pattern.is_serialized() {
            let audited = plan.pattern == CoordinationPattern::EventDriven;
            let mut results = Vec::with_capacity(plan.agent_count());
            for kind in plan.agents() {
                if audited {
                    info!(phase = %phase, agent = %kind, "Audit: agent dispatched");
                }
                let result = invoke_bounded(
                    Arc::clone(&self.executor),
                    kind,
                    phase,
                    context.clone(),
                    self.config.execution.agent_timeout_ms,
                )
                .await;
                if audited {
                    info!(
                        phase = %phase,
                        agent = %kind,
                        success = result.success,
                        score = result.score,
                        "Audit: agent completed"
                    );
                }
                results.push(result);
            }
            return results;
        }

        let mut results = Vec::with_capacity(plan.agent_count());
        for tier in &plan.tiers {
            // Tier-level sequential: the next tier starts only after
            // this batch fully completes.
            results.extend(self.run_batch(tier, phase, context).await);
        }
        results
    }

    /// Fan out one batch of agents and collect all results.
    async fn run_batch(
        &self,
        kinds: &[AgentKind],
        phase: Phase,
        context: &OrchestrationContext,
    ) -> Vec<AgentResult> {
        let semaphore = Arc::new(Semaphore::new(self.config.execution.max_concurrency.max(1)));
        let mut handles = Vec::with_capacity(kinds.len());

        for &kind in kinds {
            let executor = Arc::clone(&self.executor);
            let context = context.clone();
            let timeout_ms = self.config.execution.agent_timeout_ms;
            let semaphore = Arc::clone(&semaphore);

            handles.push(tokio::spawn(async move {
                // The semaphore is local to this batch and never closed.
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(err) => {
                        return AgentResult::failed(
                            kind,
                            0.0,
                            0,
                            Issue::new(
                                "task-failure",
                                IssueSeverity::Error,
                                format!("agent {kind} could not be scheduled: {err}"),
                            ),
                        );
                    }
                };
                invoke_bounded(executor, kind, phase, context, timeout_ms).await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (handle, &kind) in handles.into_iter().zip(kinds) {
            match handle.await {
                Ok(result) => results.push(result),
                Err(err) => {
                    error!(agent = %kind, error = %err, "Agent task panicked");
                    results.push(AgentResult::failed(
                        kind,
                        0.0,
                        0,
                        Issue::new(
                            "task-failure",
                            IssueSeverity::Error,
                            format!("agent {kind} task aborted: {err}"),
                        ),
                    ));
                }
            }
        }
        results
    }

    /// Score the context's required compliance areas against the union
    /// of findings reported by agents across all executed phases.
    fn validate_compliance(
        &self,
        context: &OrchestrationContext,
        phase_results: &[PhaseResult],
    ) -> ComplianceSummary {
        let satisfied = phase_results
            .iter()
            .flat_map(|p| p.agent_results.iter())
            .filter_map(|r| r.compliance_findings)
            .fold(ComplianceFlags::default(), ComplianceFlags::union);

        let summary = ComplianceSummary::evaluate(context.compliance_flags, satisfied);
        info!(score = summary.score, "Compliance validation complete");
        summary
    }
}

/// Invoke one agent with a timeout, converting executor errors and
/// timeouts into failing results so they participate in gate
/// evaluation normally.
async fn invoke_bounded(
    executor: Arc<dyn AgentExecutor>,
    kind: AgentKind,
    phase: Phase,
    context: OrchestrationContext,
    timeout_ms: u64,
) -> AgentResult {
    let started = Instant::now();
    match timeout(
        Duration::from_millis(timeout_ms),
        executor.invoke(kind, phase, &context),
    )
    .await
    {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            warn!(agent = %kind, phase = %phase, error = %err, "Agent invocation failed");
            AgentResult::failed(
                kind,
                0.0,
                started.elapsed().as_millis() as u64,
                Issue::new(
                    "invocation-error",
                    IssueSeverity::Error,
                    format!("agent {kind} failed: {err}"),
                ),
            )
        }
        Err(_) => {
            warn!(agent = %kind, phase = %phase, timeout_ms, "Agent invocation timed out");
            AgentResult::timed_out(kind, timeout_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::models::{Complexity, ExecutionConfig, ScoreDimension};
    use async_trait::async_trait;

    /// Executor that returns a fixed score for every agent.
    struct FixedExecutor {
        score: f64,
    }

    #[async_trait]
    impl AgentExecutor for FixedExecutor {
        async fn invoke(
            &self,
            agent_kind: AgentKind,
            _phase: Phase,
            _context: &OrchestrationContext,
        ) -> DomainResult<AgentResult> {
            Ok(AgentResult::passed(agent_kind, self.score, 5)
                .with_dimension(ScoreDimension::Quality, self.score)
                .with_dimension(ScoreDimension::TestCoverage, self.score)
                .with_dimension(ScoreDimension::Performance, self.score))
        }
    }

    /// Executor that never finishes within any test timeout.
    struct SlowExecutor;

    #[async_trait]
    impl AgentExecutor for SlowExecutor {
        async fn invoke(
            &self,
            agent_kind: AgentKind,
            _phase: Phase,
            _context: &OrchestrationContext,
        ) -> DomainResult<AgentResult> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(AgentResult::passed(agent_kind, 100.0, 5_000))
        }
    }

    /// Executor that always errors.
    struct FailingExecutor;

    #[async_trait]
    impl AgentExecutor for FailingExecutor {
        async fn invoke(
            &self,
            _agent_kind: AgentKind,
            _phase: Phase,
            _context: &OrchestrationContext,
        ) -> DomainResult<AgentResult> {
            Err(DomainError::ExecutionFailed("backend unavailable".to_string()))
        }
    }

    fn orchestrator(score: f64) -> CycleOrchestrator {
        CycleOrchestrator::new(
            Arc::new(AgentRegistry::with_defaults()),
            Arc::new(FixedExecutor { score }),
        )
    }

    #[tokio::test]
    async fn test_successful_cycle_runs_all_phases() {
        let orchestrator = orchestrator(96.0);
        let feature = FeatureContext::new("Widget", "feature", Complexity::Medium);

        let result = orchestrator.execute_full_cycle(feature).await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.phase_results.len(), 3);
        assert_eq!(
            result.phase_results.iter().map(|p| p.phase).collect::<Vec<_>>(),
            Phase::ALL.to_vec()
        );
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_red_failure_short_circuits() {
        // Score 60 fails the RED test-structure gate (threshold 80).
        let orchestrator = orchestrator(60.0);
        let feature = FeatureContext::new("Widget", "feature", Complexity::Medium);

        let result = orchestrator.execute_full_cycle(feature).await;
        assert!(!result.success);
        assert_eq!(result.phase_results.len(), 1);
        assert_eq!(result.phase_results[0].phase, Phase::Red);
        assert!(result.phase(Phase::Green).is_none());
        assert!(result.phase(Phase::Refactor).is_none());
    }

    #[tokio::test]
    async fn test_executor_errors_become_failing_results() {
        let orchestrator = CycleOrchestrator::new(
            Arc::new(AgentRegistry::with_defaults()),
            Arc::new(FailingExecutor),
        );
        let feature = FeatureContext::new("Widget", "feature", Complexity::Low);

        let result = orchestrator.execute_full_cycle(feature).await;
        assert!(!result.success);
        // The cycle itself did not error; the failure is routine output.
        assert!(result.error.is_none());
        let red = result.phase(Phase::Red).unwrap();
        assert!(red
            .agent_results
            .iter()
            .all(|r| !r.success && r.issues[0].category == "invocation-error"));
    }

    #[tokio::test]
    async fn test_slow_agents_time_out_without_aborting_the_cycle() {
        let config = EngineConfig {
            execution: ExecutionConfig {
                agent_timeout_ms: 50,
                ..ExecutionConfig::default()
            },
            ..EngineConfig::default()
        };
        let orchestrator = CycleOrchestrator::with_config(
            Arc::new(AgentRegistry::with_defaults()),
            Arc::new(SlowExecutor),
            config,
        );
        let feature = FeatureContext::new("Widget", "feature", Complexity::Low);

        let result = orchestrator.execute_full_cycle(feature).await;
        // Expiry is routine output: the RED gates fail, nothing aborts.
        assert!(!result.success);
        assert!(result.error.is_none());
        let red = result.phase(Phase::Red).unwrap();
        assert!(!red.agent_results.is_empty());
        for agent in &red.agent_results {
            assert!(!agent.success);
            assert!((agent.score - 0.0).abs() < f64::EPSILON);
            assert_eq!(agent.issues[0].category, "timeout");
        }
        assert!(result.phase(Phase::Green).is_none());
    }

    #[tokio::test]
    async fn test_metrics_count_terminal_cycles() {
        let orchestrator = orchestrator(96.0);
        for _ in 0..3 {
            let feature = FeatureContext::new("Widget", "feature", Complexity::Medium);
            orchestrator.execute_full_cycle(feature).await;
        }

        let metrics = orchestrator.metrics().await;
        assert_eq!(metrics.total_cycles, 3);
        assert_eq!(metrics.successful_cycles + metrics.failed_cycles, 3);

        orchestrator.reset_metrics().await;
        assert_eq!(orchestrator.metrics().await.total_cycles, 0);
    }

    #[tokio::test]
    async fn test_compliance_summary_attached_on_failure_too() {
        let orchestrator = CycleOrchestrator::new(
            Arc::new(AgentRegistry::with_defaults()),
            Arc::new(FailingExecutor),
        );
        let feature = FeatureContext::new("Records export", "export", Complexity::Medium)
            .with_compliance(ComplianceFlags {
                data_protection: true,
                ..ComplianceFlags::default()
            });

        let result = orchestrator.execute_full_cycle(feature).await;
        assert!(!result.success);
        let summary = result.compliance_summary.unwrap();
        assert_eq!(summary.score, 0);
    }

    #[tokio::test]
    async fn test_aggregate_report_always_present() {
        let orchestrator = orchestrator(96.0);
        let feature = FeatureContext::new("Widget", "feature", Complexity::Low);
        let result = orchestrator.execute_full_cycle(feature).await;
        let report = result.aggregate_report.unwrap();
        assert!(report.quality_score > 0.0);
    }
}
