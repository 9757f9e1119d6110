//! Crucible - TDD Cycle Orchestration Engine
//!
//! Crucible coordinates specialized agents (test writers, reviewers,
//! security auditors, compliance validators) through a RED -> GREEN ->
//! REFACTOR development cycle. It scores and selects agents per phase,
//! picks a coordination topology (sequential, parallel, hierarchical,
//! event-driven), gates each phase on quality thresholds, and merges
//! agent outputs into a composite report with anomaly detection.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): pure models, errors, and ports to
//!   external collaborators (agent executor, metrics sink, history)
//! - **Service Layer** (`services`): registry, pattern selection, gate
//!   evaluation, aggregation, and the cycle orchestrator
//! - **Infrastructure Layer** (`infrastructure`): configuration loading
//!
//! The engine is a library: it does not know how checks actually run.
//! The host supplies an [`AgentExecutor`] and receives a serializable
//! [`CycleResult`] per cycle.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use crucible::{AgentRegistry, CycleOrchestrator, FeatureContext, Complexity};
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = Arc::new(AgentRegistry::with_defaults());
//!     let orchestrator = CycleOrchestrator::new(registry, my_executor);
//!     let feature = FeatureContext::new("Billing export", "api", Complexity::Medium);
//!     let result = orchestrator.execute_full_cycle(feature).await;
//!     println!("{}", result.to_json().unwrap());
//! }
//! ```

pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AgentCapability, AgentKind, AgentPriority, AgentResult, AggregateReport, Complexity,
    ComplianceFlags, ComplianceSummary, CoordinationPattern, Criticality, CycleMetrics,
    CycleResult, EngineConfig, ExecutionPlan, FeatureContext, GateResult, Issue, IssueSeverity,
    OrchestrationContext, Phase, PhaseResult, ScoreDimension, Trend,
};
pub use domain::ports::{
    AgentExecutor, HistoryProvider, InMemoryHistory, MetricsSink, NullMetricsSink,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AgentRegistry, CycleOrchestrator, ExecutionPatternSelector, QualityGateEvaluator,
    ResultAggregator,
};
