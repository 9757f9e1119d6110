//! Domain models for the TDD orchestration engine.

pub mod agent;
pub mod config;
pub mod context;
pub mod outcome;
pub mod plan;
pub mod report;

pub use agent::{AgentCapability, AgentKind, AgentPriority, ComplianceFlags, Phase};
pub use config::{AggregatorConfig, EngineConfig, ExecutionConfig, GateConfig};
pub use context::{Complexity, Criticality, FeatureContext, OrchestrationContext};
pub use outcome::{
    AgentResult, ComplianceSummary, CycleMetrics, CycleResult, CycleState, GateResult, Issue,
    IssueSeverity, PhaseResult,
};
pub use plan::{CoordinationPattern, ExecutionPlan};
pub use report::{AggregateReport, ScoreDimension, Trend};
