//! Service layer: registry, selection, gating, aggregation, and the
//! cycle orchestrator itself.

pub mod agent_registry;
pub mod cycle_orchestrator;
pub mod pattern_selector;
pub mod quality_gates;
pub mod result_aggregator;

pub use agent_registry::AgentRegistry;
pub use cycle_orchestrator::CycleOrchestrator;
pub use pattern_selector::ExecutionPatternSelector;
pub use quality_gates::QualityGateEvaluator;
pub use result_aggregator::ResultAggregator;
