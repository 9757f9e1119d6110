//! Ports (interfaces) to external collaborators.

pub mod agent_executor;
pub mod history;
pub mod metrics_sink;

pub use agent_executor::AgentExecutor;
pub use history::{HistoryProvider, InMemoryHistory};
pub use metrics_sink::{MetricsSink, NullMetricsSink};
