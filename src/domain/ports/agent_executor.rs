//! Agent executor port - interface to whatever actually runs checks.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{AgentKind, AgentResult, OrchestrationContext, Phase};

/// Trait for the collaborator that performs an agent's actual work.
///
/// The orchestrator controls ordering, concurrency, and timeouts; the
/// executor runs the check itself (test generation, linting, a security
/// scan, ...) and reports back a scored `AgentResult`. An executor
/// error never aborts a cycle: the orchestrator converts it into a
/// failing result so it participates in gate evaluation normally.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Run one agent's check for the given phase and context.
    async fn invoke(
        &self,
        agent_kind: AgentKind,
        phase: Phase,
        context: &OrchestrationContext,
    ) -> DomainResult<AgentResult>;
}
