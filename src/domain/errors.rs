//! Domain errors for the Crucible orchestration engine.
//!
//! Only registration and configuration problems surface as `Err` values
//! to callers. Everything encountered while a cycle runs is folded into
//! the `CycleResult` so cycle execution stays total.

use thiserror::Error;

use crate::domain::models::AgentKind;

/// Domain-level errors.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An agent kind was registered twice without overwrite enabled.
    #[error("Agent already registered: {0}")]
    DuplicateAgent(AgentKind),

    /// A capability declared an empty supported-phase set.
    #[error("Agent {0} declares no supported phases")]
    EmptySupportedPhases(AgentKind),

    /// A cycle state transition violated the state machine.
    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        /// State the cycle was in.
        from: String,
        /// State the transition targeted.
        to: String,
        /// Why the transition is illegal.
        reason: String,
    },

    /// Loaded configuration failed validation.
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    /// An agent backend reported a hard failure.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// A cycle result could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Convenience result alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
