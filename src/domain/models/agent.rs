//! Agent capability descriptors.
//!
//! An agent is a category of automated check (test writer, security
//! auditor, ...), not a running process. The registry stores one
//! `AgentCapability` per `AgentKind` and scores them against an
//! `OrchestrationContext` when assembling a phase.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// TDD cycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Produce failing tests.
    Red,
    /// Minimal passing implementation.
    Green,
    /// Quality/performance improvement without behavior change.
    Refactor,
}

impl Phase {
    /// All phases in cycle order.
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Refactor];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Green => write!(f, "green"),
            Self::Refactor => write!(f, "refactor"),
        }
    }
}

impl FromStr for Phase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            "refactor" => Ok(Self::Refactor),
            _ => Err(anyhow::anyhow!("Invalid phase: {s}")),
        }
    }
}

/// Closed set of agent categories.
///
/// A closed enum (rather than free-form strings) lets the compiler
/// catch a registry/executor mismatch at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    /// Produces failing tests during RED.
    TestWriter,
    /// Produces the minimal passing implementation during GREEN.
    Implementer,
    /// Improves structure and performance during REFACTOR.
    Refactorer,
    /// Audits for security weaknesses.
    SecurityAuditor,
    /// Validates regulatory adherence.
    ComplianceValidator,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TestWriter => write!(f, "test-writer"),
            Self::Implementer => write!(f, "implementer"),
            Self::Refactorer => write!(f, "refactorer"),
            Self::SecurityAuditor => write!(f, "security-auditor"),
            Self::ComplianceValidator => write!(f, "compliance-validator"),
        }
    }
}

impl FromStr for AgentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "test-writer" => Ok(Self::TestWriter),
            "implementer" => Ok(Self::Implementer),
            "refactorer" => Ok(Self::Refactorer),
            "security-auditor" => Ok(Self::SecurityAuditor),
            "compliance-validator" => Ok(Self::ComplianceValidator),
            _ => Err(anyhow::anyhow!("Invalid agent kind: {s}")),
        }
    }
}

/// Tie-break and exclusion weight. Immutable after registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentPriority {
    /// Core agents for their supported phases.
    Primary,
    /// Supporting agents layered on top of the primaries.
    Secondary,
    /// Optional agents, excluded from critical work.
    Tertiary,
}

impl AgentPriority {
    /// Fixed ordinal base so priority dominates scoring ties.
    pub const fn weight(self) -> f64 {
        match self {
            Self::Primary => 100.0,
            Self::Secondary => 60.0,
            Self::Tertiary => 30.0,
        }
    }
}

impl fmt::Display for AgentPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
            Self::Tertiary => write!(f, "tertiary"),
        }
    }
}

/// Regulatory-adherence indicators a context may require and an agent
/// may satisfy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceFlags {
    /// Personal data handling obligations.
    pub data_protection: bool,
    /// Safety-critical device obligations.
    pub device_safety: bool,
    /// Professional-conduct obligations.
    pub professional_ethics: bool,
}

impl ComplianceFlags {
    /// All three flags set.
    pub const fn all() -> Self {
        Self {
            data_protection: true,
            device_safety: true,
            professional_ethics: true,
        }
    }

    /// Whether any flag is set.
    pub const fn any(self) -> bool {
        self.data_protection || self.device_safety || self.professional_ethics
    }

    /// Whether this set covers every flag `required` sets.
    pub const fn satisfies(self, required: Self) -> bool {
        (!required.data_protection || self.data_protection)
            && (!required.device_safety || self.device_safety)
            && (!required.professional_ethics || self.professional_ethics)
    }

    /// Whether at least one flag `required` sets is also set here.
    pub const fn intersects(self, required: Self) -> bool {
        (required.data_protection && self.data_protection)
            || (required.device_safety && self.device_safety)
            || (required.professional_ethics && self.professional_ethics)
    }

    /// Union of two flag sets.
    pub const fn union(self, other: Self) -> Self {
        Self {
            data_protection: self.data_protection || other.data_protection,
            device_safety: self.device_safety || other.device_safety,
            professional_ethics: self.professional_ethics || other.professional_ethics,
        }
    }
}

/// Descriptor for one participant category in the TDD cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCapability {
    /// Identifier used for registry lookup and executor dispatch.
    pub kind: AgentKind,

    /// Human-readable name.
    pub display_name: String,

    /// What this agent checks or produces.
    pub description: String,

    /// Coarse capability tags (informational).
    pub capabilities: BTreeSet<String>,

    /// Fine-grained specializations matched against context requirements.
    pub specializations: BTreeSet<String>,

    /// Tie-break and exclusion weight.
    pub priority: AgentPriority,

    /// Phases this agent may participate in. Must be non-empty.
    pub supported_phases: BTreeSet<Phase>,

    /// Keywords matched against the feature name and requirements.
    pub triggers: BTreeSet<String>,

    /// Compliance sub-flags this agent can vouch for, if any.
    pub compliance: Option<ComplianceFlags>,
}

impl AgentCapability {
    /// Create a capability with empty tag sets.
    pub fn new(
        kind: AgentKind,
        display_name: impl Into<String>,
        description: impl Into<String>,
        priority: AgentPriority,
    ) -> Self {
        Self {
            kind,
            display_name: display_name.into(),
            description: description.into(),
            capabilities: BTreeSet::new(),
            specializations: BTreeSet::new(),
            priority,
            supported_phases: BTreeSet::new(),
            triggers: BTreeSet::new(),
            compliance: None,
        }
    }

    /// Set the supported phases.
    pub fn with_phases(mut self, phases: impl IntoIterator<Item = Phase>) -> Self {
        self.supported_phases = phases.into_iter().collect();
        self
    }

    /// Set the trigger keywords.
    pub fn with_triggers<S: Into<String>>(mut self, triggers: impl IntoIterator<Item = S>) -> Self {
        self.triggers = triggers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the specializations.
    pub fn with_specializations<S: Into<String>>(
        mut self,
        specializations: impl IntoIterator<Item = S>,
    ) -> Self {
        self.specializations = specializations.into_iter().map(Into::into).collect();
        self
    }

    /// Set the capability tags.
    pub fn with_capabilities<S: Into<String>>(
        mut self,
        capabilities: impl IntoIterator<Item = S>,
    ) -> Self {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    /// Set the compliance flags this agent satisfies.
    pub fn with_compliance(mut self, flags: ComplianceFlags) -> Self {
        self.compliance = Some(flags);
        self
    }

    /// Whether this agent may run in `phase`.
    pub fn supports_phase(&self, phase: Phase) -> bool {
        self.supported_phases.contains(&phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display_roundtrip() {
        for phase in Phase::ALL {
            assert_eq!(phase.to_string().parse::<Phase>().unwrap(), phase);
        }
    }

    #[test]
    fn test_agent_kind_from_str() {
        assert_eq!(
            "test-writer".parse::<AgentKind>().unwrap(),
            AgentKind::TestWriter
        );
        assert_eq!(
            "SECURITY-AUDITOR".parse::<AgentKind>().unwrap(),
            AgentKind::SecurityAuditor
        );
        assert!("janitor".parse::<AgentKind>().is_err());
    }

    #[test]
    fn test_priority_weights() {
        assert_eq!(AgentPriority::Primary.weight(), 100.0);
        assert_eq!(AgentPriority::Secondary.weight(), 60.0);
        assert_eq!(AgentPriority::Tertiary.weight(), 30.0);
    }

    #[test]
    fn test_compliance_satisfies() {
        let required = ComplianceFlags {
            data_protection: true,
            device_safety: false,
            professional_ethics: true,
        };
        assert!(ComplianceFlags::all().satisfies(required));
        assert!(!ComplianceFlags {
            data_protection: true,
            device_safety: true,
            professional_ethics: false,
        }
        .satisfies(required));
        // Empty requirement is satisfied by anything.
        assert!(ComplianceFlags::default().satisfies(ComplianceFlags::default()));
    }

    #[test]
    fn test_compliance_intersects() {
        let required = ComplianceFlags {
            data_protection: true,
            device_safety: false,
            professional_ethics: false,
        };
        assert!(required.intersects(required));
        assert!(!ComplianceFlags::default().intersects(required));
    }

    #[test]
    fn test_capability_builder() {
        let cap = AgentCapability::new(
            AgentKind::TestWriter,
            "Test Writer",
            "Produces failing tests",
            AgentPriority::Primary,
        )
        .with_phases([Phase::Red])
        .with_triggers(["test", "coverage"]);

        assert!(cap.supports_phase(Phase::Red));
        assert!(!cap.supports_phase(Phase::Green));
        assert!(cap.triggers.contains("coverage"));
    }
}
