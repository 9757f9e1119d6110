//! Feature and orchestration contexts.
//!
//! A `FeatureContext` is what the caller hands in; the engine derives an
//! `OrchestrationContext` from it once per cycle and treats the derived
//! form as immutable for the rest of that cycle.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::agent::ComplianceFlags;

/// Implementation complexity asserted by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Localized change, no cross-module impact.
    Low,
    /// Touches several modules or a data contract.
    Medium,
    /// Structural or architectural work.
    High,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl FromStr for Complexity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(anyhow::anyhow!("Invalid complexity: {s}")),
        }
    }
}

/// Risk tier that tightens agent eligibility and execution ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    /// Failure is an inconvenience.
    Low,
    /// Failure degrades the feature.
    Medium,
    /// Failure breaks the feature for users.
    High,
    /// Failure carries safety or regulatory consequences.
    Critical,
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for Criticality {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(anyhow::anyhow!("Invalid criticality: {s}")),
        }
    }
}

/// Caller-supplied description of the unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureContext {
    /// Feature under development, e.g. "Patient Billing Export".
    pub feature_name: String,

    /// Coarse category, e.g. "api-endpoint" or "data-migration".
    pub feature_kind: String,

    /// Asserted implementation complexity.
    pub complexity: Complexity,

    /// Ordered requirement statements.
    pub requirements: Vec<String>,

    /// Whether regulatory validation must run for this feature.
    pub compliance_required: bool,

    /// Which compliance areas apply when `compliance_required`.
    pub compliance_flags: ComplianceFlags,

    /// Explicit criticality override; otherwise derived from complexity.
    pub criticality_override: Option<Criticality>,
}

impl FeatureContext {
    /// Create a context with no requirements and no compliance demands.
    pub fn new(
        feature_name: impl Into<String>,
        feature_kind: impl Into<String>,
        complexity: Complexity,
    ) -> Self {
        Self {
            feature_name: feature_name.into(),
            feature_kind: feature_kind.into(),
            complexity,
            requirements: Vec::new(),
            compliance_required: false,
            compliance_flags: ComplianceFlags::default(),
            criticality_override: None,
        }
    }

    /// Set the requirement statements.
    pub fn with_requirements<S: Into<String>>(
        mut self,
        requirements: impl IntoIterator<Item = S>,
    ) -> Self {
        self.requirements = requirements.into_iter().map(Into::into).collect();
        self
    }

    /// Require compliance validation for the given areas.
    pub fn with_compliance(mut self, flags: ComplianceFlags) -> Self {
        self.compliance_required = true;
        self.compliance_flags = flags;
        self
    }

    /// Override the derived criticality.
    pub fn with_criticality(mut self, criticality: Criticality) -> Self {
        self.criticality_override = Some(criticality);
        self
    }
}

/// Context derived once per cycle and shared read-only across phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationContext {
    /// Feature under development.
    pub feature_name: String,

    /// Coarse category of the feature.
    pub feature_kind: String,

    /// Asserted implementation complexity.
    pub complexity: Complexity,

    /// Derived risk tier.
    pub criticality: Criticality,

    /// Ordered requirement statements.
    pub requirements: Vec<String>,

    /// Whether regulatory validation must run.
    pub compliance_required: bool,

    /// Which compliance areas apply.
    pub compliance_flags: ComplianceFlags,
}

impl OrchestrationContext {
    /// Derive the orchestration context from caller input.
    ///
    /// Criticality comes from the explicit override when supplied, else
    /// it mirrors the complexity tier.
    pub fn from_feature(feature: &FeatureContext) -> Self {
        let criticality = feature.criticality_override.unwrap_or(match feature.complexity {
            Complexity::Low => Criticality::Low,
            Complexity::Medium => Criticality::Medium,
            Complexity::High => Criticality::High,
        });

        Self {
            feature_name: feature.feature_name.clone(),
            feature_kind: feature.feature_kind.clone(),
            complexity: feature.complexity,
            criticality,
            requirements: feature.requirements.clone(),
            compliance_required: feature.compliance_required,
            compliance_flags: feature.compliance_flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criticality_derived_from_complexity() {
        let feature = FeatureContext::new("Telemetry ingest", "api-endpoint", Complexity::High);
        let ctx = OrchestrationContext::from_feature(&feature);
        assert_eq!(ctx.criticality, Criticality::High);
    }

    #[test]
    fn test_criticality_override_wins() {
        let feature = FeatureContext::new("Dosage calc", "calculation", Complexity::Low)
            .with_criticality(Criticality::Critical);
        let ctx = OrchestrationContext::from_feature(&feature);
        assert_eq!(ctx.criticality, Criticality::Critical);
        assert_eq!(ctx.complexity, Complexity::Low);
    }

    #[test]
    fn test_with_compliance_sets_required() {
        let feature = FeatureContext::new("Records export", "export", Complexity::Medium)
            .with_compliance(ComplianceFlags {
                data_protection: true,
                ..ComplianceFlags::default()
            });
        assert!(feature.compliance_required);
        assert!(feature.compliance_flags.data_protection);
    }
}
