use crate::alert::Severity;

use super::EscalationPolicy;

/// All configured policies, in declaration order. Lookup returns the
/// first policy whose severity set contains the given severity; the
/// declaration order is the documented tie-break when severity sets
/// overlap. A severity no policy covers gets no escalation at all.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: Vec<EscalationPolicy>,
}

impl PolicyRegistry {
    pub fn new(policies: Vec<EscalationPolicy>) -> Self {
        Self { policies }
    }

    pub fn lookup(&self, severity: Severity) -> Option<&EscalationPolicy> {
        self.policies.iter().find(|p| p.applies_to(severity))
    }

    pub fn policies(&self) -> &[EscalationPolicy] {
        &self.policies
    }
}
