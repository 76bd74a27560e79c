pub mod action;
pub mod registry;

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::alert::Severity;
use crate::channel::ChannelKind;
use crate::error::DomainError;
use crate::ids::PolicyId;

pub use action::EscalationAction;
pub use registry::PolicyRegistry;

/// Escalation schedule for a set of severities. Level 0 is the initial
/// notification at creation; levels 1..=max fire on their time threshold,
/// measured from the alert's creation timestamp. Loaded once at startup,
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationPolicy {
    id: PolicyId,
    name: String,
    severities: Vec<Severity>,
    time_thresholds: BTreeMap<u32, u64>,
    channels: BTreeMap<u32, Vec<ChannelKind>>,
    actions: BTreeMap<u32, EscalationAction>,
    max_escalation_level: u32,
    auto_resolve_after: Option<u64>,
}

impl EscalationPolicy {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        severities: Vec<Severity>,
        time_thresholds: BTreeMap<u32, u64>,
        channels: BTreeMap<u32, Vec<ChannelKind>>,
        actions: BTreeMap<u32, EscalationAction>,
        max_escalation_level: u32,
        auto_resolve_after: Option<u64>,
    ) -> Result<Self, DomainError> {
        if severities.is_empty() {
            return Err(DomainError::PolicyRequiresSeverity);
        }
        if let Some(&level) = time_thresholds
            .keys()
            .find(|&&l| l == 0 || l > max_escalation_level)
        {
            return Err(DomainError::ThresholdOutOfRange(level));
        }
        Ok(Self {
            id: PolicyId::new(),
            name,
            severities,
            time_thresholds,
            channels,
            actions,
            max_escalation_level,
            auto_resolve_after,
        })
    }

    pub fn applies_to(&self, severity: Severity) -> bool {
        self.severities.contains(&severity)
    }

    /// Channels for the level-0 fan-out at creation.
    pub fn initial_channels(&self) -> &[ChannelKind] {
        self.channels_at(0)
    }

    pub fn channels_at(&self, level: u32) -> &[ChannelKind] {
        self.channels.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn threshold(&self, level: u32) -> Option<Duration> {
        self.time_thresholds
            .get(&level)
            .map(|&secs| Duration::seconds(secs as i64))
    }

    pub fn action_at(&self, level: u32) -> Option<EscalationAction> {
        self.actions.get(&level).copied()
    }

    /// Levels to arm timers for, ascending: every level in
    /// 1..=max_escalation_level with a declared threshold.
    pub fn scheduled_levels(&self) -> impl Iterator<Item = (u32, Duration)> + '_ {
        self.time_thresholds
            .iter()
            .map(|(&level, &secs)| (level, Duration::seconds(secs as i64)))
    }

    pub fn auto_resolve_after(&self) -> Option<Duration> {
        self.auto_resolve_after
            .map(|secs| Duration::seconds(secs as i64))
    }

    pub fn id(&self) -> PolicyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn severities(&self) -> &[Severity] {
        &self.severities
    }

    pub fn max_escalation_level(&self) -> u32 {
        self.max_escalation_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_policy() -> EscalationPolicy {
        EscalationPolicy::new(
            "standard".into(),
            vec![Severity::Critical, Severity::High],
            BTreeMap::from([(1, 300), (2, 900)]),
            BTreeMap::from([
                (0, vec![ChannelKind::Email]),
                (1, vec![ChannelKind::Slack, ChannelKind::Email]),
                (2, vec![ChannelKind::Discord, ChannelKind::Sms]),
            ]),
            BTreeMap::from([
                (1, EscalationAction::NotifyNextLevel),
                (2, EscalationAction::EscalateManager),
            ]),
            2,
            Some(86_400),
        )
        .unwrap()
    }

    #[test]
    fn policy_requires_a_severity() {
        let result = EscalationPolicy::new(
            "empty".into(),
            vec![],
            BTreeMap::new(),
            BTreeMap::new(),
            BTreeMap::new(),
            3,
            None,
        );
        assert!(matches!(result, Err(DomainError::PolicyRequiresSeverity)));
    }

    #[test]
    fn threshold_for_level_zero_rejected() {
        let result = EscalationPolicy::new(
            "bad".into(),
            vec![Severity::High],
            BTreeMap::from([(0, 60)]),
            BTreeMap::new(),
            BTreeMap::new(),
            3,
            None,
        );
        assert!(matches!(result, Err(DomainError::ThresholdOutOfRange(0))));
    }

    #[test]
    fn threshold_beyond_max_level_rejected() {
        let result = EscalationPolicy::new(
            "bad".into(),
            vec![Severity::High],
            BTreeMap::from([(4, 60)]),
            BTreeMap::new(),
            BTreeMap::new(),
            3,
            None,
        );
        assert!(matches!(result, Err(DomainError::ThresholdOutOfRange(4))));
    }

    #[test]
    fn applies_to_listed_severities_only() {
        let policy = standard_policy();
        assert!(policy.applies_to(Severity::Critical));
        assert!(policy.applies_to(Severity::High));
        assert!(!policy.applies_to(Severity::Low));
    }

    #[test]
    fn scheduled_levels_ascend_with_thresholds() {
        let policy = standard_policy();
        let levels: Vec<_> = policy.scheduled_levels().collect();
        assert_eq!(
            levels,
            vec![
                (1, Duration::seconds(300)),
                (2, Duration::seconds(900)),
            ]
        );
    }

    #[test]
    fn channels_at_unknown_level_is_empty() {
        let policy = standard_policy();
        assert_eq!(policy.initial_channels(), &[ChannelKind::Email]);
        assert!(policy.channels_at(7).is_empty());
    }

    #[test]
    fn action_lookup_per_level() {
        let policy = standard_policy();
        assert_eq!(policy.action_at(2), Some(EscalationAction::EscalateManager));
        assert_eq!(policy.action_at(0), None);
    }

    #[test]
    fn auto_resolve_delay_exposed_as_duration() {
        let policy = standard_policy();
        assert_eq!(policy.auto_resolve_after(), Some(Duration::seconds(86_400)));
    }
}
