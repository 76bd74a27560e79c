use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    New,
    Acknowledged,
    InProgress,
    Escalated,
    Resolved,
    Closed,
    Suppressed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Acknowledged => "acknowledged",
            Self::InProgress => "in_progress",
            Self::Escalated => "escalated",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Suppressed => "suppressed",
        }
    }

    /// Active alerts occupy the dedup key and can still escalate.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::New | Self::Acknowledged | Self::InProgress | Self::Escalated
        )
    }

    /// Resolved and closed alerts are frozen: no transitions, no notifications.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_statuses_hold_dedup_key() {
        assert!(Status::New.is_active());
        assert!(Status::Acknowledged.is_active());
        assert!(Status::InProgress.is_active());
        assert!(Status::Escalated.is_active());
    }

    #[test]
    fn suppressed_is_neither_active_nor_terminal() {
        assert!(!Status::Suppressed.is_active());
        assert!(!Status::Suppressed.is_terminal());
    }

    #[test]
    fn resolved_and_closed_are_terminal() {
        assert!(Status::Resolved.is_terminal());
        assert!(Status::Closed.is_terminal());
        assert!(!Status::Escalated.is_terminal());
    }
}
