use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Extra side effect a policy attaches to an escalation level, beyond the
/// channel fan-out. Dispatched by label; failures are logged, not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationAction {
    /// Placeholder: the level's notification fan-out already happened.
    NotifyNextLevel,
    EscalateManager,
    CallOnDuty,
    TriggerPaging,
    SmsBroadcast,
    AutoResolve,
}

impl EscalationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotifyNextLevel => "notify_next_level",
            Self::EscalateManager => "escalate_manager",
            Self::CallOnDuty => "call_on_duty",
            Self::TriggerPaging => "trigger_paging",
            Self::SmsBroadcast => "sms_broadcast",
            Self::AutoResolve => "auto_resolve",
        }
    }
}

impl fmt::Display for EscalationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EscalationAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notify_next_level" => Ok(Self::NotifyNextLevel),
            "escalate_manager" => Ok(Self::EscalateManager),
            "call_on_duty" => Ok(Self::CallOnDuty),
            "trigger_paging" => Ok(Self::TriggerPaging),
            "sms_broadcast" => Ok(Self::SmsBroadcast),
            "auto_resolve" => Ok(Self::AutoResolve),
            other => Err(DomainError::UnknownAction(other.into())),
        }
    }
}
