use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("alert is already resolved")]
    AlertAlreadyResolved,
    #[error("alert is closed")]
    AlertClosed,
    #[error("alert is not resolved")]
    AlertNotResolved,
    #[error("alert is suppressed")]
    AlertSuppressed,
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("policy applies to no severity")]
    PolicyRequiresSeverity,
    #[error("escalation threshold declared for level {0}, outside 1..=max_escalation_level")]
    ThresholdOutOfRange(u32),
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
    #[error("unknown escalation action: {0}")]
    UnknownAction(String),
}
