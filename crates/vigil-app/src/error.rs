use thiserror::Error;

use vigil_core::error::DomainError;
use vigil_ports::error::PortError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("port error: {0}")]
    Port(#[from] PortError),
}
