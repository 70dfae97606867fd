// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Command must not be empty")]
    EmptyCommand,

    #[error("Timeout must be a positive number of milliseconds")]
    NonPositiveTimeout,
}

pub type Result<T> = std::result::Result<T, DomainError>;
