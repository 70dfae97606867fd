// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Script outcomes (non-zero exit, timeout, launch failure) never appear
/// here; they travel as `ExecutionResult` data. These variants cover caller
/// mistakes and faults of the runner host itself.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
