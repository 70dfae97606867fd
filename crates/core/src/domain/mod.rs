// Domain Layer - Pure execution model

pub mod error;
pub mod execution;

// Re-exports
pub use error::DomainError;
pub use execution::{
    ExecutionOutcome, ExecutionRequest, ExecutionResult, ExecutionTimeout, DEFAULT_TIMEOUT_MS,
    SENTINEL_EXIT_CODE,
};
