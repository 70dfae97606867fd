// Port Layer - Interfaces for external dependencies

pub mod script_runner;
pub mod time_provider;

// Re-exports
pub use script_runner::ScriptRunner;
pub use time_provider::TimeProvider;
