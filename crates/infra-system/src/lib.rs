// Cyborg Infrastructure - System Adapters
// Implements: ScriptRunner

pub mod subprocess_runner;

pub use subprocess_runner::SubprocessScriptRunner;
