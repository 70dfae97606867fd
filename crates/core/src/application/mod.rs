// Application Layer - Use Cases

pub mod run_script;

// Re-exports
pub use run_script::RunScriptService;
