//! Cyborg SDK - Rust Client Library
//!
//! Provides a convenient client for running scripts through a Cyborg Runner
//! daemon.
//!
//! # Example
//!
//! ```no_run
//! use cyborg_sdk::CyborgClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to daemon
//!     let client = CyborgClient::connect("http://127.0.0.1:9527").await?;
//!
//!     // Run a script; arguments are passed verbatim, never through a shell
//!     let response = client.run("/usr/bin/printf", ["%s\\n", "a b"]).await?;
//!
//!     println!("exit code: {}", response.returncode);
//!     print!("{}", response.stdout);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::CyborgClient;
pub use error::{Result, SdkError};
pub use types::{HealthResponse, RunScriptRequest, RunScriptResponse, SENTINEL_EXIT_CODE};
