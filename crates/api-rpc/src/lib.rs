//! JSON-RPC API Layer
//!
//! Exposes the script runner as JSON-RPC 2.0 methods, over TCP or a single
//! request on stdin/stdout.

pub mod error;
pub mod handler;
pub mod server;
pub mod stdio;
pub mod types;

pub use server::RpcServer;
