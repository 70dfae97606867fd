//! JSON-RPC Server
//!
//! Serves the script runner as JSON-RPC 2.0 over HTTP/WebSocket on TCP.

use crate::handler::RpcHandler;
use crate::types::RunScriptRequest;
use cyborg_core::application::RunScriptService;
use cyborg_core::error::{AppError, Result};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9527;

/// Method names
pub mod method {
    pub const RUN_SCRIPT: &str = "script.run.v1";
    /// Name used by the earlier stdio adapters
    pub const RUN_SCRIPT_ALIAS: &str = "run";
    pub const HEALTH: &str = "system.health.v1";
}

/// RPC Server Configuration
pub struct RpcServerConfig {
    pub host: String,
    /// 0 picks an ephemeral port
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, service: Arc<RunScriptService>) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(service)),
        }
    }

    /// Register all methods on a fresh module
    ///
    /// Shared by the TCP server and the stdio dispatcher.
    pub fn build_module(&self) -> Result<RpcModule<()>> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method(method::RUN_SCRIPT, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RunScriptRequest = params.parse()?;
                    handler.run_script(req).await
                }
            })
            .map_err(registration_error)?;

        module
            .register_alias(method::RUN_SCRIPT_ALIAS, method::RUN_SCRIPT)
            .map_err(registration_error)?;

        let handler = self.handler.clone();
        module
            .register_method(method::HEALTH, move |_, _, _| handler.health())
            .map_err(registration_error)?;

        Ok(module)
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the bound address (useful with port 0) and the handle used to
    /// stop the server.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP"
        );

        let server = Server::builder().build(&addr).await?;
        let local_addr = server.local_addr()?;

        let module = self.build_module()?;

        info!(addr = %local_addr, "JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok((local_addr, handle))
    }
}

fn registration_error(err: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("RPC method registration failed: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyborg_core::port::script_runner::mocks::MockScriptRunner;
    use cyborg_core::RunnerConfig;

    fn server() -> RpcServer {
        let service = Arc::new(RunScriptService::new(
            Arc::new(MockScriptRunner::new_echo()),
            RunnerConfig::default(),
        ));
        RpcServer::new(
            RpcServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            service,
        )
    }

    #[test]
    fn test_module_registers_all_methods() {
        let module = server().build_module().unwrap();
        let names: Vec<&str> = module.method_names().collect();

        assert!(names.contains(&method::RUN_SCRIPT));
        assert!(names.contains(&method::RUN_SCRIPT_ALIAS));
        assert!(names.contains(&method::HEALTH));
    }

    #[tokio::test]
    async fn test_start_on_ephemeral_port() {
        let (addr, handle) = server().start().await.unwrap();

        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);

        handle.stop().unwrap();
        handle.stopped().await;
    }

    #[tokio::test]
    async fn test_start_on_taken_port_is_io_error() {
        let (addr, handle) = server().start().await.unwrap();

        let service = Arc::new(RunScriptService::new(
            Arc::new(MockScriptRunner::new_echo()),
            RunnerConfig::default(),
        ));
        let second = RpcServer::new(
            RpcServerConfig {
                host: addr.ip().to_string(),
                port: addr.port(),
            },
            service,
        );

        let err = second.start().await.unwrap_err();
        assert!(matches!(err, AppError::Io(_)), "unexpected error: {}", err);

        handle.stop().unwrap();
        handle.stopped().await;
    }
}
