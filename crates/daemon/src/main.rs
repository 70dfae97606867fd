//! Cyborg Runner - Main Entry Point
//! JSON-RPC script runner over TCP, or one request over stdin/stdout

mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;

// Import workspace crates
use cyborg_api_rpc::server::{RpcServerConfig, DEFAULT_RPC_HOST, DEFAULT_RPC_PORT};
use cyborg_api_rpc::{stdio, RpcServer};
use cyborg_core::application::RunScriptService;
use cyborg_core::port::time_provider::SystemTimeProvider;
use cyborg_core::RunnerConfig;
use cyborg_infra_system::SubprocessScriptRunner;
use logging::LogFormat;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Script runner daemon
///
/// Runner settings are read from CYBORG_TIMEOUT_MS, CYBORG_MAX_TIMEOUT_MS,
/// CYBORG_KILL_GRACE_MS and CYBORG_MAX_CONCURRENT.
#[derive(Parser, Debug)]
#[command(name = "cyborg-runner", version, about, long_about = None)]
struct Args {
    /// Address to bind the JSON-RPC server to
    #[arg(long, env = "CYBORG_RPC_HOST", default_value = DEFAULT_RPC_HOST)]
    host: String,

    /// Port to bind the JSON-RPC server to (0 = ephemeral)
    #[arg(long, env = "CYBORG_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    port: u16,

    /// Serve a single JSON-RPC request from stdin, write the response to stdout, exit
    #[arg(long)]
    stdio: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Initialize logging
    logging::init(LogFormat::from_env()).context("Failed to initialize logging")?;

    info!("Cyborg Runner v{} starting...", VERSION);

    // 2. Load configuration
    let config = RunnerConfig::from_env().context("Invalid runner configuration")?;
    info!(
        default_timeout_ms = config.default_timeout_ms,
        max_timeout_ms = config.max_timeout_ms,
        kill_grace_ms = config.kill_grace_ms,
        max_concurrent_runs = config.max_concurrent_runs,
        "Runner configuration loaded"
    );

    // 3. Setup dependencies (DI wiring)
    let runner = Arc::new(
        SubprocessScriptRunner::new(Arc::new(SystemTimeProvider))
            .with_kill_grace(Duration::from_millis(config.kill_grace_ms)),
    );
    let service = Arc::new(RunScriptService::new(runner, config));

    let rpc_server = RpcServer::new(
        RpcServerConfig {
            host: args.host,
            port: args.port,
        },
        service,
    );

    // 4. Serve
    if args.stdio {
        serve_stdio(rpc_server).await
    } else {
        serve_tcp(rpc_server).await
    }
}

/// Answer exactly one JSON-RPC message read from stdin
async fn serve_stdio(rpc_server: RpcServer) -> Result<()> {
    let module = rpc_server
        .build_module()
        .context("RPC module setup failed")?;

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read request from stdin")?;

    // Notifications get no reply
    let Some(response) = stdio::dispatch(&module, &input).await else {
        return Ok(());
    };

    let mut stdout = tokio::io::stdout();
    stdout.write_all(response.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;

    Ok(())
}

/// Run the TCP server until Ctrl+C
async fn serve_tcp(rpc_server: RpcServer) -> Result<()> {
    info!("Starting JSON-RPC server...");
    let (addr, rpc_handle) = rpc_server
        .start()
        .await
        .context("RPC server start failed")?;

    info!(addr = %addr, "System ready. Waiting for requests...");
    info!("Press Ctrl+C to shutdown");

    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    let _ = tokio::time::timeout(Duration::from_secs(5), rpc_handle.stopped()).await;

    info!("Shutdown complete.");

    Ok(())
}
