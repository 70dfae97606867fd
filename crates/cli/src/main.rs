//! Cyborg CLI - Command-line interface for Cyborg Runner

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Write;
use std::time::Instant;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9527";

/// Exit code the daemon uses when it, not the script, decided the outcome
const SENTINEL_EXIT_CODE: i32 = -1;

#[derive(Parser)]
#[command(name = "cyborg")]
#[command(about = "Cyborg Runner CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "CYBORG_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script on the daemon and relay its output and exit code
    Run {
        /// Per-call timeout in milliseconds (daemon default if omitted)
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Print a summary table after the output
        #[arg(short, long)]
        summary: bool,

        /// Script path followed by its arguments
        ///
        /// Everything after the script is passed verbatim (no shell), even
        /// values that look like flags of this command. Put `run` options
        /// before the script.
        #[arg(
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "SCRIPT [ARGS]..."
        )]
        command: Vec<String>,
    },

    /// Show daemon status
    Status,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize)]
struct RunResult {
    stdout: String,
    stderr: String,
    returncode: i32,
}

#[derive(Tabled)]
struct RunSummary {
    script: String,
    returncode: i32,
    stdout_bytes: usize,
    stderr_bytes: usize,
    elapsed_ms: u128,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

/// Map a script's returncode onto this process's exit status
fn process_exit_code(returncode: i32) -> i32 {
    match returncode {
        0..=255 => returncode,
        _ => 1,
    }
}

/// Split `run`'s trailing values into script and arguments
fn split_command(command: &[String]) -> Result<(&str, &[String])> {
    match command.split_first() {
        Some((script, args)) => Ok((script.as_str(), args)),
        None => anyhow::bail!("missing script"),
    }
}

fn run_params(script: &str, args: &[String], timeout_ms: Option<u64>) -> serde_json::Value {
    let mut params = json!({
        "script": script,
        "args": args,
    });
    if let Some(timeout_ms) = timeout_ms {
        params["timeout_ms"] = json!(timeout_ms);
    }
    params
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            timeout_ms,
            summary,
            command,
        } => {
            let (script, args) = split_command(&command)?;
            let started = Instant::now();
            let result = call_rpc(
                &cli.rpc_url,
                "script.run.v1",
                run_params(script, args, timeout_ms),
            )
            .await?;
            let run: RunResult = serde_json::from_value(result)?;
            let elapsed_ms = started.elapsed().as_millis();

            print!("{}", run.stdout);
            std::io::stdout().flush()?;
            eprint!("{}", run.stderr);

            if run.returncode == SENTINEL_EXIT_CODE {
                eprintln!();
                eprintln!("{}", "✗ Runner could not obtain an exit status".red().bold());
            }

            if summary {
                println!();
                let table = Table::new(vec![RunSummary {
                    script: script.to_string(),
                    returncode: run.returncode,
                    stdout_bytes: run.stdout.len(),
                    stderr_bytes: run.stderr.len(),
                    elapsed_ms,
                }])
                .to_string();
                println!("{}", table);
            }

            std::process::exit(process_exit_code(run.returncode));
        }

        Commands::Status => {
            println!("{}", "System Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "system.health.v1", json!({})).await {
                Ok(health) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!("  {} {}", "Version:".bold(), health["version"]);
                    println!(
                        "  {} {} ms",
                        "Default timeout:".bold(),
                        health["default_timeout_ms"]
                    );
                    println!("  {} {} ms", "Max timeout:".bold(), health["max_timeout_ms"]);
                    println!("  {} {} seconds", "Uptime:".bold(), health["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
