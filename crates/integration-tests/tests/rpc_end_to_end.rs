//! End-to-End RPC Tests
//!
//! Full flow: SDK client -> JSON-RPC server -> RunScriptService -> real subprocess

#![cfg(unix)]

use cyborg_api_rpc::server::RpcServerConfig;
use cyborg_api_rpc::RpcServer;
use cyborg_core::application::RunScriptService;
use cyborg_core::port::time_provider::SystemTimeProvider;
use cyborg_core::RunnerConfig;
use cyborg_infra_system::SubprocessScriptRunner;
use cyborg_sdk::{CyborgClient, SdkError, SENTINEL_EXIT_CODE};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::HttpClientBuilder;
use jsonrpsee::rpc_params;
use jsonrpsee::server::ServerHandle;
use std::sync::Arc;
use std::time::{Duration, Instant};

async fn setup_test_system(config: RunnerConfig) -> (String, ServerHandle) {
    let runner = Arc::new(SubprocessScriptRunner::new(Arc::new(SystemTimeProvider)));
    let service = Arc::new(RunScriptService::new(runner, config));

    let server = RpcServer::new(
        RpcServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        service,
    );
    let (addr, handle) = server.start().await.unwrap();

    (format!("http://{}", addr), handle)
}

#[tokio::test]
async fn test_e2e_run_success() {
    let (url, handle) = setup_test_system(RunnerConfig::default()).await;
    let client = CyborgClient::connect(&url).await.unwrap();

    let response = client
        .run("sh", ["-c", "echo out; echo err >&2; exit 4"])
        .await
        .unwrap();

    assert_eq!(response.stdout, "out\n");
    assert_eq!(response.stderr, "err\n");
    assert_eq!(response.returncode, 4);
    assert!(!response.is_sentinel());

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_e2e_arguments_are_not_shell_expanded() {
    let (url, handle) = setup_test_system(RunnerConfig::default()).await;
    let client = CyborgClient::connect(&url).await.unwrap();

    let response = client
        .run("printf", ["%s\\n", "a b", "$(echo x)", "$HOME", "|", "&&"])
        .await
        .unwrap();

    assert_eq!(response.returncode, 0);
    assert_eq!(response.stdout, "a b\n$(echo x)\n$HOME\n|\n&&\n");

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_e2e_timeout_returns_sentinel() {
    let (url, handle) = setup_test_system(RunnerConfig::default()).await;
    let client = CyborgClient::connect(&url).await.unwrap();

    let started = Instant::now();
    let response = client
        .run_with_timeout("sleep", ["10"], 300)
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(response.returncode, SENTINEL_EXIT_CODE);
    assert_eq!(response.stderr, "Script timed out after 300 ms");
    assert_eq!(response.stdout, "");
    assert!(
        elapsed < Duration::from_millis(300 + 1500),
        "took {:?}",
        elapsed
    );

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_e2e_default_timeout_from_config() {
    let config = RunnerConfig {
        default_timeout_ms: 250,
        ..Default::default()
    };
    let (url, handle) = setup_test_system(config).await;
    let client = CyborgClient::connect(&url).await.unwrap();

    let response = client.run("sleep", ["10"]).await.unwrap();

    assert_eq!(response.stderr, "Script timed out after 250 ms");
    assert!(response.is_sentinel());

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_e2e_missing_script_is_response_not_error() {
    let (url, handle) = setup_test_system(RunnerConfig::default()).await;
    let client = CyborgClient::connect(&url).await.unwrap();

    let response = client
        .run("/nonexistent/cyborg/script.sh", ["--flag"])
        .await
        .unwrap();

    assert_eq!(response.returncode, SENTINEL_EXIT_CODE);
    assert!(!response.stderr.is_empty());
    assert_eq!(response.stdout, "");

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_e2e_invalid_requests_are_rpc_errors() {
    let (url, handle) = setup_test_system(RunnerConfig::default()).await;
    let client = CyborgClient::connect(&url).await.unwrap();

    let err = client.run("", Vec::<String>::new()).await.unwrap_err();
    assert!(err.is_validation(), "unexpected error: {}", err);

    let err = client
        .run_with_timeout("echo", ["x"], 0)
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Rpc { code: 4000, .. }));

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_e2e_legacy_run_alias_and_positional_params() {
    let (url, handle) = setup_test_system(RunnerConfig::default()).await;
    let client = HttpClientBuilder::default().build(&url).unwrap();

    let mut params = ObjectParams::new();
    params.insert("script", "echo").unwrap();
    params.insert("args", vec!["legacy"]).unwrap();
    let response: serde_json::Value = client.request("run", params).await.unwrap();
    assert_eq!(response["stdout"], "legacy\n");
    assert_eq!(response["returncode"], 0);

    let response: serde_json::Value = client
        .request("script.run.v1", rpc_params!["echo", vec!["positional"]])
        .await
        .unwrap();
    assert_eq!(response["stdout"], "positional\n");

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_e2e_health() {
    let (url, handle) = setup_test_system(RunnerConfig::default()).await;
    let client = CyborgClient::connect(&url).await.unwrap();

    let health = client.health().await.unwrap();

    assert_eq!(health.status, "ok");
    assert_eq!(health.default_timeout_ms, 3000);
    assert_eq!(health.sentinel_exit_code, SENTINEL_EXIT_CODE);

    handle.stop().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_e2e_fifty_concurrent_calls_are_independent() {
    let (url, handle) = setup_test_system(RunnerConfig::default()).await;
    let client = Arc::new(CyborgClient::connect(&url).await.unwrap());

    let calls = (0..50).map(|i| {
        let client = Arc::clone(&client);
        async move {
            let script = format!("echo task-{}; echo diag-{} >&2; exit {}", i, i, i % 5);
            let response = client.run("sh", ["-c", script.as_str()]).await.unwrap();
            (i, response)
        }
    });

    let results = futures::future::join_all(calls).await;

    assert_eq!(results.len(), 50);
    for (i, response) in results {
        assert_eq!(response.stdout, format!("task-{}\n", i));
        assert_eq!(response.stderr, format!("diag-{}\n", i));
        assert_eq!(response.returncode, i % 5);
    }

    handle.stop().unwrap();
}
