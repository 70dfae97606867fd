//! Cyborg Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{HealthResponse, RunScriptRequest, RunScriptResponse};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cyborg Runner Client
///
/// Provides a high-level interface to run scripts on a Cyborg Runner daemon.
///
/// # Example
///
/// ```no_run
/// use cyborg_sdk::CyborgClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CyborgClient::connect("http://127.0.0.1:9527").await?;
/// # Ok(())
/// # }
/// ```
pub struct CyborgClient {
    client: HttpClient,
}

impl CyborgClient {
    /// Connect to Cyborg Runner daemon
    ///
    /// The HTTP request timeout is 30s; use `connect_with_timeout` when
    /// scripts may legitimately run longer than that.
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9527`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        Self::connect_with_timeout(url, DEFAULT_REQUEST_TIMEOUT).await
    }

    /// Connect with a custom HTTP request timeout
    pub async fn connect_with_timeout(url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(timeout)
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    /// Run a script with the daemon's default timeout
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use cyborg_sdk::CyborgClient;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = CyborgClient::connect("http://127.0.0.1:9527").await?;
    /// let response = client.run("/bin/ls", ["-l", "/tmp"]).await?;
    /// if response.is_sentinel() {
    ///     eprintln!("runner gave up: {}", response.stderr);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<I, S>(&self, script: impl Into<String>, args: I) -> Result<RunScriptResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(RunScriptRequest {
            script: script.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout_ms: None,
        })
        .await
    }

    /// Run a script with an explicit per-call timeout
    pub async fn run_with_timeout<I, S>(
        &self,
        script: impl Into<String>,
        args: I,
        timeout_ms: u64,
    ) -> Result<RunScriptResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(RunScriptRequest {
            script: script.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout_ms: Some(timeout_ms),
        })
        .await
    }

    /// Send a fully built request
    pub async fn send(&self, request: RunScriptRequest) -> Result<RunScriptResponse> {
        let mut params = ObjectParams::new();
        params.insert("script", &request.script)?;
        params.insert("args", &request.args)?;
        if let Some(timeout_ms) = request.timeout_ms {
            params.insert("timeout_ms", timeout_ms)?;
        }

        let response: RunScriptResponse = self.client.request("script.run.v1", params).await?;

        Ok(response)
    }

    /// Daemon liveness and effective settings
    pub async fn health(&self) -> Result<HealthResponse> {
        let response: HealthResponse = self
            .client
            .request("system.health.v1", ObjectParams::new())
            .await?;

        Ok(response)
    }
}
