//! RPC Method Handlers
//!
//! Translates JSON-RPC calls into `RunScriptService` calls and back.

use crate::error::{code, to_rpc_error};
use crate::types::{HealthResponse, RunScriptRequest, RunScriptResponse};
use cyborg_core::application::RunScriptService;
use cyborg_core::domain::SENTINEL_EXIT_CODE;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use tracing::error;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    service: Arc<RunScriptService>,
    start_time: std::time::Instant,
}

impl RpcHandler {
    pub fn new(service: Arc<RunScriptService>) -> Self {
        Self {
            service,
            start_time: std::time::Instant::now(),
        }
    }

    /// script.run.v1
    ///
    /// The run happens on its own task: a panic inside the core becomes an
    /// INTERNAL_ERROR response instead of taking the connection down.
    pub async fn run_script(
        &self,
        params: RunScriptRequest,
    ) -> Result<RunScriptResponse, ErrorObjectOwned> {
        let service = Arc::clone(&self.service);
        let script = params.script.clone();

        let joined = tokio::spawn(async move {
            service
                .run(params.script, params.args, params.timeout_ms)
                .await
        })
        .await;

        match joined {
            Ok(Ok(result)) => Ok(result.into()),
            Ok(Err(e)) => Err(to_rpc_error(e)),
            Err(join_err) => {
                error!(
                    script = %script,
                    error = %join_err,
                    "Script run task aborted"
                );
                Err(ErrorObjectOwned::owned(
                    code::INTERNAL_ERROR,
                    format!("script run aborted: {}", join_err),
                    None::<()>,
                ))
            }
        }
    }

    /// system.health.v1
    pub fn health(&self) -> Result<HealthResponse, ErrorObjectOwned> {
        let config = self.service.config();

        Ok(HealthResponse {
            status: "ok".to_string(),
            version: cyborg_core::VERSION.to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            default_timeout_ms: config.default_timeout_ms,
            max_timeout_ms: config.max_timeout_ms,
            sentinel_exit_code: SENTINEL_EXIT_CODE,
        })
    }
}
