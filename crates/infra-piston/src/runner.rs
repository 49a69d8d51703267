// Piston CodeRunner
//
// POST {base_url}/execute
//   {"language": "python3", "version": "*", "files": [{"name": "main.py", "content": "..."}]}

use async_trait::async_trait;
use catalyx_core::port::{CodeRunner, ExecutionError, ExecutionOutcome, ExecutionRequest};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_PISTON_URL: &str = "https://emkc.org/api/v2/piston";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct PistonConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for PistonConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PISTON_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Serialize)]
struct PistonFile<'a> {
    name: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct PistonRequest<'a> {
    language: &'a str,
    /// Latest installed runtime
    version: &'a str,
    files: Vec<PistonFile<'a>>,
}

pub struct PistonRunner {
    client: reqwest::Client,
    execute_url: String,
}

impl PistonRunner {
    pub fn new(config: PistonConfig) -> Result<Self, ExecutionError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            execute_url: format!("{}/execute", config.base_url.trim_end_matches('/')),
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ExecutionError {
    if err.is_timeout() {
        ExecutionError::Timeout
    } else if err.is_decode() {
        ExecutionError::BadResponse(err.to_string())
    } else {
        ExecutionError::Transport(err.to_string())
    }
}

/// Piston reports request errors as `{"message": "..."}`
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl CodeRunner for PistonRunner {
    async fn execute(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let body = PistonRequest {
            language: &request.language,
            version: "*",
            files: vec![PistonFile {
                name: &request.file_name,
                content: &request.content,
            }],
        };

        debug!(language = %request.language, file = %request.file_name, "Sending code to Piston");

        let response = self
            .client
            .post(&self.execute_url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = upstream_message(&text);
            warn!(status = %status, message = %message, "Piston rejected execution");
            return Err(ExecutionError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await.map_err(map_reqwest_error)?;
        serde_json::from_str::<ExecutionOutcome>(&text)
            .map_err(|e| ExecutionError::BadResponse(e.to_string()))
    }
}
