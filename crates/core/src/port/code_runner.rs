// Code Runner Port
// Abstraction over the remote execution service

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single-file execution request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Runtime name understood by the execution service (e.g. `python3`)
    pub language: String,
    /// File name the source is written to (Java needs `<Class>.java`)
    pub file_name: String,
    pub content: String,
}

/// Output of one stage (compile or run)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutput {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    /// Interleaved stdout/stderr
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub signal: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub compile: Option<StageOutput>,
    #[serde(default)]
    pub run: Option<StageOutput>,
}

/// Execution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Execution timeout - code took too long to run")]
    Timeout,

    #[error("Execution service unreachable: {0}")]
    Transport(String),

    #[error("Execution service returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid response from execution service: {0}")]
    BadResponse(String),
}

#[async_trait]
pub trait CodeRunner: Send + Sync {
    /// Execute one file and return the raw stage outputs
    async fn execute(&self, request: &ExecutionRequest)
        -> Result<ExecutionOutcome, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock runner behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Return this outcome
        Outcome(ExecutionOutcome),
        /// Fail with this error
        Fail(ExecutionError),
    }

    /// Mock Code Runner recording every request
    pub struct MockCodeRunner {
        behavior: Arc<Mutex<MockBehavior>>,
        requests: Arc<Mutex<Vec<ExecutionRequest>>>,
    }

    impl MockCodeRunner {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Run stage printing `stdout`
        pub fn new_stdout(stdout: impl Into<String>) -> Self {
            let stdout = stdout.into();
            Self::new(MockBehavior::Outcome(ExecutionOutcome {
                language: "mock".to_string(),
                version: "1.0.0".to_string(),
                compile: None,
                run: Some(StageOutput {
                    output: stdout.clone(),
                    stdout,
                    code: Some(0),
                    ..Default::default()
                }),
            }))
        }

        pub fn new_outcome(outcome: ExecutionOutcome) -> Self {
            Self::new(MockBehavior::Outcome(outcome))
        }

        pub fn new_fail(error: ExecutionError) -> Self {
            Self::new(MockBehavior::Fail(error))
        }

        pub fn set_behavior(&self, behavior: MockBehavior) {
            *self.behavior.lock().unwrap() = behavior;
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn last_request(&self) -> Option<ExecutionRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl CodeRunner for MockCodeRunner {
        async fn execute(
            &self,
            request: &ExecutionRequest,
        ) -> Result<ExecutionOutcome, ExecutionError> {
            self.requests.lock().unwrap().push(request.clone());

            let behavior = self.behavior.lock().unwrap().clone();
            match behavior {
                MockBehavior::Outcome(outcome) => Ok(outcome),
                MockBehavior::Fail(err) => Err(err),
            }
        }
    }
}
