//! CatalyX SDK - Rust Client Library
//!
//! Typed client for the CatalyX IDE backend plus an editor session that keeps
//! a local copy of a project's file tree and autosaves edits.
//!
//! # Example
//!
//! ```no_run
//! use catalyx_sdk::{CatalyxClient, EditorSession};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CatalyxClient::new("http://127.0.0.1:8080")?;
//!     let login = client.login("ada@example.com", "secret").await?;
//!     let client = Arc::new(client.with_token(login.token));
//!
//!     let created = client.create_project("hello", None, Some("python")).await?;
//!     let session = EditorSession::open(client, &created.project_id).await?;
//!     session.edit("print('hello')").await;
//!
//!     let result = session.run().await?;
//!     println!("{}", result.output);
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

mod client;
mod debounce;
mod error;
mod session;
mod types;

pub use client::{CatalyxClient, RunUpdate, SaveRequest, DEFAULT_TIMEOUT};
pub use debounce::Debouncer;
pub use error::{Result, SdkError};
pub use session::{EditorSession, SessionState, AUTOSAVE_DELAY};
pub use types::{
    AddNodeResponse, CreateJobResponse, CreateProjectResponse, JobList, JobResponse, LoginResponse,
    LoginUser, ProjectList, ProjectResponse, RunFileResponse, ShareList, ShareResponse,
    SnapshotList, SnapshotResponse, UserResponse,
};
