// Port Layer - Interfaces for external dependencies

pub mod auth;
pub mod code_runner;
pub mod id_provider; // For deterministic testing
pub mod maintenance;
pub mod project_repository;
pub mod run_job_repository;
pub mod share_repository;
pub mod snapshot_repository;
pub mod time_provider;
pub mod user_repository;

// Re-exports
pub use auth::{PasswordHasher, TokenService};
pub use code_runner::{
    CodeRunner, ExecutionError, ExecutionOutcome, ExecutionRequest, StageOutput,
};
pub use id_provider::{IdProvider, UuidProvider};
pub use maintenance::{Maintenance, MaintenanceConfig, MaintenanceStats};
pub use project_repository::ProjectRepository;
pub use run_job_repository::RunJobRepository;
pub use share_repository::ShareRepository;
pub use snapshot_repository::SnapshotRepository;
pub use time_provider::{SystemTimeProvider, TimeProvider};
pub use user_repository::UserRepository;
