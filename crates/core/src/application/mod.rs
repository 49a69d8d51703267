// Application Layer - Use Cases and Business Logic

pub mod auth;
pub mod maintenance;
pub mod project;
pub mod recovery;
pub mod run;
pub mod share;

// Re-exports
pub use auth::{AuthService, LoginOutcome};
pub use maintenance::MaintenanceScheduler;
pub use project::{ProjectService, SaveProject};
pub use recovery::RecoveryService;
pub use run::{RunFileResult, RunService};
pub use share::ShareService;
