// Domain Layer - Pure business logic and entities

pub mod error;
pub mod file_tree;
pub mod language;
pub mod project;
pub mod run_job;
pub mod share;
pub mod snapshot;
pub mod user;

// Re-exports
pub use error::DomainError;
pub use file_tree::{FileNode, FileTree, FlatFile, NodeKind};
pub use language::{editor_language, ProjectLanguage, PreviewKind, RunTarget};
pub use project::{Project, ProjectId, ProjectSummary};
pub use run_job::{JobId, RunJob, RunStatus, DEFAULT_ENTRY_POINT};
pub use share::{
    is_valid_share_id, random_share_id, Share, ShareView, SHARE_ID_LEN, SHARE_TTL_MS,
};
pub use snapshot::RunSnapshot;
pub use user::{normalize_email, User, UserId, UserProfile};
