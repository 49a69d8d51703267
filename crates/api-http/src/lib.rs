//! CatalyX HTTP API
//!
//! axum REST surface over the application services. Every response uses
//! the `{ "success": bool, "msg": string, ...data }` envelope.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use rate_limiter::RequestRateLimiter;
pub use server::{build_router, serve, AppState, ServerConfig};
