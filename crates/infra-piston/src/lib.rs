// CatalyX Infrastructure - Piston execution API
// Implements: CodeRunner

mod runner;

pub use runner::{PistonConfig, PistonRunner, DEFAULT_PISTON_URL, DEFAULT_TIMEOUT_SECS};
