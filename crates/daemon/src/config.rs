//! Server configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `CATALYX__SECTION__KEY` environment variables.

use anyhow::{Context, Result};
use catalyx_api_http::ServerConfig;
use catalyx_core::port::MaintenanceConfig;
use catalyx_infra_piston::PistonConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Placeholder secret; the server warns when it is still in use
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";
pub const DEFAULT_CONFIG_FILE: &str = "catalyx";
const DEFAULT_DB_PATH: &str = "~/.catalyx/catalyx.db";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub auth: AuthSection,
    pub piston: PistonSection,
    pub rate_limit: RateLimitSection,
    pub maintenance: MaintenanceSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub frontend_url: Option<String>,
    pub body_limit_mb: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSection {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSection {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PistonSection {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSection {
    pub burst: u32,
    pub per_second: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceSection {
    pub interval_hours: u64,
    pub run_retention_days: i64,
    pub max_db_size_mb: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSection {
    pub format: LogFormat,
    /// Daily-rolling log files are written here when set
    pub dir: Option<String>,
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>> {
    let builder = Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("server.body_limit_mb", 10)?
        .set_default("database.path", DEFAULT_DB_PATH)?
        .set_default("auth.jwt_secret", DEFAULT_JWT_SECRET)?
        .set_default("auth.token_ttl_days", catalyx_infra_auth::DEFAULT_TOKEN_TTL_DAYS)?
        .set_default("piston.base_url", catalyx_infra_piston::DEFAULT_PISTON_URL)?
        .set_default("piston.timeout_secs", catalyx_infra_piston::DEFAULT_TIMEOUT_SECS)?
        .set_default("rate_limit.burst", 200)?
        .set_default("rate_limit.per_second", 100)?
        .set_default("maintenance.interval_hours", 24)?
        .set_default("maintenance.run_retention_days", 30)?
        .set_default("maintenance.max_db_size_mb", 1000.0)?
        .set_default("log.format", "pretty")?;
    Ok(builder)
}

impl Settings {
    /// Load settings. `path` is an explicit config file (must exist);
    /// without it `catalyx.toml` in the working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = with_defaults()?
            .add_source(file)
            .add_source(Environment::with_prefix("CATALYX").separator("__"))
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;
        Ok(settings)
    }

    /// Defaults overlaid with an inline TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings: Settings = with_defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;
        Ok(settings)
    }

    /// Database URL with `~` expanded
    pub fn database_url(&self) -> String {
        let path = self.database.path.trim();
        if path.starts_with("sqlite:") {
            return path.to_string();
        }
        shellexpand::tilde(path).into_owned()
    }

    pub fn uses_default_secret(&self) -> bool {
        self.auth.jwt_secret == DEFAULT_JWT_SECRET
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            frontend_url: self.server.frontend_url.clone(),
            body_limit_mb: self.server.body_limit_mb,
            rate_limit_burst: self.rate_limit.burst,
            rate_limit_per_second: self.rate_limit.per_second,
        }
    }

    pub fn piston_config(&self) -> PistonConfig {
        PistonConfig {
            base_url: self.piston.base_url.clone(),
            timeout: Duration::from_secs(self.piston.timeout_secs.max(1)),
        }
    }

    pub fn maintenance_config(&self) -> MaintenanceConfig {
        MaintenanceConfig {
            run_retention_days: self.maintenance.run_retention_days,
            max_db_size_mb: self.maintenance.max_db_size_mb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.body_limit_mb, 10);
        assert_eq!(settings.auth.token_ttl_days, 7);
        assert_eq!(settings.piston.timeout_secs, 30);
        assert_eq!(settings.log.format, LogFormat::Pretty);
        assert!(settings.server.frontend_url.is_none());
        assert!(settings.uses_default_secret());

        let maintenance = settings.maintenance_config();
        assert_eq!(maintenance.run_retention_days, 30);
    }

    #[test]
    fn test_file_overrides() {
        let settings = Settings::from_toml_str(
            r#"
            [server]
            port = 5000
            frontend_url = "https://ide.example.com"

            [auth]
            jwt_secret = "s3cret"

            [log]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.log.format, LogFormat::Json);
        assert!(!settings.uses_default_secret());

        let server = settings.server_config();
        assert_eq!(server.frontend_url.as_deref(), Some("https://ide.example.com"));
        assert_eq!(server.rate_limit_burst, 200);
    }

    #[test]
    fn test_database_url_expands_home() {
        let settings = Settings::from_toml_str("[database]\npath = \"~/data/ide.db\"").unwrap();
        let url = settings.database_url();
        assert!(!url.starts_with('~'));
        assert!(url.ends_with("data/ide.db"));

        let settings =
            Settings::from_toml_str("[database]\npath = \"sqlite::memory:\"").unwrap();
        assert_eq!(settings.database_url(), "sqlite::memory:");
    }

    #[test]
    fn test_invalid_log_format_rejected() {
        assert!(Settings::from_toml_str("[log]\nformat = \"xml\"").is_err());
    }
}
