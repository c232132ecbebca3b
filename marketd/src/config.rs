//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The file path defaults to `config.yaml` and can be set via
//! the `-f` flag or the `MARKETD_CONFIG` environment variable.
//!
//! Sources are merged in order (later overrides earlier):
//!
//! 1. **YAML config file** - base configuration
//! 2. **Environment variables** - `MARKETD_` prefix, `__` for nesting
//!    (e.g. `MARKETD_AUTH__ACCESS_TOKEN_SECRET=...`,
//!    `MARKETD_DATABASE__TYPE=memory`)
//!
//! Token TTLs use humantime syntax (`1h`, `7d`, `90m`).

use std::time::Duration;

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "MARKETD_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Record store backing the API - in-memory or external PostgreSQL
    pub database: DatabaseConfig,
    /// Token and session settings
    pub auth: AuthConfig,
    /// CORS settings for browser clients on other origins
    pub cors: CorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseConfig {
    /// In-memory store; data is lost on shutdown. Development only.
    #[default]
    Memory,
    /// External PostgreSQL database.
    Postgres { url: String },
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Secret for signing access tokens (required, must differ from the
    /// refresh secret)
    pub access_token_secret: String,
    /// Secret for signing refresh tokens (required)
    pub refresh_token_secret: String,
    /// Access token lifetime (humantime syntax)
    #[serde(with = "humantime_serde")]
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (humantime syntax)
    #[serde(with = "humantime_serde")]
    pub refresh_token_ttl: Duration,
    /// Set the `Secure` attribute on session cookies (enable behind HTTPS)
    pub cookie_secure: bool,
    /// Password length bounds enforced at registration and password change
    pub password: PasswordConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: String::new(),
            refresh_token_secret: String::new(),
            access_token_ttl: Duration::from_secs(60 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            cookie_secure: false,
            password: PasswordConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Origins allowed to call the API with credentials. Empty means no
    /// CORS layer is installed (same-origin deployments).
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from file and environment, then validate it.
    pub fn load(args: &Args) -> anyhow::Result<Self> {
        let config: Config = Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("MARKETD_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.auth.access_token_secret.is_empty() {
            anyhow::bail!("auth.access_token_secret must be set");
        }
        if self.auth.refresh_token_secret.is_empty() {
            anyhow::bail!("auth.refresh_token_secret must be set");
        }
        // Distinct secrets are what keep the two token kinds apart.
        if self.auth.access_token_secret == self.auth.refresh_token_secret {
            anyhow::bail!("auth.access_token_secret and auth.refresh_token_secret must differ");
        }
        if self.auth.access_token_ttl.is_zero() || self.auth.refresh_token_ttl.is_zero() {
            anyhow::bail!("token TTLs must be non-zero");
        }
        if self.auth.password.min_length == 0 || self.auth.password.min_length > self.auth.password.max_length {
            anyhow::bail!("invalid password length bounds");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            auth: AuthConfig {
                access_token_secret: "access-secret".to_string(),
                refresh_token_secret: "refresh-secret".to_string(),
                ..AuthConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(3600));
        assert_eq!(config.auth.refresh_token_ttl, Duration::from_secs(604800));
        assert!(matches!(config.database, DatabaseConfig::Memory));
    }

    #[test]
    fn test_validate_accepts_distinct_secrets() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_or_equal_secrets() {
        assert!(Config::default().validate().is_err());

        let mut config = valid_config();
        config.auth.refresh_token_secret = config.auth.access_token_secret.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_password_bounds() {
        let mut config = valid_config();
        config.auth.password.min_length = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.auth.password.min_length = 200;
        assert!(config.validate().is_err());
    }
}
