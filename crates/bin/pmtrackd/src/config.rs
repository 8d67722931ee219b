//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `pmtrack.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;

use pmtrack_adapter_auth_jwt::JwtConfig;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Token signing and the initial administrator.
    pub auth: AuthConfig,
    /// Optional static frontend.
    pub frontend: FrontendConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Authentication settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for bearer tokens. When unset, a random secret is
    /// generated at startup and tokens do not survive a restart.
    pub jwt_secret: Option<String>,
    /// Lifetime of issued tokens.
    pub token_ttl_minutes: i64,
    /// Username of the account created on first start.
    pub admin_username: String,
    /// Email of the account created on first start.
    pub admin_email: String,
    /// Password of the account created on first start. No account is
    /// created without it.
    pub admin_password: Option<String>,
}

/// Static frontend settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Directory served for paths outside `/api`, `/admin` and `/health`.
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `pmtrack.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("pmtrack.toml")?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("PMTRACK_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("PMTRACK_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Some(val) = var("PMTRACK_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("PMTRACK_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("PMTRACK_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("PMTRACK_JWT_SECRET") {
            self.auth.jwt_secret = Some(val);
        }
        if let Some(val) = var("PMTRACK_TOKEN_TTL_MINUTES")
            && let Ok(ttl) = val.parse()
        {
            self.auth.token_ttl_minutes = ttl;
        }
        if let Some(val) = var("PMTRACK_ADMIN_PASSWORD") {
            self.auth.admin_password = Some(val);
        }
        if let Some(val) = var("PMTRACK_FRONTEND_DIR") {
            self.frontend.dir = Some(PathBuf::from(val));
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if let Some(secret) = &self.auth.jwt_secret
            && secret.len() < JwtConfig::MIN_SECRET_LEN
        {
            return Err(ConfigError::Validation(format!(
                "jwt_secret must be at least {} bytes",
                JwtConfig::MIN_SECRET_LEN
            )));
        }
        if !(1..=JwtConfig::MAX_TTL_MINUTES).contains(&self.auth.token_ttl_minutes) {
            return Err(ConfigError::Validation(format!(
                "token_ttl_minutes must be between 1 and {}",
                JwtConfig::MAX_TTL_MINUTES
            )));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Token signing settings, generating a secret when none is configured.
    #[must_use]
    pub fn jwt_config(&self) -> JwtConfig {
        let secret = self.auth.jwt_secret.clone().unwrap_or_else(|| {
            tracing::warn!("no jwt_secret configured, tokens will not survive a restart");
            format!(
                "{}{}",
                uuid::Uuid::new_v4().simple(),
                uuid::Uuid::new_v4().simple()
            )
        });
        JwtConfig {
            ttl_minutes: self.auth.token_ttl_minutes,
            ..JwtConfig::with_secret(secret)
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:pmtrack.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "pmtrackd=info,pmtrack=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_minutes: JwtConfig::DEFAULT_TTL_MINUTES,
            admin_username: "admin".to_string(),
            admin_email: "admin@pmtrack.local".to_string(),
            admin_password: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
