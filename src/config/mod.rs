use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up next to the executable when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_HOURS: u64 = 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot locate executable directory: {0}")]
    ExecutablePath(#[source] std::io::Error),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    /// Emails allowed to log in. Anyone else is rejected before the password is looked at.
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub dbname: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Extra attempts for read queries that fail on a connection-level error.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

fn default_db_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    100
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./frontend/build")
}

fn default_jwt_secret() -> String {
    "dify_secret_key".to_string()
}

fn default_token_ttl_hours() -> u64 {
    24
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_server_port(),
            request_timeout_secs: default_request_timeout_secs(),
            cors_origins: default_cors_origins(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

impl AppConfig {
    /// Load the configuration once at startup.
    ///
    /// Without an explicit path the file is `config.yaml` in the directory of
    /// the running executable. Environment variables are applied on top.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let config = Self::from_yaml(&raw)
            .map_err(|source| ConfigError::Parse { path: path.clone(), source })?
            .with_env_overrides();

        config.validate()?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_HOST") {
            self.database.host = v;
        }
        if let Ok(v) = env::var("DATABASE_PORT") {
            self.database.port = v.parse().unwrap_or(self.database.port);
        }
        if let Ok(v) = env::var("DATABASE_USER") {
            self.database.user = v;
        }
        if let Ok(v) = env::var("DATABASE_PASSWORD") {
            self.database.password = v;
        }
        if let Ok(v) = env::var("DATABASE_NAME") {
            self.database.dbname = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }

        // Server overrides
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.server.cors_origins = split_list(&v);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("ADMIN_EMAILS") {
            self.admins = split_list(&v);
        }

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.host.trim().is_empty() {
            return Err(ConfigError::Invalid("database.host must not be empty".into()));
        }
        if self.database.user.trim().is_empty() {
            return Err(ConfigError::Invalid("database.user must not be empty".into()));
        }
        if self.database.dbname.trim().is_empty() {
            return Err(ConfigError::Invalid("database.dbname must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be positive".into()));
        }
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("security.jwt_secret must not be empty".into()));
        }
        if self.security.token_ttl_hours == 0 {
            return Err(ConfigError::Invalid("security.token_ttl_hours must be positive".into()));
        }
        if self.security.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(ConfigError::Invalid(format!(
                "security.token_ttl_hours must be at most {}",
                MAX_TOKEN_TTL_HOURS
            )));
        }
        if self.admins.is_empty() {
            tracing::warn!("No admin emails configured; every login will be rejected");
        }
        Ok(())
    }

    /// Exact, case-sensitive match against the admin allow-list.
    pub fn is_admin(&self, email: &str) -> bool {
        self.admins.iter().any(|admin| admin == email)
    }
}

fn default_config_path() -> Result<PathBuf, ConfigError> {
    let exe = env::current_exe().map_err(ConfigError::ExecutablePath)?;
    let dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(dir.join(CONFIG_FILE_NAME))
}

fn split_list(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
