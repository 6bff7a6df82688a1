use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            acquire_timeout_seconds: default_acquire_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry")]
    pub token_expiry_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on the time a single HTTP request may take, storage calls included.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Who may delete a work request.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestDeletePolicy {
    /// Any authenticated account may delete any request.
    #[default]
    Unrestricted,
    /// Only the original requester or an operator may delete a request.
    OwnerOrOperator,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PolicyConfig {
    #[serde(default)]
    pub request_delete: RequestDeletePolicy,
}

/// Operator account ensured at startup, if configured.
#[derive(Debug, Deserialize, Clone)]
pub struct SeedOperator {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub unit: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedConfig {
    pub operator: Option<SeedOperator>,
}

fn default_database_url() -> String {
    "sqlite://workreq.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_token_expiry() -> i64 {
    86_400 // 24 hours
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

const ENV_PREFIX: &str = "WORKREQ";

impl AppConfig {
    /// Parse configuration from an in-memory TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        config.try_deserialize()
    }

    /// Load `workreq.toml` (optional) with environment variable overrides.
    ///
    /// Environment variables are prefixed with `WORKREQ_` and use `__` between
    /// section and key, e.g. `WORKREQ_AUTH__JWT_SECRET`, `WORKREQ_SERVER__PORT`.
    ///
    /// Returns the config and the list of keys overridden from the environment.
    pub fn load_with_env() -> Result<(Self, Vec<String>), ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("workreq").required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let env_vars = [
            ("WORKREQ_DATABASE__URL", "database.url"),
            ("WORKREQ_DATABASE__MAX_CONNECTIONS", "database.max_connections"),
            ("WORKREQ_DATABASE__ACQUIRE_TIMEOUT_SECONDS", "database.acquire_timeout_seconds"),
            ("WORKREQ_AUTH__JWT_SECRET", "auth.jwt_secret"),
            ("WORKREQ_AUTH__TOKEN_EXPIRY_SECONDS", "auth.token_expiry_seconds"),
            ("WORKREQ_SERVER__HOST", "server.host"),
            ("WORKREQ_SERVER__PORT", "server.port"),
            ("WORKREQ_SERVER__REQUEST_TIMEOUT_SECONDS", "server.request_timeout_seconds"),
            ("WORKREQ_POLICY__REQUEST_DELETE", "policy.request_delete"),
        ];

        let overrides = env_vars
            .iter()
            .filter(|(var, _)| std::env::var(var).is_ok())
            .map(|(_, key)| key.to_string())
            .collect();

        let app_config = config.try_deserialize()?;
        Ok((app_config, overrides))
    }
}
