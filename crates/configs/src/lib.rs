//! # configs
//!
//! Layered application configuration:
//!
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `config/{HUSHPOST_ENV}.toml` (optional, `HUSHPOST_ENV` defaults to `development`)
//! 4. `HUSHPOST__SECTION__KEY` environment variables, after `.env` is loaded
//!
//! Secrets (database url, JWT secret) are held as [`SecretString`] so they
//! never end up in `Debug` output or logs.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

const ENV_PREFIX: &str = "HUSHPOST";
const PROFILE_VAR: &str = "HUSHPOST_ENV";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub content: ContentConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Required for the postgres backend.
    pub url: Option<SecretString>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Bearer value is a user id asserted by a trusted gateway. Only
    /// safe behind a gateway that strips client-supplied credentials, so it
    /// must be selected explicitly.
    Header,
    /// Bearer value is an HS256 JWT.
    Jwt,
}

#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub jwt_secret: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    pub post_max_chars: usize,
    pub comment_max_chars: usize,
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// `None` keeps the built-in word list.
    pub denylist: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` wins when set.
    pub filter: String,
    pub json: bool,
}

impl AppConfig {
    /// Loads `.env`, the config files and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "ignoring unreadable .env file");
            }
        }
        let profile = std::env::var(PROFILE_VAR).unwrap_or_else(|_| "development".into());

        let builder = defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{profile}")).required(false))
            .add_source(environment());
        finish(builder)
    }

    /// Defaults overlaid with an in-memory TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        finish(defaults()?.add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.storage.backend == StorageBackend::Postgres && self.storage.url.is_none() {
            return Err(ConfigError::Invalid("storage.url is required for the postgres backend".into()));
        }
        if self.auth.mode == AuthMode::Jwt && self.auth.jwt_secret.is_none() {
            return Err(ConfigError::Invalid("auth.jwt_secret is required in jwt mode".into()));
        }
        let c = &self.content;
        if c.post_max_chars == 0 || c.comment_max_chars == 0 {
            return Err(ConfigError::Invalid("content limits must be positive".into()));
        }
        if c.default_page_size == 0 || c.default_page_size > c.max_page_size {
            return Err(ConfigError::Invalid(
                "content.default_page_size must be between 1 and content.max_page_size".into(),
            ));
        }
        Ok(self)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080_i64)?
        .set_default("storage.backend", "memory")?
        .set_default("storage.max_connections", 10_i64)?
        .set_default("auth.mode", "jwt")?
        .set_default("content.post_max_chars", 5000_i64)?
        .set_default("content.comment_max_chars", 1000_i64)?
        .set_default("content.default_page_size", 20_i64)?
        .set_default("content.max_page_size", 100_i64)?
        .set_default("log.filter", "info")?
        .set_default("log.json", false)?)
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("content.denylist")
        .try_parsing(true)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, ConfigError> {
    let cfg: AppConfig = builder.build()?.try_deserialize()?;
    cfg.validate()
}
