//! Application settings loaded via OrthoConfig.
//!
//! Values come from `RECIPEAPP_*` environment variables or a config file and
//! are resolved once at startup into an immutable [`RuntimeSettings`].

use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};

use crate::outbound::crypto::{BcryptPasswordHasher, CostOutOfRange, DEFAULT_COST, MIN_COST};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const MEMORY_URL: &str = "memory://";

/// Raw configuration as read from the environment.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RECIPEAPP")]
pub struct AppSettings {
    /// `development` or `production`; defaults to production.
    pub environment: Option<String>,
    /// PostgreSQL URL. Absent or `memory://` selects the in-memory store.
    pub database_url: Option<String>,
    /// bcrypt work factor.
    pub bcrypt_cost: Option<u32>,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: Option<String>,
    /// Listen address for `serve`.
    pub bind_addr: Option<String>,
    /// Register users without a role when the requested role is unknown.
    /// Accepts `1`/`0`, `true`/`false`, `yes`/`no`.
    #[serde(default, deserialize_with = "flag_text")]
    pub allow_roleless_registration: Option<String>,
    /// File holding at least 64 bytes of session key material.
    pub session_key_file: Option<PathBuf>,
    /// Mark session cookies `Secure`. Same spellings as
    /// `allow_roleless_registration`; defaults on outside development.
    #[serde(default, deserialize_with = "flag_text")]
    pub cookie_secure: Option<String>,
}

/// Deployment profile selecting defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Result<Self, SettingsError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(SettingsError::InvalidEnvironment {
                value: raw.to_owned(),
            }),
        }
    }

    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Where credentials live.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    InMemory,
    Postgres(String),
}

impl std::fmt::Debug for DatabaseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InMemory => f.write_str("InMemory"),
            Self::Postgres(_) => f.write_str("Postgres(<redacted>)"),
        }
    }
}

/// Errors raised while loading or resolving settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {message}")]
    Load { message: String },
    #[error("unknown environment '{value}'; expected development or production")]
    InvalidEnvironment { value: String },
    #[error("invalid {name} '{value}'; expected true or false")]
    InvalidFlag { name: &'static str, value: String },
    #[error("invalid bind address '{value}'")]
    InvalidBindAddr { value: String },
    #[error("production requires RECIPEAPP_DATABASE_URL")]
    MissingDatabaseUrl,
    #[error(transparent)]
    BcryptCost(#[from] CostOutOfRange),
}

/// Settings after defaults and validation.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub environment: Environment,
    pub database: DatabaseTarget,
    pub bcrypt_cost: u32,
    pub log_level: String,
    pub bind_addr: SocketAddr,
    pub allow_roleless_registration: bool,
    pub session_key_file: Option<PathBuf>,
    pub cookie_secure: bool,
}

/// Flag value as the configuration layer hands it over.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn flag_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawFlag>::deserialize(deserializer)?.map(|raw| match raw {
        RawFlag::Bool(value) => value.to_string(),
        RawFlag::Int(value) => value.to_string(),
        RawFlag::Text(value) => value,
    }))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn flag(name: &'static str, raw: Option<&str>, default: bool) -> Result<bool, SettingsError> {
    match raw {
        None => Ok(default),
        Some(value) => parse_bool(value).ok_or_else(|| SettingsError::InvalidFlag {
            name,
            value: value.to_owned(),
        }),
    }
}

impl AppSettings {
    /// Load from the environment and configuration files.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from_iter([OsString::from("recipeapp")]).map_err(|err| SettingsError::Load {
            message: err.to_string(),
        })
    }

    /// Apply profile defaults and validate.
    pub fn resolve(self) -> Result<RuntimeSettings, SettingsError> {
        let environment = self
            .environment
            .as_deref()
            .map_or(Ok(Environment::Production), Environment::parse)?;
        let dev = environment.is_development();

        let database = match self.database_url.as_deref().map(str::trim) {
            None | Some("" | MEMORY_URL) if dev => DatabaseTarget::InMemory,
            Some(MEMORY_URL) => DatabaseTarget::InMemory,
            None | Some("") => return Err(SettingsError::MissingDatabaseUrl),
            Some(url) => DatabaseTarget::Postgres(url.to_owned()),
        };

        let default_cost = if dev { MIN_COST } else { DEFAULT_COST };
        let bcrypt_cost = self.bcrypt_cost.unwrap_or(default_cost);
        BcryptPasswordHasher::new(bcrypt_cost)?;

        let raw_addr = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| SettingsError::InvalidBindAddr {
                value: raw_addr.to_owned(),
            })?;

        let allow_roleless_registration = flag(
            "RECIPEAPP_ALLOW_ROLELESS_REGISTRATION",
            self.allow_roleless_registration.as_deref(),
            false,
        )?;
        let cookie_secure = flag("RECIPEAPP_COOKIE_SECURE", self.cookie_secure.as_deref(), !dev)?;

        let log_level = self
            .log_level
            .unwrap_or_else(|| if dev { "debug" } else { "warn" }.to_owned());

        Ok(RuntimeSettings {
            environment,
            database,
            bcrypt_cost,
            log_level,
            bind_addr,
            allow_roleless_registration,
            session_key_file: self.session_key_file,
            cookie_secure,
        })
    }
}
